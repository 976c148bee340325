//! Weather dashboard data: a one-shot fetch and a cancellable background poller.

pub mod client;
pub mod poller;
pub mod types;

pub use client::fetch_weather;
pub use poller::{WeatherPoller, WeatherUpdate};
pub use types::{Reading, WeatherObservation, WeatherReport};
