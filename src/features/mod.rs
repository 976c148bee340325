//! Client features (auth, files, weather) built on the shared gateway. The CLI
//! and any other front end call into these modules and keep presentation out of
//! them.

pub mod auth;
pub mod files;
pub mod weather;
