//! Client for the Strongbox authentication and encrypted file service.
//!
//! The crate is split the same way the service is used:
//! - [`app_lib`] holds configuration, errors and the authenticated HTTP gateway.
//! - [`features`] holds the auth session, file storage and weather dashboard clients.
//! - [`routes`] maps view paths to access requirements.
//! - [`cli`] wires everything into the `strongbox` binary.

#[path = "lib/mod.rs"]
pub mod app_lib;
pub mod cli;
pub mod features;
pub mod routes;

pub use app_lib::{ApiError, AppError, APP_USER_AGENT, GIT_COMMIT_HASH};
