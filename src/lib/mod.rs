//! Shared client utilities for API access, configuration, errors, and build metadata.
//!
//! ## Token Lifecycle
//!
//! 1. **Login / Register:** The client posts credentials (JSON for login, multipart
//!    for registration) and receives `{ user, tokens: { access, refresh } }`.
//! 2. **Usage:** The access token is sent as `Authorization: Bearer` on every
//!    authenticated call through the [`api::AuthGateway`] pipeline.
//! 3. **Refresh:** A `401` triggers one exchange of the refresh token at
//!    `/token/refresh/`; concurrent failures share the same exchange.
//! 4. **Expiry:** A failed refresh clears both tokens and sends the user back to
//!    the login view.
//!
//! Centralizing these helpers keeps network behavior consistent and avoids duplicated
//! logic in features. Token values are held as `SecretString` and must never be logged.

pub mod api;
#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
pub mod config;
pub mod errors;

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

pub use api::{ApiRequest, AuthGateway, FilePart, MultipartBody, TokenSink};
pub use errors::{ApiError, AppError};
