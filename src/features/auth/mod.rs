//! Auth feature: password policy, login/register/profile calls, durable token
//! storage, the session store and the route guards. This module touches
//! security boundaries and must avoid logging secrets or token material.
//!
//! Flow Overview: Register validates the form locally, posts it as multipart and
//! stores the returned token pair. Login posts JSON credentials and stores the
//! pair. `SessionStore::init` restores a persisted session by fetching the
//! profile; any failure there ends as a signed-out session.

pub mod client;
pub mod guards;
pub mod password;
pub mod state;
pub mod storage;
pub mod types;

pub use guards::{AccessRequirement, NavigationIntent, RouteDecision, authorize};
pub use password::{PasswordAssessment, PasswordRule, Strength, assess};
pub use state::{AuthState, SessionStore};
pub use storage::{FileStorage, MemoryStorage, TokenStorage};
pub use types::{RegistrationForm, User};
