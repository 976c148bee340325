//! Route guards. `authorize` is the pure decision behind every navigation:
//! it never redirects while the session is still being resolved, and it keeps
//! the originally requested path so a successful login can return there.
//! These checks are UX-only; real access control lives on the API.

use crate::features::auth::state::AuthState;
use crate::routes::paths;

/// Authorization a route demands from the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Signed-in users only.
    Protected,
    /// Anonymous users only (login, register).
    PublicOnly,
    /// Everyone.
    Open,
}

/// Outcome of a navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is still being resolved; show a loading placeholder.
    Loading,
    Render,
    /// Send the user to the login view, remembering where they wanted to go.
    RedirectToLogin { from: String },
    RedirectTo(String),
}

/// One navigation attempt against a known route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target_path: String,
    pub requirement: AccessRequirement,
}

/// Decides what to do with a navigation request.
///
/// `requirement` is `None` when the path matches no route.
#[must_use]
pub fn authorize(
    state: AuthState,
    requirement: Option<AccessRequirement>,
    requested_path: &str,
    prior_path: Option<&str>,
) -> RouteDecision {
    let Some(requirement) = requirement else {
        return RouteDecision::RedirectTo(paths::HOME.to_string());
    };

    if !state.is_settled() {
        return RouteDecision::Loading;
    }

    match (requirement, state) {
        (AccessRequirement::Open, _)
        | (AccessRequirement::Protected, AuthState::Authenticated)
        | (AccessRequirement::PublicOnly, AuthState::Anonymous) => RouteDecision::Render,
        (AccessRequirement::Protected, _) => RouteDecision::RedirectToLogin {
            from: requested_path.to_string(),
        },
        (AccessRequirement::PublicOnly, _) => RouteDecision::RedirectTo(
            prior_path
                .filter(|path| !path.trim().is_empty())
                .unwrap_or(paths::HOME)
                .to_string(),
        ),
    }
}

/// Convenience wrapper over [`authorize`] for a resolved intent.
#[must_use]
pub fn authorize_intent(
    state: AuthState,
    intent: &NavigationIntent,
    prior_path: Option<&str>,
) -> RouteDecision {
    authorize(
        state,
        Some(intent.requirement),
        &intent.target_path,
        prior_path,
    )
}
