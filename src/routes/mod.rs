//! Route table and navigation for the client views. The table mirrors the
//! views of the service (home, login, register, password recovery, upload,
//! files and the weather dashboard); [`RouteAuthorizer`] resolves a path
//! against it and remembers the origin of a login redirect.

use crate::features::auth::guards::{AccessRequirement, NavigationIntent, RouteDecision, authorize};
use crate::features::auth::state::AuthState;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

pub mod paths {
    pub const HOME: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const FORGOT_PASSWORD: &str = "/forgot-password";
    pub const UPLOAD: &str = "/upload";
    pub const FILES: &str = "/files";
    pub const DASHBOARD: &str = "/dashboard";
}

/// Receiver of forced navigations (for example after a failed token refresh).
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator for terminal use: logs where the user has to go next.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        if path == paths::LOGIN {
            warn!("session expired, sign in again with `strongbox login`");
        } else {
            debug!(path, "navigation requested");
        }
    }
}

/// Navigator that keeps every requested path in memory.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    visited: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}

#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<(String, AccessRequirement)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
            .route(paths::HOME, AccessRequirement::Open)
            .route(paths::LOGIN, AccessRequirement::PublicOnly)
            .route(paths::REGISTER, AccessRequirement::PublicOnly)
            .route(paths::FORGOT_PASSWORD, AccessRequirement::PublicOnly)
            .route(paths::UPLOAD, AccessRequirement::Protected)
            .route(paths::FILES, AccessRequirement::Protected)
            .route(paths::DASHBOARD, AccessRequirement::Protected)
    }
}

impl RouteTable {
    /// Empty table; every path is unmatched.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    #[must_use]
    pub fn route(mut self, path: &str, requirement: AccessRequirement) -> Self {
        self.routes.push((normalize_path(path), requirement));
        self
    }

    #[must_use]
    pub fn requirement_for(&self, path: &str) -> Option<AccessRequirement> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find(|(route, _)| *route == path)
            .map(|(_, requirement)| *requirement)
    }

    /// Resolves a path into a navigation intent, `None` for unknown paths.
    #[must_use]
    pub fn intent(&self, path: &str) -> Option<NavigationIntent> {
        self.requirement_for(path).map(|requirement| NavigationIntent {
            target_path: path.trim().to_string(),
            requirement,
        })
    }
}

/// Stateful navigation gate that carries the origin path across a login redirect.
#[derive(Clone, Debug, Default)]
pub struct RouteAuthorizer {
    table: RouteTable,
    remembered: Option<String>,
}

impl RouteAuthorizer {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            remembered: None,
        }
    }

    /// Path saved by the last redirect to login, if not yet consumed.
    #[must_use]
    pub fn remembered(&self) -> Option<&str> {
        self.remembered.as_deref()
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Decides a navigation and updates the remembered origin.
    pub fn navigate(&mut self, state: AuthState, requested_path: &str) -> RouteDecision {
        let requested_path = requested_path.trim();
        let requirement = self.table.requirement_for(requested_path);
        let decision = authorize(
            state,
            requirement,
            requested_path,
            self.remembered.as_deref(),
        );

        match &decision {
            RouteDecision::RedirectToLogin { from } => {
                self.remembered = Some(from.clone());
            }
            RouteDecision::RedirectTo(_)
                if requirement == Some(AccessRequirement::PublicOnly) =>
            {
                self.remembered = None;
            }
            _ => {}
        }

        debug!(path = requested_path, ?state, ?decision, "route decision");
        decision
    }
}

/// Drops query and fragment and the trailing slash (except for the root).
fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim_end_matches('/');

    if path.is_empty() {
        paths::HOME.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
