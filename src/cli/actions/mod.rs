pub mod auth;
pub mod files;
pub mod password;
pub mod route;
pub mod weather;

// Internal "interpreter" for `Action`; the match lives in `run` so this module stays small.
mod run;

use crate::app_lib::{ApiError, AppError, config::AppConfig};
use crate::cli::globals::GlobalArgs;
use crate::features::auth::{FileStorage, RouteDecision, SessionStore};
use crate::routes::{LogNavigator, RouteAuthorizer};
use anyhow::{Result, anyhow, bail};
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub enum Action {
    Register(auth::RegisterArgs),
    Login(auth::LoginArgs),
    Logout,
    Whoami,
    PasswordCheck { password: SecretString },
    Upload(files::UploadArgs),
    Files,
    Preview(files::PreviewArgs),
    Weather { watch: bool },
    Route { path: String },
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self, globals: &GlobalArgs) -> Result<()> {
        run::execute(self, globals).await
    }
}

/// Session backed by the configured token file.
pub(crate) fn open_session(config: &AppConfig) -> Result<SessionStore> {
    let storage = Arc::new(FileStorage::new(&config.token_file));
    Ok(SessionStore::new(config, storage, Arc::new(LogNavigator))?)
}

/// Restores the session and checks that `path` may be shown.
pub(crate) async fn enter(session: &SessionStore, path: &str) -> Result<()> {
    let state = session.init().await;
    match RouteAuthorizer::default().navigate(state, path) {
        RouteDecision::Render => Ok(()),
        RouteDecision::RedirectToLogin { from } => {
            bail!("{from} requires a signed-in session, run `strongbox login` first")
        }
        RouteDecision::RedirectTo(target) => bail!("{path} is not available, try {target}"),
        RouteDecision::Loading => bail!("session is still being resolved"),
    }
}

/// Turns an `AppError` into a report that lists field errors one per line.
pub(crate) fn report(err: AppError) -> anyhow::Error {
    if let AppError::Validation(ApiError::Fields(fields)) = &err {
        let lines = fields
            .iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("  {field}: {message}"))
            })
            .collect::<Vec<_>>()
            .join("\n");
        return anyhow!("validation failed:\n{lines}");
    }
    anyhow::Error::new(err)
}
