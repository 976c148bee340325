use crate::cli::{
    actions::{Action, auth, files, password, route, weather},
    globals::GlobalArgs,
};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Register(args) => auth::register(args, globals).await,
        Action::Login(args) => auth::login(args, globals).await,
        Action::Logout => auth::logout(globals),
        Action::Whoami => auth::whoami(globals).await,
        Action::PasswordCheck { password } => password::check(&password),
        Action::Upload(args) => files::upload(args, globals).await,
        Action::Files => files::list(globals).await,
        Action::Preview(args) => files::preview(args, globals).await,
        Action::Weather { watch } => weather::show(watch, globals).await,
        Action::Route { path } => route::explain(&path, globals).await,
    }
}
