use crate::cli::{actions::open_session, globals::GlobalArgs};
use crate::features::auth::RouteDecision;
use crate::routes::RouteAuthorizer;
use anyhow::Result;

/// Execute the route action: prints how `path` resolves for the stored session.
/// # Errors
/// Returns an error if the configuration or token file cannot be opened.
pub async fn explain(path: &str, globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    let state = session.init().await;

    let mut router = RouteAuthorizer::default();
    let decision = router.navigate(state, path);
    println!("session: {}", state.as_str());
    println!("{}", describe(path, &decision));
    Ok(())
}

fn describe(path: &str, decision: &RouteDecision) -> String {
    match decision {
        RouteDecision::Loading => format!("{path}: loading"),
        RouteDecision::Render => format!("{path}: render"),
        RouteDecision::RedirectToLogin { from } => {
            format!("{path}: redirect to /login (returns to {from} after sign-in)")
        }
        RouteDecision::RedirectTo(target) => format!("{path}: redirect to {target}"),
    }
}
