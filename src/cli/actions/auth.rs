use crate::cli::{
    actions::{open_session, report},
    globals::GlobalArgs,
};
use crate::features::{
    auth::{RegistrationForm, RouteDecision, SessionStore},
    files::UploadFile,
};
use crate::routes::{RouteAuthorizer, paths};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct RegisterArgs {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: Option<SecretString>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<PathBuf>,
    pub audio: Option<PathBuf>,
}

#[derive(Debug)]
pub struct LoginArgs {
    pub username: String,
    pub password: SecretString,
}

/// Public-only views bounce a signed-in user; tell them instead of redoing the flow.
async fn already_signed_in(session: &SessionStore, path: &str) -> bool {
    let state = session.init().await;
    match RouteAuthorizer::default().navigate(state, path) {
        RouteDecision::RedirectTo(_) => {
            let name = session.user().map(|user| user.username).unwrap_or_default();
            println!("Already signed in as {name}. Run `strongbox logout` to switch accounts.");
            true
        }
        _ => false,
    }
}

/// Execute the register action.
/// # Errors
/// Returns an error if the form is invalid, an attachment cannot be read or the server rejects it.
pub async fn register(args: RegisterArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    if already_signed_in(&session, paths::REGISTER).await {
        return Ok(());
    }

    let mut attachments = Vec::new();
    for (field, path) in [("avatar", &args.avatar), ("audio", &args.audio)] {
        if let Some(path) = path {
            let file = UploadFile::from_path(path).await.map_err(report)?;
            debug!(field, file_name = file.file_name(), "attaching file");
            attachments.push(file.into_part(field));
        }
    }

    let form = RegistrationForm {
        username: args.username,
        email: args.email,
        password_confirmation: args
            .password_confirmation
            .unwrap_or_else(|| args.password.clone()),
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
        files: attachments,
    };

    let user = session.register(&form).await.map_err(report)?;
    println!("Registered and signed in as {}.", user.username);
    Ok(())
}

/// Execute the login action.
/// # Errors
/// Returns an error if the credentials are rejected or the server is unreachable.
pub async fn login(args: LoginArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    if already_signed_in(&session, paths::LOGIN).await {
        return Ok(());
    }

    let user = session
        .login(&args.username, &args.password)
        .await
        .map_err(report)?;
    println!("Signed in as {}.", user.username);
    Ok(())
}

/// Execute the logout action. Never fails once the configuration resolves.
/// # Errors
/// Returns an error if the configuration or token file cannot be opened.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    session.logout();
    println!("Signed out.");
    Ok(())
}

/// Execute the whoami action.
/// # Errors
/// Returns an error if the configuration or token file cannot be opened.
pub async fn whoami(globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    session.init().await;

    match session.user() {
        Some(user) => {
            println!("username: {}", user.username);
            if !user.email.is_empty() {
                println!("email:    {}", user.email);
            }
            if let Some(name) = user.full_name() {
                println!("name:     {name}");
            }
        }
        None => println!("Not signed in."),
    }
    Ok(())
}
