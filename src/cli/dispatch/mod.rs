//! Maps validated CLI matches to an [`Action`].

use crate::cli::actions::{
    Action,
    auth::{LoginArgs, RegisterArgs},
    files::{PreviewArgs, UploadArgs},
};
use crate::cli::commands::{auth, dashboard, files};
use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(id)
        .with_context(|| format!("missing required argument: --{id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Option<SecretString> {
    matches
        .get_one::<String>(id)
        .map(|value| SecretString::from(value.clone()))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if a required argument is missing or the subcommand is unknown.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let Some((name, sub)) = matches.subcommand() else {
        bail!("missing subcommand");
    };

    let action = match name {
        auth::CMD_REGISTER => Action::Register(RegisterArgs {
            username: required(sub, auth::ARG_USERNAME)?.clone(),
            email: required(sub, auth::ARG_EMAIL)?.clone(),
            password: secret(sub, auth::ARG_PASSWORD)
                .context("missing required argument: --password")?,
            password_confirmation: secret(sub, auth::ARG_PASSWORD_CONFIRMATION),
            first_name: sub.get_one::<String>(auth::ARG_FIRST_NAME).cloned(),
            last_name: sub.get_one::<String>(auth::ARG_LAST_NAME).cloned(),
            avatar: sub.get_one::<PathBuf>(auth::ARG_AVATAR).cloned(),
            audio: sub.get_one::<PathBuf>(auth::ARG_AUDIO).cloned(),
        }),
        auth::CMD_LOGIN => Action::Login(LoginArgs {
            username: required(sub, auth::ARG_USERNAME)?.clone(),
            password: secret(sub, auth::ARG_PASSWORD)
                .context("missing required argument: --password")?,
        }),
        auth::CMD_LOGOUT => Action::Logout,
        auth::CMD_WHOAMI => Action::Whoami,
        auth::CMD_PASSWORD_CHECK => Action::PasswordCheck {
            password: secret(sub, auth::ARG_PASSWORD)
                .context("missing required argument: <password>")?,
        },
        files::CMD_UPLOAD => Action::Upload(UploadArgs {
            file: sub
                .get_one::<PathBuf>(files::ARG_FILE)
                .cloned()
                .context("missing required argument: <file>")?,
            description: sub.get_one::<String>(files::ARG_DESCRIPTION).cloned(),
        }),
        files::CMD_FILES => Action::Files,
        files::CMD_PREVIEW => Action::Preview(PreviewArgs {
            id: sub
                .get_one::<i64>(files::ARG_ID)
                .copied()
                .context("missing required argument: <id>")?,
            output: sub
                .get_one::<PathBuf>(files::ARG_OUTPUT)
                .cloned()
                .context("missing required argument: --output")?,
        }),
        dashboard::CMD_WEATHER => Action::Weather {
            watch: sub.get_flag(dashboard::ARG_WATCH),
        },
        dashboard::CMD_ROUTE => Action::Route {
            path: required(sub, dashboard::ARG_PATH)?.clone(),
        },
        other => bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}
