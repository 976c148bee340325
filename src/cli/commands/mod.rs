pub mod auth;
pub mod dashboard;
pub mod files;
pub mod logging;

use crate::app_lib::config::{ENV_API_BASE_URL, ENV_TIMEOUT_SECS, ENV_TOKEN_FILE};
use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
    value_parser,
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TOKEN_FILE: &str = "token-file";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!(
            "{} - {}",
            env!("CARGO_PKG_VERSION"),
            crate::app_lib::GIT_COMMIT_HASH
        )
        .into_boxed_str(),
    );

    let command = Command::new("strongbox")
        .about("Encrypted file storage client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("API base URL, example: https://files.tld/api/auth")
                .env(ENV_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_FILE)
                .long("token-file")
                .help("Where session tokens are stored (default: ~/.strongbox/session.json)")
                .env(ENV_TOKEN_FILE)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Request timeout in seconds")
                .env(ENV_TIMEOUT_SECS)
                .global(true)
                .value_parser(value_parser!(u64).range(1..)),
        );

    let command = auth::with_subcommands(command);
    let command = files::with_subcommands(command);
    let command = dashboard::with_subcommands(command);
    logging::with_args(command)
}
