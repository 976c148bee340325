use clap::{Arg, Command, value_parser};
use std::path::PathBuf;

pub const CMD_REGISTER: &str = "register";
pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_PASSWORD_CHECK: &str = "password-check";

pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_PASSWORD_CONFIRMATION: &str = "password-confirmation";
pub const ARG_FIRST_NAME: &str = "first-name";
pub const ARG_LAST_NAME: &str = "last-name";
pub const ARG_AVATAR: &str = "avatar";
pub const ARG_AUDIO: &str = "audio";

fn username() -> Arg {
    Arg::new(ARG_USERNAME)
        .short('u')
        .long("username")
        .help("Account username")
        .env("STRONGBOX_USERNAME")
        .required(true)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long("password")
        .help("Account password")
        .env("STRONGBOX_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account and sign in")
                .arg(username())
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long("email")
                        .help("Email address")
                        .required(true),
                )
                .arg(password())
                .arg(
                    Arg::new(ARG_PASSWORD_CONFIRMATION)
                        .long("password-confirmation")
                        .help("Password confirmation (defaults to the password)")
                        .env("STRONGBOX_PASSWORD_CONFIRMATION")
                        .hide_env_values(true),
                )
                .arg(
                    Arg::new(ARG_FIRST_NAME)
                        .long("first-name")
                        .help("First name"),
                )
                .arg(Arg::new(ARG_LAST_NAME).long("last-name").help("Last name"))
                .arg(
                    Arg::new(ARG_AVATAR)
                        .long("avatar")
                        .help("Profile image (JPEG, PNG or GIF)")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new(ARG_AUDIO)
                        .long("audio")
                        .help("Audio file (MP3 or WAV)")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in and store the session tokens")
                .arg(username())
                .arg(password()),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and remove the stored tokens"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the signed-in user"))
        .subcommand(
            Command::new(CMD_PASSWORD_CHECK)
                .about("Check a password against the password policy")
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .help("Password to check")
                        .env("STRONGBOX_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
}
