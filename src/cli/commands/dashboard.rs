use clap::{Arg, ArgAction, Command};

pub const CMD_WEATHER: &str = "weather";
pub const CMD_ROUTE: &str = "route";

pub const ARG_WATCH: &str = "watch";
pub const ARG_PATH: &str = "path";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_WEATHER)
                .about("Show the current weather and recent history")
                .arg(
                    Arg::new(ARG_WATCH)
                        .short('w')
                        .long("watch")
                        .help("Keep refreshing every 5 minutes until interrupted")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new(CMD_ROUTE)
                .about("Show how a view path is authorized for the current session")
                .arg(Arg::new(ARG_PATH).help("View path, e.g. /files").required(true)),
        )
}
