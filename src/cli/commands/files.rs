use clap::{Arg, Command, value_parser};
use std::path::PathBuf;

pub const CMD_UPLOAD: &str = "upload";
pub const CMD_FILES: &str = "files";
pub const CMD_PREVIEW: &str = "preview";

pub const ARG_FILE: &str = "file";
pub const ARG_DESCRIPTION: &str = "description";
pub const ARG_ID: &str = "id";
pub const ARG_OUTPUT: &str = "output";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_UPLOAD)
                .about("Upload a file; it is stored encrypted")
                .arg(
                    Arg::new(ARG_FILE)
                        .help("Image (JPEG, PNG, GIF) or audio (MP3, WAV), up to 10MB")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new(ARG_DESCRIPTION)
                        .short('d')
                        .long("description")
                        .help("Optional description, up to 255 characters"),
                ),
        )
        .subcommand(Command::new(CMD_FILES).about("List uploaded files"))
        .subcommand(
            Command::new(CMD_PREVIEW)
                .about("Download the decrypted content of a file")
                .arg(
                    Arg::new(ARG_ID)
                        .help("File id, as shown by `files`")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(
                    Arg::new(ARG_OUTPUT)
                        .short('o')
                        .long("output")
                        .help("Where to write the content")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}
