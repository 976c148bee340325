use crate::app_lib::config::{AppConfig, Overrides};
use crate::cli::commands::{ARG_API_URL, ARG_TIMEOUT, ARG_TOKEN_FILE};
use anyhow::{Context, Result};

/// Options shared by every subcommand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub token_file: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl GlobalArgs {
    #[must_use]
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            api_url: matches.get_one::<String>(ARG_API_URL).cloned(),
            token_file: matches.get_one::<String>(ARG_TOKEN_FILE).cloned(),
            timeout_secs: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
        }
    }

    /// Resolves the client configuration: defaults, then environment, then flags.
    ///
    /// # Errors
    /// Returns an error if the resulting API URL is unusable.
    pub fn config(&self) -> Result<AppConfig> {
        let config = AppConfig::load().with_overrides(Overrides::new(
            self.api_url.as_deref(),
            self.token_file.as_deref(),
            self.timeout_secs,
        ));
        config.validate().context("invalid client configuration")?;
        Ok(config)
    }
}
