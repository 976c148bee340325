//! Client configuration with compiled defaults and environment overrides. CLI
//! flags are applied last through [`Overrides`]. Configuration values are not
//! secret; tokens live in the token file, never here.

use super::errors::AppError;
use std::{env, path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/auth";
/// Default request timeout applied to every API call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Interval between background weather fetches.
pub const DEFAULT_WEATHER_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub const ENV_API_BASE_URL: &str = "STRONGBOX_API_URL";
pub const ENV_TOKEN_FILE: &str = "STRONGBOX_TOKEN_FILE";
pub const ENV_TIMEOUT_SECS: &str = "STRONGBOX_TIMEOUT_SECS";

const TOKEN_DIR: &str = ".strongbox";
const TOKEN_FILE: &str = "session.json";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub token_file: PathBuf,
    pub request_timeout: Duration,
    pub weather_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_file: default_token_file(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            weather_interval: DEFAULT_WEATHER_INTERVAL,
        }
    }
}

impl AppConfig {
    /// Loads defaults and applies overrides from the environment.
    #[must_use]
    pub fn load() -> Self {
        Self::default().with_overrides(runtime_config())
    }

    /// Applies explicit overrides; empty values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        apply_overrides(&mut self, overrides);
        self
    }

    /// Checks that the API base URL is usable.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is not an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), AppError> {
        let url = Url::parse(self.api_base_url.trim())
            .map_err(|err| AppError::Config(format!("Invalid API base URL: {err}")))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AppError::Config(format!(
                "Unsupported API base URL scheme: {scheme}"
            ))),
        }
    }
}

/// Optional configuration values layered over the defaults.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub token_file: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Overrides {
    /// Builds overrides from raw strings, dropping blank values.
    #[must_use]
    pub fn new(
        api_base_url: Option<&str>,
        token_file: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.and_then(normalize_runtime_value),
            token_file: token_file.and_then(normalize_runtime_value),
            timeout_secs: timeout_secs.filter(|secs| *secs > 0),
        }
    }
}

fn apply_overrides(config: &mut AppConfig, overrides: Overrides) {
    if let Some(value) = overrides.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = overrides.token_file {
        config.token_file = PathBuf::from(value);
    }
    if let Some(secs) = overrides.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
}

fn runtime_config() -> Overrides {
    let api_base_url = env::var(ENV_API_BASE_URL).ok();
    let token_file = env::var(ENV_TOKEN_FILE).ok();
    let timeout_secs = env::var(ENV_TIMEOUT_SECS)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok());

    Overrides::new(api_base_url.as_deref(), token_file.as_deref(), timeout_secs)
}

fn default_token_file() -> PathBuf {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(
            || PathBuf::from(format!("{TOKEN_DIR}-{TOKEN_FILE}")),
            |home| PathBuf::from(home).join(TOKEN_DIR).join(TOKEN_FILE),
        )
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, DEFAULT_API_BASE_URL, ENV_API_BASE_URL, ENV_TIMEOUT_SECS, ENV_TOKEN_FILE,
        Overrides, apply_overrides, normalize_runtime_value,
    };
    use std::{path::PathBuf, time::Duration};

    #[test]
    fn normalize_runtime_value_trims_and_rejects_empty() {
        assert_eq!(normalize_runtime_value(""), None);
        assert_eq!(normalize_runtime_value("   "), None);
        assert_eq!(
            normalize_runtime_value("  https://files.example.dev "),
            Some("https://files.example.dev".to_string())
        );
    }

    #[test]
    fn apply_overrides_ignores_empty_values() {
        let mut config = AppConfig {
            api_base_url: "https://api.default".to_string(),
            token_file: PathBuf::from("/tmp/default.json"),
            request_timeout: Duration::from_secs(10),
            weather_interval: Duration::from_secs(300),
        };

        apply_overrides(&mut config, Overrides::new(Some(""), Some("  "), Some(0)));

        assert_eq!(config.api_base_url, "https://api.default");
        assert_eq!(config.token_file, PathBuf::from("/tmp/default.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn apply_overrides_overwrites_when_present() {
        let mut config = AppConfig::default();

        apply_overrides(
            &mut config,
            Overrides::new(
                Some("https://api.override/api/auth"),
                Some("/tmp/override.json"),
                Some(3),
            ),
        );

        assert_eq!(config.api_base_url, "https://api.override/api/auth");
        assert_eq!(config.token_file, PathBuf::from("/tmp/override.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn load_reads_environment() {
        temp_env::with_vars(
            [
                (ENV_API_BASE_URL, Some("https://env.example/api/auth")),
                (ENV_TOKEN_FILE, Some("/tmp/env-session.json")),
                (ENV_TIMEOUT_SECS, Some("25")),
            ],
            || {
                let config = AppConfig::load();
                assert_eq!(config.api_base_url, "https://env.example/api/auth");
                assert_eq!(config.token_file, PathBuf::from("/tmp/env-session.json"));
                assert_eq!(config.request_timeout, Duration::from_secs(25));
            },
        );
    }

    #[test]
    fn load_falls_back_to_defaults() {
        temp_env::with_vars(
            [
                (ENV_API_BASE_URL, None::<&str>),
                (ENV_TOKEN_FILE, None),
                (ENV_TIMEOUT_SECS, Some("not-a-number")),
            ],
            || {
                let config = AppConfig::load();
                assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
                assert_eq!(config.request_timeout, Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn validate_rejects_unsupported_urls() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.api_base_url = "ftp://files.example".to_string();
        assert!(config.validate().is_err());

        config.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
