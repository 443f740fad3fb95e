//! Application configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `ANALYSIS_TUI_*` environment variables (nested keys use `__`, e.g.
//! `ANALYSIS_TUI_RETRY__MAX_CONSECUTIVE_FAILURES=10`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::monitor::RetryPolicy;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "analysis-tui.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Analysis service root; also the base for result resource links.
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// UI refresh tick.
    pub tick_rate_ms: u64,
    pub log_file: PathBuf,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_ms: 1000,
            request_timeout_ms: 10_000,
            tick_rate_ms: 250,
            log_file: PathBuf::from("analysis-tui.log"),
            log_filter: "info".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from `path` (required to exist) or, when `None`,
    /// from [`DEFAULT_CONFIG_FILE`] if present, then applies the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("ANALYSIS_TUI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("tick_rate_ms must be positive".into()));
        }
        if !(self.retry.backoff_multiplier >= 1.0) {
            return Err(ConfigError::Invalid(
                "retry.backoff_multiplier must be at least 1.0".into(),
            ));
        }
        if self.retry.max_consecutive_failures == Some(0) {
            return Err(ConfigError::Invalid(
                "retry.max_consecutive_failures must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn defaults_match_service_contract() {
        let config = AppConfig::default();

        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_config(
            r#"
base_url = "https://analysis.internal"
poll_interval_ms = 500

[retry]
max_consecutive_failures = 20
backoff_multiplier = 1.5
"#,
        );

        let config = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.base_url, "https://analysis.internal");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.retry.max_consecutive_failures, Some(20));
        assert_eq!(config.retry.backoff_multiplier, 1.5);
        assert_eq!(config.retry.max_delay_ms, 30_000);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/analysis-tui.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = write_config("poll_interval_ms = 0\n");
        assert!(matches!(
            AppConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));

        let bad_base = AppConfig {
            base_url: "localhost:8000".into(),
            ..AppConfig::default()
        };
        assert!(bad_base.validate().is_err());

        let mut bad_backoff = AppConfig::default();
        bad_backoff.retry.backoff_multiplier = 0.5;
        assert!(bad_backoff.validate().is_err());
    }
}
