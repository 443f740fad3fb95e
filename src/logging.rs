//! Structured logging setup.
//!
//! The terminal belongs to the UI, so log output goes to a file. `RUST_LOG`
//! takes precedence over the configured filter.

use std::fs::OpenOptions;
use std::sync::{Mutex, OnceLock};

use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(config: &AppConfig) -> Result<()> {
    if LOGGER_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .wrap_err_with(|| format!("failed to open log file {}", config.log_file.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .wrap_err_with(|| format!("invalid log filter {:?}", config.log_filter))?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();

    // Someone else owning the global subscriber is fine.
    if installed.is_err() {
        tracing::debug!("global tracing subscriber already initialized");
    }

    let _ = LOGGER_INITIALIZED.set(());
    tracing::info!(
        log_file = %config.log_file.display(),
        base_url = %config.base_url,
        "logging initialized"
    );
    Ok(())
}
