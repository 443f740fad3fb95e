//! Error types shared across the crate.

use thiserror::Error;

use crate::state::TaskId;

/// A failed exchange with the analysis service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service answered with HTTP {code}")]
    Status { code: u16 },

    #[error("task {0} is unknown to the service")]
    UnknownTask(TaskId),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response carried no task id")]
    MissingTaskId,

    #[error("unrecognised task status {0:?}")]
    UnknownStatus(String),

    #[error("completed response carried no data")]
    MissingPayload,
}

/// Errors reported by the polling scheduler.
#[derive(Debug, Error)]
pub enum PollError {
    /// A single poll failed. Polling continues.
    #[error("poll failed ({consecutive_failures} in a row): {source}")]
    Transport {
        #[source]
        source: ServiceError,
        consecutive_failures: u32,
    },

    /// The retry policy gave up. Polling has stopped.
    #[error("gave up after {attempts} consecutive failed polls")]
    RetriesExhausted { attempts: u32 },
}

/// Errors returned directly to callers of the task client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("no URL given")]
    EmptyUrl,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
