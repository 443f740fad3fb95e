//! Monitoring components for following an analysis task.
//!
//! This module provides the connection to the analysis service and the
//! machinery that watches a submitted task:
//!
//! - Submitting URLs and polling task status over HTTP
//! - Periodic polling with a single request in flight
//! - Retry and backoff for failed polls

pub mod retry;
pub mod scheduler;
pub mod service;

pub use retry::RetryPolicy;
pub use scheduler::{PollControl, PollingScheduler};
pub use service::{AnalysisService, HttpAnalysisService};

#[cfg(test)]
pub use service::MockAnalysisService;

use std::time::Duration;

/// Default polling interval for task status.
pub const DEFAULT_TASK_POLL_INTERVAL: Duration = Duration::from_secs(1);
