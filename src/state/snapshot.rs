//! Point-in-time task observations.

use chrono::{DateTime, Utc};

use super::payload::Payload;
use super::task::TaskStatus;

/// One poll response from the analysis service.
///
/// Snapshots are never mutated after construction; they only feed
/// [`reconcile`](super::reconcile).
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: TaskStatus,
    /// Percentage in `0..=100`.
    pub progress: u8,
    /// `None` when the response carried no log list.
    pub logs: Option<Vec<String>>,
    pub payload: Option<Payload>,
    /// Failure reason reported alongside a `failed` status.
    pub error: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(status: TaskStatus, progress: u8) -> Self {
        Self {
            status,
            progress: progress.min(100),
            logs: None,
            payload: None,
            error: None,
            observed_at: Utc::now(),
        }
    }

    pub fn processing(progress: u8) -> Self {
        Self::new(TaskStatus::Processing, progress)
    }

    pub fn completed(progress: u8, payload: Payload) -> Self {
        Self::new(TaskStatus::Completed, progress).with_payload(payload)
    }

    pub fn failed(progress: u8) -> Self {
        Self::new(TaskStatus::Failed, progress)
    }

    pub fn with_logs<I, S>(mut self, logs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logs = Some(logs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }
}
