//! Task state management.
//!
//! Holds the locally tracked view of the single analysis task a client is
//! following: its identity, status, progress, logs and terminal payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::machine::TransitionError;
use super::payload::Payload;

/// First log line shown while a submission is in flight.
pub const STARTING_LOG: &str = "Starting analysis...";

/// Identifier assigned to a task by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    /// Nothing submitted yet.
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tracked unit of work.
///
/// A `Task` only changes through the transition constructors below and
/// [`reconcile`](super::reconcile); every one of them returns a new value
/// and leaves the receiver untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    pub(crate) id: Option<TaskId>,
    pub(crate) attempt: u64,
    pub(crate) url: Option<String>,
    pub(crate) status: TaskStatus,
    pub(crate) progress: u8,
    /// Client entries written before the service reported anything.
    pub(crate) preamble: Vec<String>,
    /// Latest log sequence reported by the service.
    pub(crate) service_logs: Vec<String>,
    /// Client diagnostics written after the fact.
    pub(crate) epilogue: Vec<String>,
    pub(crate) payload: Option<Payload>,
    pub(crate) error: Option<String>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A task with nothing submitted.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Optimistic state entered as soon as a submission starts, before the
    /// service has answered.
    pub fn submitting(url: impl Into<String>, attempt: u64, now: DateTime<Utc>) -> Self {
        Self {
            attempt,
            url: Some(url.into()),
            status: TaskStatus::Processing,
            preamble: vec![STARTING_LOG.to_string()],
            started_at: Some(now),
            ..Self::default()
        }
    }

    /// Records the id handed out by the service. The id can only be set once
    /// and only while the submission is still pending.
    pub fn accepted(&self, id: TaskId) -> Result<Self, TransitionError> {
        if self.status != TaskStatus::Processing {
            return Err(TransitionError::Illegal {
                from: self.status,
                to: TaskStatus::Processing,
            });
        }
        if let Some(existing) = &self.id {
            return Err(TransitionError::AlreadyAssigned(existing.clone()));
        }

        let mut next = self.clone();
        next.id = Some(id);
        Ok(next)
    }

    /// The submission request itself failed; no id was assigned.
    pub fn submission_failed(&self, reason: &str, now: DateTime<Utc>) -> Self {
        self.fail_locally(format!("Failed to start analysis: {reason}"), reason, now)
    }

    /// The client gave up on a task the service never reported as finished.
    pub fn abandoned(&self, reason: &str, now: DateTime<Utc>) -> Self {
        self.fail_locally(reason.to_string(), reason, now)
    }

    fn fail_locally(&self, log: String, reason: &str, now: DateTime<Utc>) -> Self {
        if !self.status.is_active() {
            return self.clone();
        }

        let mut next = self.clone();
        next.status = TaskStatus::Failed;
        next.payload = None;
        next.error = Some(reason.to_string());
        next.epilogue.push(log);
        next.finished_at = Some(now);
        next
    }

    pub fn id(&self) -> Option<&TaskId> {
        self.id.as_ref()
    }

    /// Client-local submission counter this task belongs to.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Normalized URL under analysis.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// All log lines in display order.
    pub fn logs(&self) -> impl Iterator<Item = &str> {
        self.preamble
            .iter()
            .chain(self.service_logs.iter())
            .chain(self.epilogue.iter())
            .map(String::as_str)
    }

    pub fn log_count(&self) -> usize {
        self.preamble.len() + self.service_logs.len() + self.epilogue.len()
    }

    pub fn last_log(&self) -> Option<&str> {
        self.epilogue
            .last()
            .or_else(|| self.service_logs.last())
            .or_else(|| self.preamble.last())
            .map(String::as_str)
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let start = self.started_at?;
        Some(self.finished_at.unwrap_or(now).signed_duration_since(start))
    }

    /// Whether responses tagged with `(attempt, id)` still belong to this task.
    pub fn is_tracking(&self, attempt: u64, id: &TaskId) -> bool {
        self.attempt == attempt && self.id.as_ref() == Some(id)
    }
}
