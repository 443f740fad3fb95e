//! Test doubles for the analysis service.
//!
//! [`ScriptedService`] answers submissions and polls from queues filled by
//! the test, and can hold a poll open until the test releases it. That makes
//! late and out-of-order responses reproducible under tokio's paused clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::ServiceError;
use crate::monitor::AnalysisService;
use crate::state::{Snapshot, TaskId};

type PollResult = Result<Snapshot, ServiceError>;
type SubmitResult = Result<TaskId, ServiceError>;

struct SubmitStep {
    delay: Option<Duration>,
    result: SubmitResult,
}

enum PollStep {
    Ready(PollResult),
    Delayed(Duration, PollResult),
    Held(oneshot::Receiver<PollResult>),
}

/// Handle for a poll response the test releases by hand.
pub struct HeldResponse(oneshot::Sender<PollResult>);

impl HeldResponse {
    /// Completes the held poll. Ignored if nobody is waiting any more.
    pub fn release(self, result: PollResult) {
        let _ = self.0.send(result);
    }
}

/// Analysis service driven by pre-recorded answers.
///
/// Submissions with nothing scripted are accepted with the id `"task-1"`.
/// Polls with nothing scripted never complete.
#[derive(Default)]
pub struct ScriptedService {
    submissions: Mutex<VecDeque<SubmitStep>>,
    polls: Mutex<VecDeque<PollStep>>,
    submitted_urls: Mutex<Vec<String>>,
    polled_ids: Mutex<Vec<TaskId>>,
    poll_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next submission succeeds with `id`.
    pub fn accept(&self, id: impl Into<String>) {
        self.push_submission(None, Ok(TaskId::new(id)));
    }

    /// Next submission succeeds with `id` after `delay`.
    pub fn accept_after(&self, delay: Duration, id: impl Into<String>) {
        self.push_submission(Some(delay), Ok(TaskId::new(id)));
    }

    /// Next submission fails with `error`.
    pub fn reject(&self, error: ServiceError) {
        self.push_submission(None, Err(error));
    }

    fn push_submission(&self, delay: Option<Duration>, result: SubmitResult) {
        lock(&self.submissions).push_back(SubmitStep { delay, result });
    }

    /// Next poll answers `snapshot` immediately.
    pub fn respond(&self, snapshot: Snapshot) {
        lock(&self.polls).push_back(PollStep::Ready(Ok(snapshot)));
    }

    /// Next poll fails with `error` immediately.
    pub fn fail(&self, error: ServiceError) {
        lock(&self.polls).push_back(PollStep::Ready(Err(error)));
    }

    /// Next poll answers `result` after `delay`.
    pub fn respond_after(&self, delay: Duration, result: PollResult) {
        lock(&self.polls).push_back(PollStep::Delayed(delay, result));
    }

    /// Next poll stays outstanding until the returned handle is released.
    pub fn hold(&self) -> HeldResponse {
        let (tx, rx) = oneshot::channel();
        lock(&self.polls).push_back(PollStep::Held(rx));
        HeldResponse(tx)
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn submitted_urls(&self) -> Vec<String> {
        lock(&self.submitted_urls).clone()
    }

    pub fn polled_ids(&self) -> Vec<TaskId> {
        lock(&self.polled_ids).clone()
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn submit(&self, url: &str) -> Result<TaskId, ServiceError> {
        lock(&self.submitted_urls).push(url.to_string());

        let step = lock(&self.submissions).pop_front();
        match step {
            Some(SubmitStep {
                delay: Some(delay),
                result,
            }) => {
                tokio::time::sleep(delay).await;
                result
            }
            Some(SubmitStep { delay: None, result }) => result,
            None => Ok(TaskId::new("task-1")),
        }
    }

    async fn poll(&self, task_id: &TaskId) -> Result<Snapshot, ServiceError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.polled_ids).push(task_id.clone());

        let step = lock(&self.polls).pop_front();
        match step {
            Some(PollStep::Ready(result)) => result,
            Some(PollStep::Delayed(delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            Some(PollStep::Held(rx)) => match rx.await {
                Ok(result) => result,
                Err(_) => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }
}
