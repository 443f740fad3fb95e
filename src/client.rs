//! Task client.
//!
//! [`TaskClient`] is the entry point for callers: it submits a URL, follows
//! the resulting task with a [`PollingScheduler`] and publishes every state
//! change on a watch channel. The submission request runs on its own tokio
//! task, so callers that must stay responsive can use
//! [`TaskClient::begin_submit`] and watch for the answer.
//!
//! Every poll result is tagged with the submission attempt and task id it
//! was issued for. Results whose tag no longer matches the tracked task are
//! dropped, which covers responses that arrive after a reset or after the
//! same URL was resubmitted under the same id.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{ClientError, PollError};
use crate::monitor::{AnalysisService, PollControl, PollingScheduler, RetryPolicy};
use crate::state::{self, Snapshot, Task, TaskId};

/// Normalizes user input into the URL that gets submitted and displayed.
///
/// Input without a scheme is prefixed with `https://`. Blank input yields
/// `None`.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if has_scheme(trimmed) {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

fn has_scheme(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

type SharedScheduler = Arc<Mutex<PollingScheduler>>;

fn lock(scheduler: &SharedScheduler) -> MutexGuard<'_, PollingScheduler> {
    scheduler.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Submits analyses and keeps the tracked task in sync with the service.
///
/// Accepting a submission and resetting both happen with the scheduler
/// locked, so a submission that resolves after a reset can never start
/// polling.
pub struct TaskClient {
    service: Arc<dyn AnalysisService>,
    scheduler: SharedScheduler,
    state: Arc<watch::Sender<Task>>,
    poll_failures: Arc<AtomicU32>,
    attempt: u64,
    submission: Option<JoinHandle<()>>,
}

impl TaskClient {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        let scheduler = PollingScheduler::new(Arc::clone(&service));
        let (state, _) = watch::channel(Task::idle());

        Self {
            service,
            scheduler: Arc::new(Mutex::new(scheduler)),
            state: Arc::new(state),
            poll_failures: Arc::new(AtomicU32::new(0)),
            attempt: 0,
            submission: None,
        }
    }

    pub fn from_config(service: Arc<dyn AnalysisService>, config: &AppConfig) -> Self {
        Self::new(service)
            .with_poll_interval(config.poll_interval())
            .with_retry_policy(config.retry.clone())
    }

    pub fn with_poll_interval(self, interval: Duration) -> Self {
        lock(&self.scheduler).set_poll_interval(interval);
        self
    }

    pub fn with_retry_policy(self, retry: RetryPolicy) -> Self {
        lock(&self.scheduler).set_retry_policy(retry);
        self
    }

    /// Current view of the tracked task.
    pub fn state(&self) -> Task {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<Task> {
        self.state.subscribe()
    }

    /// Whether the task is still being polled.
    pub fn is_polling(&self) -> bool {
        lock(&self.scheduler).is_running()
    }

    /// Whether a submission is still waiting for the service to answer.
    pub fn is_submitting(&self) -> bool {
        self.submission
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Poll transport failures since the last successful poll.
    pub fn consecutive_poll_failures(&self) -> u32 {
        self.poll_failures.load(Ordering::SeqCst)
    }

    /// Starts analysing `url`, replacing whatever was tracked before, and
    /// returns once the service has answered the submission.
    ///
    /// The task turns `processing` right away. A failed submission leaves it
    /// `failed` with a diagnostic log line rather than returning an error;
    /// only blank input is refused.
    pub async fn submit(&mut self, url: &str) -> Result<(), ClientError> {
        self.begin_submit(url)?;

        if let Some(handle) = self.submission.as_mut() {
            if let Err(error) = handle.await {
                warn!(%error, "submission task ended abnormally");
            }
        }
        Ok(())
    }

    /// Like [`submit`](Self::submit) but returns as soon as the task is
    /// `processing`; the service's answer is applied in the background.
    /// Must be called from within a tokio runtime.
    pub fn begin_submit(&mut self, url: &str) -> Result<(), ClientError> {
        let url = normalize_url(url).ok_or(ClientError::EmptyUrl)?;

        self.cancel_submission();
        self.attempt += 1;
        let attempt = self.attempt;

        {
            let mut scheduler = lock(&self.scheduler);
            scheduler.stop();
            self.poll_failures.store(0, Ordering::SeqCst);
            self.state
                .send_replace(Task::submitting(url.clone(), attempt, Utc::now()));
        }
        info!(url = %url, attempt, "submitting analysis");

        let submission = Submission {
            service: Arc::clone(&self.service),
            scheduler: Arc::clone(&self.scheduler),
            state: Arc::clone(&self.state),
            poll_failures: Arc::clone(&self.poll_failures),
            attempt,
            url,
        };
        self.submission = Some(tokio::spawn(submission.run()));
        Ok(())
    }

    /// Stops polling, drops any pending submission and returns to `idle`.
    pub fn reset(&mut self) {
        self.cancel_submission();
        self.attempt += 1;

        let mut scheduler = lock(&self.scheduler);
        scheduler.stop();
        self.poll_failures.store(0, Ordering::SeqCst);
        self.state.send_replace(Task::idle());
        debug!(attempt = self.attempt, "task reset");
    }

    fn cancel_submission(&mut self) {
        if let Some(handle) = self.submission.take() {
            handle.abort();
        }
    }
}

impl Drop for TaskClient {
    fn drop(&mut self) {
        self.cancel_submission();
        lock(&self.scheduler).stop();
    }
}

/// One submission round trip, run off the caller's task.
struct Submission {
    service: Arc<dyn AnalysisService>,
    scheduler: SharedScheduler,
    state: Arc<watch::Sender<Task>>,
    poll_failures: Arc<AtomicU32>,
    attempt: u64,
    url: String,
}

impl Submission {
    async fn run(self) {
        let result = self.service.submit(&self.url).await;
        let attempt = self.attempt;

        let mut scheduler = lock(&self.scheduler);
        match result {
            Ok(task_id) => {
                let mut accepted = false;
                self.state.send_if_modified(|task| {
                    if task.attempt() != attempt {
                        return false;
                    }
                    match task.accepted(task_id.clone()) {
                        Ok(next) => {
                            *task = next;
                            accepted = true;
                            true
                        }
                        Err(reason) => {
                            warn!(task_id = %task_id, %reason, "ignoring submission response");
                            false
                        }
                    }
                });

                if accepted {
                    info!(task_id = %task_id, attempt, "analysis accepted");
                    start_polling(
                        &mut scheduler,
                        &self.state,
                        &self.poll_failures,
                        attempt,
                        task_id,
                    );
                } else {
                    debug!(task_id = %task_id, attempt, "discarding superseded submission");
                }
            }
            Err(error) => {
                warn!(url = %self.url, attempt, %error, "submission failed");
                let reason = error.to_string();
                self.state.send_if_modified(|task| {
                    if task.attempt() != attempt {
                        return false;
                    }
                    *task = task.submission_failed(&reason, Utc::now());
                    true
                });
            }
        }
    }
}

fn start_polling(
    scheduler: &mut PollingScheduler,
    store: &Arc<watch::Sender<Task>>,
    failures: &Arc<AtomicU32>,
    attempt: u64,
    task_id: TaskId,
) {
    let on_snapshot = {
        let store = Arc::clone(store);
        let failures = Arc::clone(failures);
        let task_id = task_id.clone();
        move |snapshot: Snapshot| apply_snapshot(&store, &failures, attempt, &task_id, snapshot)
    };
    let on_error = {
        let store = Arc::clone(store);
        let failures = Arc::clone(failures);
        let task_id = task_id.clone();
        move |error: PollError| record_poll_error(&store, &failures, attempt, &task_id, error)
    };

    scheduler.start(task_id, on_snapshot, on_error);
}

fn apply_snapshot(
    store: &watch::Sender<Task>,
    failures: &AtomicU32,
    attempt: u64,
    task_id: &TaskId,
    snapshot: Snapshot,
) -> PollControl {
    let mut control = PollControl::Stop;

    store.send_if_modified(|task| {
        if !task.is_tracking(attempt, task_id) {
            debug!(task_id = %task_id, attempt, "discarding snapshot for superseded task");
            return false;
        }
        failures.store(0, Ordering::SeqCst);

        if let Err(reason) = state::check(task, &snapshot) {
            warn!(task_id = %task_id, %reason, "snapshot rejected");
            if !task.status().is_terminal() {
                control = PollControl::Continue;
            }
            return false;
        }

        let next = state::reconcile(task, &snapshot);
        if next.status().is_terminal() {
            info!(
                task_id = %task_id,
                status = %next.status(),
                progress = next.progress(),
                "analysis finished"
            );
        } else {
            control = PollControl::Continue;
        }

        let changed = next != *task;
        *task = next;
        changed
    });

    control
}

fn record_poll_error(
    store: &watch::Sender<Task>,
    failures: &AtomicU32,
    attempt: u64,
    task_id: &TaskId,
    error: PollError,
) {
    match error {
        PollError::Transport {
            consecutive_failures,
            ..
        } => {
            if store.borrow().is_tracking(attempt, task_id) {
                failures.store(consecutive_failures, Ordering::SeqCst);
            }
        }
        PollError::RetriesExhausted { attempts } => {
            let reason = format!(
                "Lost contact with the analysis service after {attempts} failed status checks."
            );
            store.send_if_modified(|task| {
                if !task.is_tracking(attempt, task_id) {
                    return false;
                }
                let next = task.abandoned(&reason, Utc::now());
                let changed = next != *task;
                *task = next;
                changed
            });
        }
    }
}

impl std::fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("attempt", &self.attempt)
            .field("submitting", &self.is_submitting())
            .field("polling", &self.is_polling())
            .field("task", &*self.state.borrow())
            .finish()
    }
}
