//! Periodic task polling.
//!
//! A [`PollingScheduler`] follows one task at a time. Each run lives in its
//! own tokio task that sleeps until the next tick, issues a single poll and
//! hands the result to the caller's callbacks. A tick that comes due while
//! a poll is still outstanding is dropped rather than queued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use super::service::AnalysisService;
use super::DEFAULT_TASK_POLL_INTERVAL;
use crate::error::PollError;
use crate::state::{Snapshot, TaskId};

/// What the scheduler should do after a snapshot has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    Stop,
}

type SnapshotCallback = Box<dyn FnMut(Snapshot) -> PollControl + Send>;
type ErrorCallback = Box<dyn FnMut(PollError) + Send>;

struct Callbacks {
    on_snapshot: SnapshotCallback,
    on_error: ErrorCallback,
}

/// Delivery point for poll results.
///
/// Callbacks run with the lock held and [`Gate::close`] takes the same lock,
/// so once `close` returns nothing else is delivered.
#[derive(Clone)]
struct Gate(Arc<Mutex<Option<Callbacks>>>);

impl Gate {
    fn open(callbacks: Callbacks) -> Self {
        Self(Arc::new(Mutex::new(Some(callbacks))))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Callbacks>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        self.lock().take();
    }

    /// Returns `None` when the gate is already closed.
    fn snapshot(&self, snapshot: Snapshot) -> Option<PollControl> {
        self.lock()
            .as_mut()
            .map(|callbacks| (callbacks.on_snapshot)(snapshot))
    }

    /// Returns `false` when the gate is already closed.
    fn error(&self, error: PollError) -> bool {
        match self.lock().as_mut() {
            Some(callbacks) => {
                (callbacks.on_error)(error);
                true
            }
            None => false,
        }
    }
}

struct ActivePoll {
    task_id: TaskId,
    token: CancellationToken,
    gate: Gate,
    handle: JoinHandle<()>,
}

/// Drives periodic observation of a single task.
pub struct PollingScheduler {
    service: Arc<dyn AnalysisService>,
    interval: Duration,
    retry: RetryPolicy,
    active: Option<ActivePoll>,
}

impl PollingScheduler {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            service,
            interval: DEFAULT_TASK_POLL_INTERVAL,
            retry: RetryPolicy::default(),
            active: None,
        }
    }

    /// Set the polling interval. Takes effect on the next `start`.
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Set the retry policy. Takes effect on the next `start`.
    pub fn set_retry_policy(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    pub fn poll_interval(&self) -> Duration {
        self.interval
    }

    /// Starts polling `task_id`, replacing any run already in progress.
    ///
    /// `on_snapshot` decides whether polling continues. `on_error` sees
    /// every transport failure; polling carries on after it unless the retry
    /// policy is exhausted. Neither callback may call back into this
    /// scheduler. Must be called from within a tokio runtime.
    pub fn start<S, E>(&mut self, task_id: TaskId, on_snapshot: S, on_error: E)
    where
        S: FnMut(Snapshot) -> PollControl + Send + 'static,
        E: FnMut(PollError) + Send + 'static,
    {
        self.stop();

        let token = CancellationToken::new();
        let gate = Gate::open(Callbacks {
            on_snapshot: Box::new(on_snapshot),
            on_error: Box::new(on_error),
        });

        let run = PollRun {
            service: Arc::clone(&self.service),
            task_id: task_id.clone(),
            interval: self.interval,
            retry: self.retry.clone(),
            token: token.clone(),
            gate: gate.clone(),
        };

        debug!(task_id = %task_id, interval_ms = self.interval.as_millis() as u64, "polling started");
        let handle = tokio::spawn(run.run());

        self.active = Some(ActivePoll {
            task_id,
            token,
            gate,
            handle,
        });
    }

    /// Stops polling. Idempotent; no callback fires after this returns.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
            active.gate.close();
            debug!(task_id = %active.task_id, "polling stopped");
        }
    }

    /// Whether a run is still polling. A run that stopped itself after a
    /// terminal snapshot or exhausted retries reports `false`.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.token.is_cancelled() && !active.handle.is_finished())
    }

    /// Task being polled, if any.
    pub fn task_id(&self) -> Option<&TaskId> {
        self.active.as_ref().map(|active| &active.task_id)
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State of a single polling run.
struct PollRun {
    service: Arc<dyn AnalysisService>,
    task_id: TaskId,
    interval: Duration,
    retry: RetryPolicy,
    token: CancellationToken,
    gate: Gate,
}

impl PollRun {
    async fn run(self) {
        let mut next_tick = Instant::now() + self.interval;
        let mut failures = 0u32;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = time::sleep_until(next_tick) => {}
            }
            let fired = next_tick;

            let result = tokio::select! {
                _ = self.token.cancelled() => break,
                result = self.service.poll(&self.task_id) => result,
            };

            next_tick = next_aligned_tick(fired, self.interval, Instant::now());

            match result {
                Ok(snapshot) => {
                    failures = 0;
                    debug!(
                        task_id = %self.task_id,
                        status = %snapshot.status,
                        progress = snapshot.progress,
                        "poll succeeded"
                    );
                    match self.gate.snapshot(snapshot) {
                        Some(PollControl::Continue) => {}
                        Some(PollControl::Stop) | None => break,
                    }
                }
                Err(source) => {
                    failures = failures.saturating_add(1);
                    warn!(task_id = %self.task_id, failures, error = %source, "poll failed");

                    let delivered = self.gate.error(PollError::Transport {
                        source,
                        consecutive_failures: failures,
                    });
                    if !delivered {
                        break;
                    }

                    if self.retry.is_exhausted(failures) {
                        warn!(task_id = %self.task_id, failures, "retry limit reached, polling stopped");
                        self.gate.error(PollError::RetriesExhausted { attempts: failures });
                        break;
                    }

                    let backoff = fired + self.retry.next_delay(self.interval, failures);
                    next_tick = next_tick.max(backoff);
                }
            }
        }

        self.gate.close();
        self.token.cancel();
    }
}

/// First tick on the `fired + k * interval` grid that is strictly after
/// `now`. Ticks that elapsed while a poll was outstanding are skipped.
fn next_aligned_tick(fired: Instant, interval: Duration, now: Instant) -> Instant {
    let period = interval.as_nanos().max(1);
    let elapsed = now.saturating_duration_since(fired).as_nanos();
    let ticks = (elapsed / period + 1).min(u32::MAX as u128) as u32;
    fired + interval * ticks
}
