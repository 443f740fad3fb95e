//! Snapshot reconciliation.
//!
//! `reconcile` is the single transition function applied to a tracked task
//! whenever the service reports on it. Legal moves:
//!
//! ```text
//! idle ──submit──▶ processing ──▶ processing
//!                      │
//!                      ├──▶ completed
//!                      └──▶ failed
//! ```
//!
//! `idle → processing` only happens through [`Task::submitting`]; snapshots
//! never start a task. Terminal states absorb everything.

use thiserror::Error;

use super::snapshot::Snapshot;
use super::task::{Task, TaskId, TaskStatus};

/// Why a snapshot was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("task is already {0}")]
    Terminal(TaskStatus),

    #[error("no task has been accepted by the service yet")]
    NotStarted,

    #[error("illegal transition {from} -> {to}")]
    Illegal { from: TaskStatus, to: TaskStatus },

    #[error("completed snapshot carries no payload")]
    MissingPayload,

    #[error("task already has id {0}")]
    AlreadyAssigned(TaskId),
}

/// Checks whether `snapshot` may be applied to `current`.
pub fn check(current: &Task, snapshot: &Snapshot) -> Result<(), TransitionError> {
    if current.status.is_terminal() {
        return Err(TransitionError::Terminal(current.status));
    }
    if current.status != TaskStatus::Processing || current.id.is_none() {
        return Err(TransitionError::NotStarted);
    }

    match snapshot.status {
        TaskStatus::Idle => Err(TransitionError::Illegal {
            from: current.status,
            to: snapshot.status,
        }),
        TaskStatus::Completed if snapshot.payload.is_none() => {
            Err(TransitionError::MissingPayload)
        }
        _ => Ok(()),
    }
}

/// Merges `snapshot` into `current` and returns the next state.
///
/// Pure: the result depends only on the two arguments. A snapshot that
/// fails [`check`] yields `current` unchanged.
pub fn reconcile(current: &Task, snapshot: &Snapshot) -> Task {
    if check(current, snapshot).is_err() {
        return current.clone();
    }

    let mut next = current.clone();
    next.status = snapshot.status;
    next.progress = current.progress.max(snapshot.progress.min(100));

    // A shorter list than the one already held is stale; keep what we have.
    if let Some(logs) = &snapshot.logs {
        if logs.len() >= current.service_logs.len() {
            next.service_logs = logs.clone();
        }
    }

    match snapshot.status {
        TaskStatus::Completed => {
            next.payload = snapshot.payload.clone();
            next.finished_at = Some(snapshot.observed_at);
        }
        TaskStatus::Failed => {
            next.payload = None;
            if snapshot.error.is_some() {
                next.error = snapshot.error.clone();
            }
            next.finished_at = Some(snapshot.observed_at);
        }
        TaskStatus::Idle | TaskStatus::Processing => {}
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Payload;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    fn active() -> Task {
        Task::submitting("https://example.com", 1, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
            .accepted(TaskId::from("example_com"))
            .unwrap()
    }

    fn payload() -> Payload {
        Payload::new(json!({ "report": "done" }))
    }

    fn apply(task: Task, snapshots: &[Snapshot]) -> Task {
        snapshots.iter().fold(task, |task, snapshot| reconcile(&task, snapshot))
    }

    #[test]
    fn progress_never_regresses() {
        let task = apply(
            active(),
            &[Snapshot::processing(40), Snapshot::processing(30)],
        );

        assert_eq!(task.progress(), 40);
        assert_eq!(task.status(), TaskStatus::Processing);
    }

    #[test]
    fn completed_attaches_payload() {
        let done = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
        let task = reconcile(
            &active(),
            &Snapshot::completed(100, payload()).observed_at(done),
        );

        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.payload(), Some(&payload()));
        assert_eq!(task.finished_at(), Some(done));
    }

    #[test]
    fn failed_keeps_payload_absent_and_records_error() {
        let snapshot = Snapshot::failed(60)
            .with_payload(payload())
            .with_error("scrape timed out")
            .with_logs(["Scraping...", "Error: scrape timed out"]);
        let task = reconcile(&active(), &snapshot);

        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.payload(), None);
        assert_eq!(task.error(), Some("scrape timed out"));
        assert_eq!(task.last_log(), Some("Error: scrape timed out"));
    }

    #[rstest]
    #[case::completed(Snapshot::completed(100, Payload::new(json!({}))))]
    #[case::failed(Snapshot::failed(10))]
    fn terminal_states_absorb_later_snapshots(#[case] terminal: Snapshot) {
        let finished = reconcile(&active(), &terminal);
        let later = [
            Snapshot::processing(99),
            Snapshot::failed(100),
            Snapshot::completed(100, Payload::new(json!({ "other": true }))),
        ];

        for snapshot in &later {
            assert_eq!(
                check(&finished, snapshot),
                Err(TransitionError::Terminal(finished.status()))
            );
            assert_eq!(reconcile(&finished, snapshot), finished);
        }
    }

    #[test]
    fn logs_are_replaced_when_provided_and_kept_when_omitted() {
        let task = apply(
            active(),
            &[
                Snapshot::processing(10).with_logs(["Setting up directories..."]),
                Snapshot::processing(20),
            ],
        );

        assert_eq!(
            task.logs().collect::<Vec<_>>(),
            vec!["Starting analysis...", "Setting up directories..."]
        );
    }

    #[test]
    fn shorter_log_sequence_does_not_drop_entries() {
        let task = apply(
            active(),
            &[
                Snapshot::processing(10).with_logs(["a", "b"]),
                Snapshot::processing(20).with_logs(["a"]),
            ],
        );

        assert_eq!(task.service_logs, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(task.progress(), 20);
    }

    #[test]
    fn snapshots_cannot_start_an_idle_task() {
        let idle = Task::idle();
        let snapshot = Snapshot::processing(50);

        assert_eq!(check(&idle, &snapshot), Err(TransitionError::NotStarted));
        assert_eq!(reconcile(&idle, &snapshot), idle);
    }

    #[test]
    fn pending_submission_ignores_snapshots() {
        let pending = Task::submitting("https://example.com", 1, Utc::now());

        assert_eq!(reconcile(&pending, &Snapshot::processing(50)), pending);
    }

    #[test]
    fn idle_snapshot_is_rejected() {
        let task = active();
        let snapshot = Snapshot::new(TaskStatus::Idle, 0);

        assert_eq!(
            check(&task, &snapshot),
            Err(TransitionError::Illegal {
                from: TaskStatus::Processing,
                to: TaskStatus::Idle
            })
        );
        assert_eq!(reconcile(&task, &snapshot), task);
    }

    #[test]
    fn completed_without_payload_is_rejected() {
        let task = active();
        let snapshot = Snapshot::new(TaskStatus::Completed, 100);

        assert_eq!(check(&task, &snapshot), Err(TransitionError::MissingPayload));
        assert_eq!(reconcile(&task, &snapshot), task);
    }

    #[test]
    fn completion_does_not_require_full_progress() {
        let task = reconcile(&active(), &Snapshot::completed(80, payload()));

        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.progress(), 80);
    }

    fn any_snapshot() -> impl Strategy<Value = Snapshot> {
        (0u8..=100, 0u8..10, proptest::option::of(proptest::collection::vec("[a-z]{1,6}", 0..4)))
            .prop_map(|(progress, roll, logs)| {
                let snapshot = match roll {
                    0 => Snapshot::completed(progress, Payload::new(json!({ "p": progress }))),
                    1 => Snapshot::failed(progress),
                    _ => Snapshot::processing(progress),
                };
                match logs {
                    Some(logs) => snapshot.with_logs(logs),
                    None => snapshot,
                }
            })
    }

    proptest! {
        #[test]
        fn progress_is_monotonic(snapshots in proptest::collection::vec(any_snapshot(), 1..30)) {
            let mut task = active();
            for snapshot in &snapshots {
                let next = reconcile(&task, snapshot);
                prop_assert!(next.progress() >= task.progress());
                task = next;
            }
        }

        #[test]
        fn terminal_state_is_absorbing(snapshots in proptest::collection::vec(any_snapshot(), 1..30)) {
            let mut task = active();
            let mut terminal: Option<Task> = None;
            for snapshot in &snapshots {
                task = reconcile(&task, snapshot);
                match &terminal {
                    Some(frozen) => prop_assert_eq!(&task, frozen),
                    None if task.status().is_terminal() => terminal = Some(task.clone()),
                    None => {}
                }
            }
        }

        #[test]
        fn reconcile_is_deterministic(snapshot in any_snapshot()) {
            let task = active();
            prop_assert_eq!(reconcile(&task, &snapshot), reconcile(&task, &snapshot));
        }
    }
}
