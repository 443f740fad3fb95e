//! End-to-end behaviour of the task client against a scripted service.

use std::sync::Arc;
use std::time::Duration;

use analysis_tui::client::TaskClient;
use analysis_tui::error::ServiceError;
use analysis_tui::monitor::RetryPolicy;
use analysis_tui::state::{Payload, Snapshot, TaskId, TaskStatus, STARTING_LOG};
use analysis_tui::testing::ScriptedService;
use pretty_assertions::assert_eq;
use serde_json::json;

fn setup() -> (Arc<ScriptedService>, TaskClient) {
    let service = Arc::new(ScriptedService::new());
    let client = TaskClient::new(service.clone());
    (service, client)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn report() -> Payload {
    Payload::new(json!({
        "brand_data": { "title": "Example" },
        "report": "# Example brand",
        "pdf_url": "/results/example_com/report.pdf"
    }))
}

#[tokio::test(start_paused = true)]
async fn scheme_less_url_is_submitted_as_https() {
    let (service, mut client) = setup();
    service.accept("example_com");

    client.submit("example.com").await.unwrap();

    assert_eq!(service.submitted_urls(), vec!["https://example.com".to_string()]);
    assert_eq!(client.state().url(), Some("https://example.com"));
}

#[tokio::test(start_paused = true)]
async fn regressed_progress_is_clamped() {
    let (service, mut client) = setup();
    service.accept("example_com");
    service.respond(Snapshot::processing(40));
    service.respond(Snapshot::processing(30));

    client.submit("example.com").await.unwrap();
    advance(2500).await;

    assert_eq!(service.poll_count(), 2);
    assert_eq!(client.state().progress(), 40);
    assert_eq!(client.state().status(), TaskStatus::Processing);
}

#[tokio::test(start_paused = true)]
async fn completion_stops_polling_and_exposes_payload() {
    let (service, mut client) = setup();
    service.accept("example_com");
    service.respond(Snapshot::processing(60).with_logs(["Scraping complete."]));
    service.respond(
        Snapshot::completed(100, report()).with_logs(["Scraping complete.", "Analysis complete!"]),
    );
    service.respond(Snapshot::processing(10));

    client.submit("example.com").await.unwrap();
    advance(10_000).await;

    let task = client.state();
    assert_eq!(service.poll_count(), 2);
    assert!(!client.is_polling());
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.payload(), Some(&report()));
    assert_eq!(task.last_log(), Some("Analysis complete!"));
    assert!(task.finished_at().is_some());
}

#[tokio::test(start_paused = true)]
async fn failed_submission_never_polls() {
    let (service, mut client) = setup();
    service.reject(ServiceError::Status { code: 500 });

    client.submit("example.com").await.unwrap();
    advance(5000).await;

    let task = client.state();
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.logs().next(), Some(STARTING_LOG));
    assert_eq!(
        task.last_log(),
        Some("Failed to start analysis: service answered with HTTP 500")
    );
    assert_eq!(service.poll_count(), 0);
    assert!(!client.is_polling());
}

#[tokio::test(start_paused = true)]
async fn reset_mid_processing_ignores_stray_response() {
    let (service, mut client) = setup();
    service.accept("example_com");
    service.respond(Snapshot::processing(20));
    let stray = service.hold();

    client.submit("example.com").await.unwrap();
    advance(2500).await;
    assert_eq!(client.state().progress(), 20);
    assert_eq!(service.poll_count(), 2);

    client.reset();
    stray.release(Ok(Snapshot::completed(100, report())));
    advance(5000).await;

    let task = client.state();
    assert_eq!(task.status(), TaskStatus::Idle);
    assert_eq!(task.id(), None);
    assert_eq!(task.log_count(), 0);
    assert_eq!(service.poll_count(), 2);
    assert!(!client.is_polling());
}

#[tokio::test(start_paused = true)]
async fn resubmitting_same_url_ignores_previous_attempt() {
    let (service, mut client) = setup();
    service.accept("example_com");
    let stale = service.hold();

    client.submit("example.com").await.unwrap();
    advance(1500).await;
    assert_eq!(service.poll_count(), 1);

    // The service derives ids from the host, so the retry reuses the id.
    service.accept("example_com");
    service.respond(Snapshot::processing(5));
    client.submit("example.com").await.unwrap();
    assert_eq!(client.state().id(), Some(&TaskId::from("example_com")));

    stale.release(Ok(Snapshot::failed(90).with_error("old run")));
    advance(1200).await;

    let task = client.state();
    assert_eq!(task.attempt(), 2);
    assert_eq!(task.status(), TaskStatus::Processing);
    assert_eq!(task.progress(), 5);
    assert_eq!(task.error(), None);
    assert!(client.is_polling());
}

#[tokio::test(start_paused = true)]
async fn transport_errors_are_counted_but_not_surfaced() {
    let (service, mut client) = setup();
    service.accept("example_com");
    service.fail(ServiceError::Status { code: 503 });
    service.fail(ServiceError::UnknownTask(TaskId::from("example_com")));
    service.respond(Snapshot::processing(50));

    client.submit("example.com").await.unwrap();
    advance(2500).await;

    assert_eq!(client.consecutive_poll_failures(), 2);
    assert_eq!(client.state().status(), TaskStatus::Processing);
    assert!(client.is_polling());

    advance(1000).await;
    assert_eq!(client.consecutive_poll_failures(), 0);
    assert_eq!(client.state().progress(), 50);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_fail_the_task() {
    let service = Arc::new(ScriptedService::new());
    let mut client = TaskClient::new(service.clone()).with_retry_policy(RetryPolicy::capped(3));
    service.accept("example_com");
    service.respond(Snapshot::processing(30).with_logs(["Scraping https://example.com..."]));
    for _ in 0..3 {
        service.fail(ServiceError::Status { code: 502 });
    }

    client.submit("example.com").await.unwrap();
    advance(10_000).await;

    let task = client.state();
    assert_eq!(service.poll_count(), 4);
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.progress(), 30);
    assert_eq!(
        task.logs().collect::<Vec<_>>(),
        vec![
            STARTING_LOG,
            "Scraping https://example.com...",
            "Lost contact with the analysis service after 3 failed status checks.",
        ]
    );
    assert!(!client.is_polling());
}

#[tokio::test(start_paused = true)]
async fn service_reported_failure_is_terminal() {
    let (service, mut client) = setup();
    service.accept("example_com");
    service.respond(
        Snapshot::failed(40)
            .with_logs(["Scraping https://example.com...", "Error: navigation timeout"])
            .with_error("navigation timeout"),
    );

    client.submit("example.com").await.unwrap();
    advance(5000).await;

    let task = client.state();
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.error(), Some("navigation timeout"));
    assert_eq!(task.payload(), None);
    assert_eq!(task.last_log(), Some("Error: navigation timeout"));
    assert_eq!(service.poll_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_each_change() {
    let (service, mut client) = setup();
    service.accept("example_com");
    service.respond(Snapshot::processing(25));
    let mut updates = client.subscribe();

    client.submit("example.com").await.unwrap();
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().id(), Some(&TaskId::from("example_com")));

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().progress(), 25);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_client_stops_polling() {
    let (service, mut client) = setup();
    service.accept("example_com");
    service.respond(Snapshot::processing(10));
    service.respond(Snapshot::processing(20));

    client.submit("example.com").await.unwrap();
    advance(1500).await;
    drop(client);
    advance(5000).await;

    assert_eq!(service.poll_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn begin_submit_returns_before_the_service_answers() {
    let (service, mut client) = setup();
    service.accept_after(Duration::from_secs(10), "example_com");

    client.begin_submit("example.com").unwrap();

    let task = client.state();
    assert_eq!(task.status(), TaskStatus::Processing);
    assert_eq!(task.id(), None);
    assert!(client.is_submitting());

    advance(10_500).await;
    assert!(!client.is_submitting());
    assert_eq!(client.state().id(), Some(&TaskId::from("example_com")));
    assert!(client.is_polling());
}

#[tokio::test(start_paused = true)]
async fn reset_during_slow_submission_never_polls() {
    let (service, mut client) = setup();
    service.accept_after(Duration::from_secs(10), "example_com");

    client.begin_submit("example.com").unwrap();
    advance(100).await;
    client.reset();
    advance(15_000).await;

    assert_eq!(client.state(), analysis_tui::state::Task::idle());
    assert_eq!(service.poll_count(), 0);
    assert!(!client.is_polling());
    assert!(!client.is_submitting());
}
