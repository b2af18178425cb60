//! Durable suspension: approval requests, decisions, expiry, stale content.

use crate::in_memory::helpers::{fast_config, harness, Harness};
use chrono::Duration;
use herald::task::domain::{Task, TaskStatus, WorkflowStep};
use herald::task::ports::{ApprovalRepository, TaskRepository};
use herald::task::services::{Heartbeat, RunOutcome, WorkflowConfig, WorkflowError};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;

#[fixture]
fn wired() -> Harness {
    harness(fast_config())
}

/// Stores a task bound to an approval-demanding connector and runs it up to
/// the suspension point.
async fn suspend(h: &Harness) -> Task {
    let connector = h.email_connector(true);
    let task = h.email_task().with_connector(connector.id());
    h.tasks.store(&task).await.expect("store task");
    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should suspend");
    assert_eq!(outcome, RunOutcome::Suspended);
    task
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_gate_parks_the_task_with_a_pending_row(wired: Harness) {
    let task = suspend(&wired).await;

    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::PendingApproval);
    let approval = wired
        .approvals
        .find_pending_by_task(task.id())
        .await
        .expect("lookup")
        .expect("pending approval exists");
    assert!(approval.matches_content(stored.draft_content().expect("draft")));
    assert_eq!(wired.executor.calls(), 0);

    // Resuming while the window is open just re-parks.
    let outcome = wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("resume");
    assert_eq!(outcome, RunOutcome::Suspended);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_continues_through_to_evaluation(wired: Harness) {
    let task = suspend(&wired).await;

    let outcome = wired
        .workflow
        .handle_approval_decision(task.id(), "reviewer@acme.test", true)
        .await
        .expect("decision should apply");

    assert_eq!(outcome, RunOutcome::Evaluated);
    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Evaluated);
    assert_eq!(wired.executor.calls(), 1);
    let actions: Vec<String> = wired
        .audit
        .entries()
        .expect("audit trail")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert!(actions.contains(&"approval.requested".to_owned()));
    assert!(actions.contains(&"approval.granted".to_owned()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_cancels_the_task(wired: Harness) {
    let task = suspend(&wired).await;

    let outcome = wired
        .workflow
        .handle_approval_decision(task.id(), "reviewer@acme.test", false)
        .await
        .expect("decision should apply");

    assert_eq!(outcome, RunOutcome::Cancelled);
    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Cancelled);
    assert_eq!(stored.error_log()[0].step, WorkflowStep::Approval);
    assert_eq!(wired.executor.calls(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn auto_approval_skips_the_gate_but_leaves_a_record(wired: Harness) {
    let connector = wired.email_connector(false);
    let task = wired.email_task().with_connector(connector.id());
    wired.tasks.store(&task).await.expect("store task");

    let outcome = wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Evaluated);
    let actions: Vec<String> = wired
        .audit
        .entries()
        .expect("audit trail")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert!(actions.contains(&"approval.auto_granted".to_owned()));
    assert!(!actions.contains(&"approval.requested".to_owned()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_window_cancels_and_refuses_late_decisions() {
    let h = harness(WorkflowConfig {
        approval_timeout: Duration::zero(),
        metrics_delay: std::time::Duration::ZERO,
        ..WorkflowConfig::default()
    });
    let task = suspend(&h).await;

    let heartbeat = Heartbeat::new(
        Arc::new(h.tasks.clone()),
        Arc::new(h.approvals.clone()),
        h.workflow.clone(),
        Arc::new(DefaultClock),
    );
    let report = heartbeat.run_once().await.expect("sweep");

    assert_eq!(report.approvals_expired, 1);
    let stored = h
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Cancelled);
    assert_eq!(stored.error_log()[0].message, "approval window expired");

    // The reviewer shows up after the deadline; there is nothing to decide.
    let result = h
        .workflow
        .handle_approval_decision(task.id(), "reviewer@acme.test", true)
        .await;
    assert!(matches!(result, Err(WorkflowError::NoPendingApproval(id)) if id == task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn decision_on_the_deadline_is_refused() {
    let h = harness(WorkflowConfig {
        approval_timeout: Duration::zero(),
        metrics_delay: std::time::Duration::ZERO,
        ..WorkflowConfig::default()
    });
    let task = suspend(&h).await;

    // No sweep has run, but the window is already shut.
    let outcome = h
        .workflow
        .handle_approval_decision(task.id(), "reviewer@acme.test", true)
        .await
        .expect("decision should resolve");

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(h.executor.calls(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_content_invalidates_the_approval(wired: Harness) {
    let task = suspend(&wired).await;

    // The draft is edited out-of-band while the approval sits open.
    let mut stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    stored.set_draft(json!({ "body": "rewritten after review started" }), &DefaultClock);
    wired.tasks.update(&stored).await.expect("update task");

    let outcome = wired
        .workflow
        .handle_approval_decision(task.id(), "reviewer@acme.test", true)
        .await
        .expect("decision should resolve");

    assert_eq!(outcome, RunOutcome::Failed);
    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Failed);
    assert_eq!(wired.executor.calls(), 0);
    // The approval itself is dead; a fresh request would be needed.
    let resolved = wired
        .approvals
        .find_pending_by_task(task.id())
        .await
        .expect("lookup");
    assert!(resolved.is_none());
}
