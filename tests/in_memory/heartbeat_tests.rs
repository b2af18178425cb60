//! Heartbeat sweeps: due-task pickup and crash recovery.

use crate::in_memory::helpers::{fast_config, harness, Harness};
use chrono::{Duration, Utc};
use herald::task::domain::{Task, TaskStatus, TaskType};
use herald::task::ports::TaskRepository;
use herald::task::services::Heartbeat;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn wired() -> Harness {
    harness(fast_config())
}

fn heartbeat(h: &Harness) -> Heartbeat<DefaultClock> {
    Heartbeat::new(
        Arc::new(h.tasks.clone()),
        Arc::new(h.approvals.clone()),
        h.workflow.clone(),
        Arc::new(DefaultClock),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_runs_due_tasks_and_leaves_future_ones(wired: Harness) {
    let connector = wired.email_connector(false);
    let due = wired.email_task().with_connector(connector.id());
    let future = Task::new(
        wired.campaign.id(),
        TaskType::SingleEmail,
        "Autumn promo",
        Utc::now() + Duration::hours(6),
        &DefaultClock,
    )
    .expect("valid task title")
    .with_connector(connector.id());
    wired.tasks.store(&due).await.expect("store due task");
    wired.tasks.store(&future).await.expect("store future task");

    let report = heartbeat(&wired).run_once().await.expect("sweep");

    assert_eq!(report.tasks_resumed, 1);
    assert_eq!(report.approvals_expired, 0);
    let due = wired
        .tasks
        .find_by_id(due.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(due.status(), TaskStatus::Evaluated);
    let future = wired
        .tasks
        .find_by_id(future.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(future.status(), TaskStatus::Queued);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_over_nothing_reports_zeros(wired: Harness) {
    let report = heartbeat(&wired).run_once().await.expect("sweep");

    assert_eq!(report.approvals_expired, 0);
    assert_eq!(report.tasks_resumed, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn broken_task_fails_once_instead_of_haunting_every_sweep(wired: Harness) {
    let orphan = Task::new(
        herald::records::domain::CampaignId::new(),
        TaskType::SingleEmail,
        "Orphaned promo",
        Utc::now() - Duration::hours(1),
        &DefaultClock,
    )
    .expect("valid task title");
    wired.tasks.store(&orphan).await.expect("store task");
    let sweeper = heartbeat(&wired);

    let report = sweeper.run_once().await.expect("first sweep");
    assert_eq!(report.tasks_resumed, 1);
    let stored = wired
        .tasks
        .find_by_id(orphan.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Failed);

    let report = sweeper.run_once().await.expect("second sweep");
    assert_eq!(report.tasks_resumed, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_is_idempotent_over_finished_work(wired: Harness) {
    let connector = wired.email_connector(false);
    let task = wired.email_task().with_connector(connector.id());
    wired.tasks.store(&task).await.expect("store task");
    let sweeper = heartbeat(&wired);
    sweeper.run_once().await.expect("first sweep");

    let report = sweeper.run_once().await.expect("second sweep");

    assert_eq!(report.tasks_resumed, 0);
    assert_eq!(wired.executor.calls(), 1);
}
