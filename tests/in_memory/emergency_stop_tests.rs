//! Organization-wide emergency stop.

use crate::in_memory::helpers::{
    fast_config, harness, harness_with, Harness, ScriptedDrafter, ScriptedExecutor,
    ScriptedMetrics,
};
use herald::records::domain::{Campaign, CampaignStatus};
use herald::records::ports::RecordStore;
use herald::task::domain::{Task, TaskStatus, TaskType};
use herald::task::ports::TaskRepository;
use herald::task::services::{EmergencyStop, RunOutcome, WorkflowError};
use chrono::{Duration, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn wired() -> Harness {
    harness(fast_config())
}

fn stopper(h: &Harness) -> EmergencyStop<DefaultClock> {
    EmergencyStop::new(
        Arc::new(h.records.clone()),
        Arc::new(h.tasks.clone()),
        Arc::new(h.audit.clone()),
        Arc::new(DefaultClock),
    )
}

fn queued_task(h: &Harness, campaign: &Campaign, title: &str) -> Task {
    Task::new(
        campaign.id(),
        TaskType::SingleEmail,
        title,
        Utc::now() - Duration::minutes(5),
        &DefaultClock,
    )
    .expect("valid task title")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_pauses_campaigns_and_cancels_in_flight_tasks(wired: Harness) {
    // A second campaign that already ran its course.
    let mut finished_campaign =
        Campaign::new(wired.organization.id(), None, "Winter wrap-up");
    finished_campaign.set_status(CampaignStatus::Completed);
    wired.records.insert_campaign(finished_campaign.clone());

    // One task already delivered, one still queued, one parked for approval.
    let connector = wired.email_connector(false);
    let delivered = wired.email_task().with_connector(connector.id());
    wired.tasks.store(&delivered).await.expect("store task");
    let outcome = wired
        .workflow
        .handle_task_queued(delivered.id())
        .await
        .expect("run to evaluation");
    assert_eq!(outcome, RunOutcome::Evaluated);

    let queued = queued_task(&wired, &wired.campaign, "Queued promo");
    wired.tasks.store(&queued).await.expect("store task");

    let gated = wired.email_connector(true);
    let parked = wired.email_task().with_connector(gated.id());
    wired.tasks.store(&parked).await.expect("store task");
    let outcome = wired
        .workflow
        .handle_task_queued(parked.id())
        .await
        .expect("run to suspension");
    assert_eq!(outcome, RunOutcome::Suspended);

    let report = stopper(&wired)
        .stop_organization(wired.organization.id(), "oncall@acme.test")
        .await
        .expect("stop");

    assert_eq!(report.campaigns_paused, 1);
    assert_eq!(report.tasks_cancelled, 2);

    let organization = wired
        .records
        .find_organization(wired.organization.id())
        .await
        .expect("lookup")
        .expect("organization exists");
    assert!(organization.is_sandboxed());

    let spring = wired
        .records
        .find_campaign(wired.campaign.id())
        .await
        .expect("lookup")
        .expect("campaign exists");
    assert_eq!(spring.status(), CampaignStatus::Paused);
    let winter = wired
        .records
        .find_campaign(finished_campaign.id())
        .await
        .expect("lookup")
        .expect("campaign exists");
    assert_eq!(winter.status(), CampaignStatus::Completed);

    for (id, expected) in [
        (delivered.id(), TaskStatus::Evaluated),
        (queued.id(), TaskStatus::Cancelled),
        (parked.id(), TaskStatus::Cancelled),
    ] {
        let task = wired
            .tasks
            .find_by_id(id)
            .await
            .expect("lookup")
            .expect("task exists");
        assert_eq!(task.status(), expected);
    }

    let actions: Vec<String> = wired
        .audit
        .entries()
        .expect("audit trail")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert!(actions.contains(&"organization.emergency_stop".to_owned()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delivered_task_awaiting_metrics_survives_the_stop() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(serde_json::json!({ "body": "spring savings" })),
        ScriptedExecutor::new(),
        ScriptedMetrics::new().fail_times(3),
    );
    let connector = h.email_connector(false);
    let task = h.email_task().with_connector(connector.id());
    h.tasks.store(&task).await.expect("store task");
    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run to delivery");
    assert_eq!(outcome, RunOutcome::Completed);

    let report = stopper(&h)
        .stop_organization(h.organization.id(), "oncall@acme.test")
        .await
        .expect("stop");

    // The content is already out; cancelling would only discard metrics.
    assert_eq!(report.tasks_cancelled, 0);
    let stored = h
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Completed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_stop_finds_nothing_left(wired: Harness) {
    let queued = queued_task(&wired, &wired.campaign, "Queued promo");
    wired.tasks.store(&queued).await.expect("store task");
    let stop = stopper(&wired);
    stop.stop_organization(wired.organization.id(), "oncall@acme.test")
        .await
        .expect("first stop");

    let report = stop
        .stop_organization(wired.organization.id(), "oncall@acme.test")
        .await
        .expect("second stop");

    assert_eq!(report.campaigns_paused, 0);
    assert_eq!(report.tasks_cancelled, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_for_an_unknown_organization_is_refused(wired: Harness) {
    let ghost = herald::records::domain::OrganizationId::new();

    let result = stopper(&wired)
        .stop_organization(ghost, "oncall@acme.test")
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::OrganizationNotFound(id)) if id == ghost
    ));
}
