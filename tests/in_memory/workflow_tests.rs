//! End-to-end workflow runs against in-memory adapters.

use crate::in_memory::helpers::{
    fast_config, harness, harness_with, Harness, ScriptedDrafter, ScriptedExecutor,
    ScriptedMetrics,
};
use chrono::{Duration, Utc};
use herald::policy::domain::{
    BannedPhraseRule, Policy, PolicyRule, PolicySeverity, RateLimitRule, RateWindow,
};
use herald::records::domain::CampaignId;
use herald::records::ports::RecordStore;
use herald::task::domain::{Task, TaskStatus, TaskType, WorkflowStep};
use herald::task::ports::TaskRepository;
use herald::task::services::RunOutcome;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn wired() -> Harness {
    harness(fast_config())
}

fn banned_guaranteed(h: &Harness, severity: PolicySeverity) -> Policy {
    Policy::new(
        h.organization.id(),
        "no hard guarantees",
        severity,
        PolicyRule::BannedPhrase(BannedPhraseRule {
            phrases: vec!["guaranteed".to_owned()],
            case_sensitive: false,
            whole_word: false,
            regex: false,
        }),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_runs_from_queued_to_evaluated(wired: Harness) {
    let connector = wired.email_connector(false);
    let task = wired.email_task().with_connector(connector.id());
    wired.tasks.store(&task).await.expect("store task");

    let outcome = wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Evaluated);
    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Evaluated);
    let result = stored.execution_result().expect("merged result");
    assert_eq!(result["deliveryId"], json!("dlv-1"));
    assert_eq!(result["opens"], json!(42));

    // Connector bookkeeping and outbound surfaces.
    let connector = wired
        .records
        .find_connector(connector.id())
        .await
        .expect("lookup")
        .expect("connector exists");
    assert!(connector.last_used_at().is_some());
    assert_eq!(wired.events.emitted().len(), 1);
    let actions: Vec<String> = wired
        .audit
        .entries()
        .expect("audit trail")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert!(actions.contains(&"task.executed".to_owned()));
    assert!(actions.contains(&"task.evaluated".to_owned()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rerunning_a_finished_task_is_a_no_op(wired: Harness) {
    let connector = wired.email_connector(false);
    let task = wired.email_task().with_connector(connector.id());
    wired.tasks.store(&task).await.expect("store task");
    wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("first run");

    let outcome = wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("second run");

    assert_eq!(outcome, RunOutcome::Skipped);
    assert_eq!(wired.executor.calls(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dry_run_never_reaches_the_executor(wired: Harness) {
    let connector = wired.email_connector(false);
    let task = wired
        .email_task()
        .with_connector(connector.id())
        .with_dry_run();
    wired.tasks.store(&task).await.expect("store task");

    let outcome = wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(wired.executor.calls(), 0);
    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Completed);
    let result = stored.execution_result().expect("dry run result");
    assert_eq!(result["dryRun"], json!(true));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pre_draft_block_cancels_before_drafting(wired: Harness) {
    wired.policies.insert(Policy::new(
        wired.organization.id(),
        "send freeze",
        PolicySeverity::Block,
        PolicyRule::RateLimit(RateLimitRule {
            limit: 0,
            window: RateWindow::Day,
            scope: None,
            task_types: None,
        }),
    ));
    let task = wired.email_task();
    wired.tasks.store(&task).await.expect("store task");

    let outcome = wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(wired.drafter.calls(), 0);
    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Cancelled);
    assert_eq!(
        stored.error_log()[0].step,
        WorkflowStep::PreDraftValidation
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn content_block_fails_a_connector_task() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(json!({ "body": "guaranteed to double your sales" })),
        ScriptedExecutor::new(),
        ScriptedMetrics::new(),
    );
    h.policies.insert(banned_guaranteed(&h, PolicySeverity::Block));
    let connector = h.email_connector(false);
    let task = h.email_task().with_connector(connector.id());
    h.tasks.store(&task).await.expect("store task");

    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Failed);
    let stored = h
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Failed);
    assert_eq!(
        stored.error_log()[0].step,
        WorkflowStep::ContentValidation
    );
    // The draft survives for inspection.
    assert!(stored.draft_content().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn content_block_without_a_connector_is_content_blocked() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(json!({ "body": "guaranteed to double your sales" })),
        ScriptedExecutor::new(),
        ScriptedMetrics::new(),
    );
    h.policies.insert(banned_guaranteed(&h, PolicySeverity::Block));
    let task = h.email_task();
    h.tasks.store(&task).await.expect("store task");

    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::ContentBlocked);
    let stored = h
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::ContentBlocked);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn warn_severity_violations_do_not_stop_the_run() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(json!({ "body": "guaranteed to double your sales" })),
        ScriptedExecutor::new(),
        ScriptedMetrics::new(),
    );
    h.policies.insert(banned_guaranteed(&h, PolicySeverity::Warn));
    let connector = h.email_connector(false);
    let task = h.email_task().with_connector(connector.id());
    h.tasks.store(&task).await.expect("store task");

    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Evaluated);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transient_draft_failures_are_retried() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(json!({ "body": "spring savings" })).fail_times(2),
        ScriptedExecutor::new(),
        ScriptedMetrics::new(),
    );
    let connector = h.email_connector(false);
    let task = h.email_task().with_connector(connector.id());
    h.tasks.store(&task).await.expect("store task");

    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Evaluated);
    assert_eq!(h.drafter.calls(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exhausted_draft_attempts_fail_the_task() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(json!({ "body": "spring savings" })).fail_times(3),
        ScriptedExecutor::new(),
        ScriptedMetrics::new(),
    );
    let task = h.email_task();
    h.tasks.store(&task).await.expect("store task");

    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Failed);
    let stored = h
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.error_log()[0].step, WorkflowStep::Drafting);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execution_failure_is_recorded_on_task_and_connector() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(json!({ "body": "spring savings" })),
        ScriptedExecutor::new().fail_times(3),
        ScriptedMetrics::new(),
    );
    let connector = h.email_connector(false);
    let task = h.email_task().with_connector(connector.id());
    h.tasks.store(&task).await.expect("store task");

    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Failed);
    assert_eq!(h.executor.calls(), 3);
    let stored = h
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Failed);
    assert_eq!(stored.error_log()[0].step, WorkflowStep::Execution);
    let connector = h
        .records
        .find_connector(connector.id())
        .await
        .expect("lookup")
        .expect("connector exists");
    assert_eq!(connector.last_error(), Some("channel execution failed: downstream 503"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_failure_keeps_the_task_completed_for_a_later_retry() {
    let h = harness_with(
        fast_config(),
        ScriptedDrafter::new(json!({ "body": "spring savings" })),
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
        .expect("run should succeed");
    assert_eq!(outcome, RunOutcome::Completed);
    let stored = h
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Completed);

    // A later resume picks up from `completed` and finishes the job.
    let outcome = h
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("resume should succeed");
    assert_eq!(outcome, RunOutcome::Evaluated);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_with_a_vanished_campaign_fails_instead_of_sticking(wired: Harness) {
    let orphan = Task::new(
        CampaignId::new(),
        TaskType::SingleEmail,
        "Orphaned promo",
        Utc::now() - Duration::hours(1),
        &DefaultClock,
    )
    .expect("valid task title");
    wired.tasks.store(&orphan).await.expect("store task");

    let outcome = wired
        .workflow
        .handle_task_queued(orphan.id())
        .await
        .expect("backstop should resolve the run");

    assert_eq!(outcome, RunOutcome::Failed);
    let stored = wired
        .tasks
        .find_by_id(orphan.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Failed);
    assert_eq!(
        stored.error_log()[0].step,
        WorkflowStep::PreDraftValidation
    );
    assert!(stored.error_log()[0].message.contains("campaign not found"));
    let actions: Vec<String> = wired
        .audit
        .entries()
        .expect("audit trail")
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert!(actions.contains(&"task.failed".to_owned()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connectorless_task_completes_and_evaluates_without_delivery(wired: Harness) {
    let task = wired.email_task();
    wired.tasks.store(&task).await.expect("store task");

    let outcome = wired
        .workflow
        .handle_task_queued(task.id())
        .await
        .expect("run should succeed");

    assert_eq!(outcome, RunOutcome::Evaluated);
    assert_eq!(wired.executor.calls(), 0);
    let stored = wired
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    let result = stored.execution_result().expect("result");
    assert_eq!(result["delivered"], json!(false));
}
