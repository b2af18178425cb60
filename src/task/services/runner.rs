//! The task workflow runner: drives a task from queued to evaluated.
//!
//! The runner is resumable by construction. Every status transition is
//! persisted before the next step starts, and [`TaskWorkflow::handle_task_queued`]
//! dispatches on the stored status, so a crashed or suspended run picks up
//! where the store says it stopped. Suspension for approval is durable state
//! (a pending approval row plus the `pending_approval` status), not a held
//! future.

use crate::policy::domain::{Checkpoint, ValidationOutcome};
use crate::policy::engine::{PolicyEngine, ValidationFault};
use crate::policy::ports::{ActivityScope, ActivityStore, ActivityStoreError};
use crate::records::domain::{Connector, ConnectorId, OrganizationId};
use crate::records::ports::{RecordStore, RecordStoreError};
use crate::task::domain::{
    Approval, Task, TaskDomainError, TaskId, TaskStatus, WorkflowStep,
};
use crate::task::ports::{
    ApprovalRepository, ApprovalRepositoryError, AuditEntry, AuditSink, ChannelExecutor,
    ContentDrafter, EventSink, MetricsCollector, TaskRepository, TaskRepositoryError,
};
use crate::task::services::WorkflowConfig;
use chrono::Duration;
use mockable::Clock;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// How a single workflow run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Parked in `pending_approval`; a later signal or expiry continues it.
    Suspended,
    /// Delivered (or dry-ran); metrics still outstanding.
    Completed,
    /// Fully done, metrics merged.
    Evaluated,
    /// Stopped by a policy block, rejection, timeout, or emergency stop.
    Cancelled,
    /// Stopped by a step failure.
    Failed,
    /// Blocked by content validation with nothing to deliver through.
    ContentBlocked,
    /// The stored status had nothing for this run to do.
    Skipped,
}

/// Errors that abort a workflow run without a verdict on the task.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The organization was not found.
    #[error("organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    /// The task references a connector that does not exist.
    #[error("connector not found: {0}")]
    ConnectorNotFound(ConnectorId),

    /// An approval signal arrived for a task with no pending approval.
    #[error("no pending approval for task: {0}")]
    NoPendingApproval(TaskId),

    /// A domain invariant was violated.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Task persistence failed.
    #[error(transparent)]
    TaskStore(#[from] TaskRepositoryError),

    /// Approval persistence failed.
    #[error(transparent)]
    ApprovalStore(#[from] ApprovalRepositoryError),

    /// Reference-data lookup failed.
    #[error(transparent)]
    Records(#[from] RecordStoreError),

    /// Activity aggregate read failed.
    #[error(transparent)]
    Activity(#[from] ActivityStoreError),

    /// Policy validation itself failed.
    #[error(transparent)]
    Validation(#[from] ValidationFault),
}

/// Collaborators wired into a [`TaskWorkflow`].
pub struct TaskWorkflowParams<C> {
    /// Task persistence.
    pub tasks: Arc<dyn TaskRepository>,
    /// Approval persistence.
    pub approvals: Arc<dyn ApprovalRepository>,
    /// Reference-data store.
    pub records: Arc<dyn RecordStore>,
    /// Aggregate activity reads for connector rate caps.
    pub activity: Arc<dyn ActivityStore>,
    /// Policy validation engine.
    pub engine: Arc<PolicyEngine<C>>,
    /// Content generation.
    pub drafter: Arc<dyn ContentDrafter>,
    /// Channel delivery.
    pub executor: Arc<dyn ChannelExecutor>,
    /// Post-delivery metrics.
    pub metrics: Arc<dyn MetricsCollector>,
    /// Audit trail.
    pub audit: Arc<dyn AuditSink>,
    /// Outbound notifications.
    pub events: Arc<dyn EventSink>,
    /// Time source.
    pub clock: Arc<C>,
}

/// Drives tasks through the workflow state machine.
pub struct TaskWorkflow<C> {
    tasks: Arc<dyn TaskRepository>,
    approvals: Arc<dyn ApprovalRepository>,
    records: Arc<dyn RecordStore>,
    activity: Arc<dyn ActivityStore>,
    engine: Arc<PolicyEngine<C>>,
    drafter: Arc<dyn ContentDrafter>,
    executor: Arc<dyn ChannelExecutor>,
    metrics: Arc<dyn MetricsCollector>,
    audit: Arc<dyn AuditSink>,
    events: Arc<dyn EventSink>,
    clock: Arc<C>,
    config: WorkflowConfig,
}

impl<C> TaskWorkflow<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a workflow over the given collaborators.
    #[must_use]
    pub fn new(params: TaskWorkflowParams<C>, config: WorkflowConfig) -> Self {
        Self {
            tasks: params.tasks,
            approvals: params.approvals,
            records: params.records,
            activity: params.activity,
            engine: params.engine,
            drafter: params.drafter,
            executor: params.executor,
            metrics: params.metrics,
            audit: params.audit,
            events: params.events,
            clock: params.clock,
            config,
        }
    }

    /// Runs (or resumes) the workflow for one task.
    ///
    /// Idempotent with respect to the stored status: re-invoking for a task
    /// that is mid-flight or terminal does nothing destructive.
    ///
    /// Unhandled run errors (a vanished campaign or connector, a validation
    /// fault, a domain invariant breach) are caught by a backstop that marks
    /// the task failed rather than leaving it stuck for every later sweep to
    /// retry.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] when the task does not exist,
    /// or the original error when even the backstop cannot persist the
    /// failure.
    pub async fn handle_task_queued(&self, task_id: TaskId) -> Result<RunOutcome, WorkflowError> {
        let mut task = self.require_task(task_id).await?;
        let result = match task.status() {
            TaskStatus::Queued => self.advance_from_queued(&mut task).await,
            TaskStatus::Drafting => self.advance_from_drafting(&mut task).await,
            TaskStatus::PendingApproval => self.resume_pending_approval(&mut task).await,
            TaskStatus::Approved => self.advance_from_approved(&mut task).await,
            TaskStatus::Completed => self.collect_metrics(&mut task).await,
            TaskStatus::Executing
            | TaskStatus::Evaluated
            | TaskStatus::Cancelled
            | TaskStatus::Failed
            | TaskStatus::ContentBlocked => Ok(RunOutcome::Skipped),
        };
        match result {
            Err(error) => self.fail_unrecoverable(task_id, error).await,
            outcome => outcome,
        }
    }

    /// Backstop for errors no step handler caught: reloads the task (its
    /// in-run copy may hold unpersisted mutations), records the error under
    /// the step implied by its stored status, and marks it failed.
    async fn fail_unrecoverable(
        &self,
        task_id: TaskId,
        error: WorkflowError,
    ) -> Result<RunOutcome, WorkflowError> {
        tracing::error!(task_id = %task_id, %error, "workflow run failed; failing task");
        let Ok(Some(mut task)) = self.tasks.find_by_id(task_id).await else {
            return Err(error);
        };
        if task.status().is_terminal() {
            return Err(error);
        }
        let step = step_for_status(task.status());
        let message = error.to_string();
        task.record_error(step, &message, &*self.clock);
        if task.fail(&*self.clock).is_err() || self.tasks.update(&task).await.is_err() {
            return Err(error);
        }
        self.audit(
            Some(task_id),
            None,
            "task.failed",
            json!({ "step": step, "message": message }),
        )
        .await;
        Ok(RunOutcome::Failed)
    }

    /// Applies a human approval decision to a suspended task and, on
    /// approval, continues the workflow through execution.
    ///
    /// Expiry wins races: a decision arriving after the deadline (or after
    /// the heartbeat already expired the approval) is refused, and a decision
    /// for content that changed since the request is refused too.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoPendingApproval`] when no pending approval
    /// exists for the task.
    pub async fn handle_approval_decision(
        &self,
        task_id: TaskId,
        approver_id: &str,
        approved: bool,
    ) -> Result<RunOutcome, WorkflowError> {
        let mut task = self.require_task(task_id).await?;
        let mut approval = self
            .approvals
            .find_pending_by_task(task_id)
            .await?
            .ok_or(WorkflowError::NoPendingApproval(task_id))?;

        let now = self.clock.utc();
        if approval.is_expired_at(now) {
            approval.expire(&*self.clock)?;
            self.approvals.update(&approval).await?;
            task.record_error(WorkflowStep::Approval, "approval window expired", &*self.clock);
            task.cancel(&*self.clock)?;
            self.tasks.update(&task).await?;
            self.audit(
                Some(task_id),
                Some(approver_id),
                "approval.expired",
                json!({ "approvalId": approval.id(), "decisionIgnored": approved }),
            )
            .await;
            return Ok(RunOutcome::Cancelled);
        }

        let content_matches = task
            .draft_content()
            .is_some_and(|draft| approval.matches_content(draft));
        if !content_matches {
            approval.expire(&*self.clock)?;
            self.approvals.update(&approval).await?;
            task.record_error(
                WorkflowStep::Approval,
                "content changed since approval was requested",
                &*self.clock,
            );
            task.fail(&*self.clock)?;
            self.tasks.update(&task).await?;
            self.audit(
                Some(task_id),
                Some(approver_id),
                "approval.content_mismatch",
                json!({ "approvalId": approval.id() }),
            )
            .await;
            return Ok(RunOutcome::Failed);
        }

        if approved {
            approval.approve(approver_id, &*self.clock)?;
            self.approvals.update(&approval).await?;
            task.approve(&*self.clock)?;
            self.tasks.update(&task).await?;
            self.audit(
                Some(task_id),
                Some(approver_id),
                "approval.granted",
                json!({ "approvalId": approval.id() }),
            )
            .await;
            match self.advance_from_approved(&mut task).await {
                Err(error) => self.fail_unrecoverable(task_id, error).await,
                outcome => outcome,
            }
        } else {
            approval.reject(approver_id, &*self.clock)?;
            self.approvals.update(&approval).await?;
            task.record_error(
                WorkflowStep::Approval,
                format!("rejected by {approver_id}"),
                &*self.clock,
            );
            task.cancel(&*self.clock)?;
            self.tasks.update(&task).await?;
            self.audit(
                Some(task_id),
                Some(approver_id),
                "approval.rejected",
                json!({ "approvalId": approval.id() }),
            )
            .await;
            Ok(RunOutcome::Cancelled)
        }
    }

    async fn advance_from_queued(&self, task: &mut Task) -> Result<RunOutcome, WorkflowError> {
        let outcome = self.validate(task, Checkpoint::PreDraft).await?;
        if !outcome.allowed {
            return self
                .cancel_for_policy(task, WorkflowStep::PreDraftValidation, &outcome)
                .await;
        }
        task.begin_drafting(&*self.clock)?;
        self.tasks.update(task).await?;
        self.advance_from_drafting(task).await
    }

    async fn advance_from_drafting(&self, task: &mut Task) -> Result<RunOutcome, WorkflowError> {
        if task.draft_content().is_none() {
            let mut last_error = String::new();
            let mut drafted = None;
            for attempt in 1..=self.config.max_step_attempts {
                match self.drafter.draft(task).await {
                    Ok(content) => {
                        drafted = Some(content);
                        break;
                    }
                    Err(error) => {
                        tracing::warn!(task_id = %task.id(), attempt, %error, "draft attempt failed");
                        last_error = error.to_string();
                    }
                }
            }
            let Some(content) = drafted else {
                return self
                    .fail_step(task, WorkflowStep::Drafting, &last_error)
                    .await;
            };
            task.set_draft(content, &*self.clock);
            self.tasks.update(task).await?;
        }

        let outcome = self.validate(task, Checkpoint::Content).await?;
        if !outcome.allowed {
            let summary = policy_summary(&outcome);
            task.record_error(WorkflowStep::ContentValidation, &summary, &*self.clock);
            // With no connector there is nothing to deliver through; the
            // blocked draft is kept for inspection. Otherwise a blocked draft
            // is a production failure.
            let run_outcome = if task.connector_id().is_none() {
                task.block_content(&*self.clock)?;
                RunOutcome::ContentBlocked
            } else {
                task.fail(&*self.clock)?;
                RunOutcome::Failed
            };
            self.tasks.update(task).await?;
            self.audit(
                Some(task.id()),
                None,
                "task.content_blocked",
                json!({ "feedback": outcome.feedback, "violations": outcome.violations }),
            )
            .await;
            return Ok(run_outcome);
        }

        self.resolve_approval_gate(task).await
    }

    /// Decides whether the drafted content needs human sign-off.
    ///
    /// Approval is required exactly when the task's connector demands it for
    /// this task type; a task with no connector is auto-approved.
    async fn resolve_approval_gate(&self, task: &mut Task) -> Result<RunOutcome, WorkflowError> {
        let needs_approval = match task.connector_id() {
            Some(connector_id) => {
                let connector = self.require_connector(connector_id).await?;
                connector.approval_required_for(task.task_type())
            }
            None => false,
        };
        let Some(draft) = task.draft_content().cloned() else {
            return Err(TaskDomainError::NoDraftContent(task.id()).into());
        };

        if needs_approval {
            let expires_at = self.clock.utc() + self.config.approval_timeout;
            let approval = Approval::new_pending(task.id(), draft, expires_at, &*self.clock);
            self.approvals.store(&approval).await?;
            task.await_approval(&*self.clock)?;
            self.tasks.update(task).await?;
            self.audit(
                Some(task.id()),
                None,
                "approval.requested",
                json!({ "approvalId": approval.id(), "expiresAt": expires_at }),
            )
            .await;
            Ok(RunOutcome::Suspended)
        } else {
            let approval = Approval::new_auto_approved(task.id(), draft, &*self.clock);
            self.approvals.store(&approval).await?;
            task.approve(&*self.clock)?;
            self.tasks.update(task).await?;
            self.audit(
                Some(task.id()),
                None,
                "approval.auto_granted",
                json!({ "approvalId": approval.id() }),
            )
            .await;
            self.advance_from_approved(task).await
        }
    }

    async fn resume_pending_approval(&self, task: &mut Task) -> Result<RunOutcome, WorkflowError> {
        let Some(approval) = self.approvals.find_pending_by_task(task.id()).await? else {
            // The pending row is gone but the task never moved on; nothing
            // can resolve it now.
            task.record_error(
                WorkflowStep::Approval,
                "pending approval record is missing",
                &*self.clock,
            );
            task.fail(&*self.clock)?;
            self.tasks.update(task).await?;
            return Ok(RunOutcome::Failed);
        };
        if approval.is_expired_at(self.clock.utc()) {
            let mut approval = approval;
            approval.expire(&*self.clock)?;
            self.approvals.update(&approval).await?;
            task.record_error(WorkflowStep::Approval, "approval window expired", &*self.clock);
            task.cancel(&*self.clock)?;
            self.tasks.update(task).await?;
            self.audit(
                Some(task.id()),
                None,
                "approval.expired",
                json!({ "approvalId": approval.id() }),
            )
            .await;
            return Ok(RunOutcome::Cancelled);
        }
        Ok(RunOutcome::Suspended)
    }

    async fn advance_from_approved(&self, task: &mut Task) -> Result<RunOutcome, WorkflowError> {
        let outcome = self.validate(task, Checkpoint::PreExecute).await?;
        if !outcome.allowed {
            return self
                .cancel_for_policy(task, WorkflowStep::PreExecuteValidation, &outcome)
                .await;
        }

        if task.is_dry_run() {
            task.complete(json!({ "dryRun": true, "delivered": false }), &*self.clock)?;
            self.tasks.update(task).await?;
            self.audit(Some(task.id()), None, "task.dry_run_completed", Value::Null)
                .await;
            return Ok(RunOutcome::Completed);
        }

        let Some(connector_id) = task.connector_id() else {
            // Content-only task: the final content itself is the deliverable.
            task.complete(json!({ "delivered": false }), &*self.clock)?;
            self.tasks.update(task).await?;
            return self.collect_metrics(task).await;
        };

        let mut connector = self.require_connector(connector_id).await?;
        if let Some(reason) = self.connector_over_capacity(&connector).await? {
            return self.fail_step(task, WorkflowStep::Execution, &reason).await;
        }

        task.begin_execution(&*self.clock)?;
        self.tasks.update(task).await?;

        let mut last_error = String::new();
        let mut result = None;
        for attempt in 1..=self.config.max_step_attempts {
            match self.executor.execute(task, &connector).await {
                Ok(value) => {
                    result = Some(value);
                    break;
                }
                Err(error) => {
                    tracing::warn!(task_id = %task.id(), attempt, %error, "execution attempt failed");
                    last_error = error.to_string();
                }
            }
        }
        let Some(result) = result else {
            connector.record_error(&last_error);
            self.records.update_connector(&connector).await?;
            return self
                .fail_step(task, WorkflowStep::Execution, &last_error)
                .await;
        };

        connector.mark_used(&*self.clock);
        self.records.update_connector(&connector).await?;
        task.complete(result, &*self.clock)?;
        self.tasks.update(task).await?;
        self.audit(
            Some(task.id()),
            None,
            "task.executed",
            json!({ "connectorId": connector.id() }),
        )
        .await;

        self.collect_metrics(task).await
    }

    async fn collect_metrics(&self, task: &mut Task) -> Result<RunOutcome, WorkflowError> {
        if task.is_dry_run() {
            return Ok(RunOutcome::Skipped);
        }
        tokio::time::sleep(self.config.metrics_delay).await;

        let mut last_error = String::new();
        let mut collected = None;
        for attempt in 1..=self.config.max_step_attempts {
            match self.metrics.collect(task).await {
                Ok(value) => {
                    collected = Some(value);
                    break;
                }
                Err(error) => {
                    tracing::warn!(task_id = %task.id(), attempt, %error, "metrics attempt failed");
                    last_error = error.to_string();
                }
            }
        }
        let Some(metrics) = collected else {
            // The delivery already happened; keep the task completed so a
            // later resume retries collection.
            task.record_error(WorkflowStep::MetricsCollection, &last_error, &*self.clock);
            self.tasks.update(task).await?;
            return Ok(RunOutcome::Completed);
        };

        task.record_evaluation(metrics.clone(), &*self.clock)?;
        self.tasks.update(task).await?;
        if let Err(error) = self.events.metrics_collected(task, &metrics).await {
            tracing::warn!(task_id = %task.id(), %error, "metrics event dropped");
        }
        self.audit(Some(task.id()), None, "task.evaluated", Value::Null)
            .await;
        Ok(RunOutcome::Evaluated)
    }

    async fn validate(
        &self,
        task: &Task,
        checkpoint: Checkpoint,
    ) -> Result<ValidationOutcome, WorkflowError> {
        let outcome = self.engine.validate(task, checkpoint).await?;
        if outcome.has_escalations() {
            tracing::warn!(
                task_id = %task.id(),
                checkpoint = %checkpoint,
                "policy violations escalated for review",
            );
            self.audit(
                Some(task.id()),
                None,
                "validation.escalated",
                json!({ "checkpoint": checkpoint, "violations": outcome.violations }),
            )
            .await;
        }
        Ok(outcome)
    }

    async fn cancel_for_policy(
        &self,
        task: &mut Task,
        step: WorkflowStep,
        outcome: &ValidationOutcome,
    ) -> Result<RunOutcome, WorkflowError> {
        task.record_error(step, policy_summary(outcome), &*self.clock);
        task.cancel(&*self.clock)?;
        self.tasks.update(task).await?;
        self.audit(
            Some(task.id()),
            None,
            "task.cancelled",
            json!({
                "step": step,
                "blockedBy": outcome.blocking_policy_names(),
                "feedback": outcome.feedback,
            }),
        )
        .await;
        Ok(RunOutcome::Cancelled)
    }

    async fn fail_step(
        &self,
        task: &mut Task,
        step: WorkflowStep,
        message: &str,
    ) -> Result<RunOutcome, WorkflowError> {
        task.record_error(step, message, &*self.clock);
        task.fail(&*self.clock)?;
        self.tasks.update(task).await?;
        self.audit(
            Some(task.id()),
            None,
            "task.failed",
            json!({ "step": step, "message": message }),
        )
        .await;
        Ok(RunOutcome::Failed)
    }

    /// Checks the connector's own hourly and daily execution caps.
    async fn connector_over_capacity(
        &self,
        connector: &Connector,
    ) -> Result<Option<String>, WorkflowError> {
        let limits = connector.rate_limits();
        let now = self.clock.utc();
        let scope = ActivityScope::Connector(connector.id());
        if let Some(per_hour) = limits.per_hour {
            let count = self
                .activity
                .completed_task_count(scope, Some(now - Duration::hours(1)), None)
                .await?;
            if count >= u64::from(per_hour) {
                return Ok(Some(format!(
                    "connector hourly rate limit reached ({count}/{per_hour})"
                )));
            }
        }
        if let Some(per_day) = limits.per_day {
            let count = self
                .activity
                .completed_task_count(scope, Some(now - Duration::days(1)), None)
                .await?;
            if count >= u64::from(per_day) {
                return Ok(Some(format!(
                    "connector daily rate limit reached ({count}/{per_day})"
                )));
            }
        }
        Ok(None)
    }

    async fn require_task(&self, task_id: TaskId) -> Result<Task, WorkflowError> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(task_id))
    }

    async fn require_connector(
        &self,
        connector_id: ConnectorId,
    ) -> Result<Connector, WorkflowError> {
        self.records
            .find_connector(connector_id)
            .await?
            .ok_or(WorkflowError::ConnectorNotFound(connector_id))
    }

    pub(super) async fn audit(
        &self,
        task_id: Option<TaskId>,
        actor: Option<&str>,
        action: &str,
        details: Value,
    ) {
        let entry = AuditEntry {
            task_id,
            actor: actor.map(str::to_owned),
            action: action.to_owned(),
            details,
            at: self.clock.utc(),
        };
        if let Err(error) = self.audit.record(entry).await {
            tracing::warn!(%error, action, "audit entry dropped");
        }
    }
}

/// Maps a stored status to the step a run over it was performing when an
/// unhandled error surfaced. Terminal statuses never reach the backstop.
const fn step_for_status(status: TaskStatus) -> WorkflowStep {
    match status {
        TaskStatus::Queued => WorkflowStep::PreDraftValidation,
        TaskStatus::Drafting => WorkflowStep::ContentValidation,
        TaskStatus::PendingApproval => WorkflowStep::Approval,
        TaskStatus::Approved => WorkflowStep::PreExecuteValidation,
        TaskStatus::Executing => WorkflowStep::Execution,
        TaskStatus::Completed
        | TaskStatus::Evaluated
        | TaskStatus::Cancelled
        | TaskStatus::Failed
        | TaskStatus::ContentBlocked => WorkflowStep::MetricsCollection,
    }
}

/// Summarizes a denied validation for the task's error log.
fn policy_summary(outcome: &ValidationOutcome) -> String {
    outcome.feedback.clone().unwrap_or_else(|| {
        format!("blocked by policy: {}", outcome.blocking_policy_names().join(", "))
    })
}
