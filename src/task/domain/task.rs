//! Task aggregate root and workflow state machine.

use super::{ParseTaskStatusError, TaskDomainError, TaskId, TaskType};
use crate::records::domain::{CampaignId, ConnectorId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Workflow lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Scheduled and waiting for the workflow to pick it up.
    Queued,
    /// Content drafting is underway (or a draft awaits validation).
    Drafting,
    /// Draft persisted; waiting for a human approval signal.
    PendingApproval,
    /// Approved (by a human or automatically); ready to execute.
    Approved,
    /// Delivery through the channel executor is in flight.
    Executing,
    /// Delivered; awaiting metrics collection.
    Completed,
    /// Metrics collected and merged; fully done.
    Evaluated,
    /// Stopped by a policy block, timeout, or emergency stop.
    Cancelled,
    /// Stopped by a content or execution failure.
    Failed,
    /// A blocking content violation with no regeneration attempted.
    ContentBlocked,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Drafting => "drafting",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Evaluated => "evaluated",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::ContentBlocked => "content_blocked",
        }
    }

    /// Returns whether the status permits a transition to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Queued, Self::Drafting)
                | (Self::Queued, Self::Cancelled)
                | (Self::Queued, Self::Failed)
                | (Self::Drafting, Self::PendingApproval)
                | (Self::Drafting, Self::Approved)
                | (Self::Drafting, Self::ContentBlocked)
                | (Self::Drafting, Self::Cancelled)
                | (Self::Drafting, Self::Failed)
                | (Self::PendingApproval, Self::Approved)
                | (Self::PendingApproval, Self::Cancelled)
                | (Self::PendingApproval, Self::Failed)
                | (Self::Approved, Self::Executing)
                | (Self::Approved, Self::Completed)
                | (Self::Approved, Self::Cancelled)
                | (Self::Approved, Self::Failed)
                | (Self::Executing, Self::Completed)
                | (Self::Executing, Self::Cancelled)
                | (Self::Executing, Self::Failed)
                | (Self::Completed, Self::Evaluated)
                | (Self::Completed, Self::Failed)
        )
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Evaluated | Self::Cancelled | Self::Failed | Self::ContentBlocked
        )
    }

    /// Returns whether an emergency stop may cancel a task in this status.
    ///
    /// Completed tasks have already delivered; cancelling them would discard
    /// metrics without undoing anything, so they are left alone.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        !self.is_terminal() && !matches!(self, Self::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "queued" => Ok(Self::Queued),
            "drafting" => Ok(Self::Drafting),
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "executing" => Ok(Self::Executing),
            "completed" => Ok(Self::Completed),
            "evaluated" => Ok(Self::Evaluated),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            "content_blocked" => Ok(Self::ContentBlocked),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Named workflow step, recorded alongside error-log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Pre-draft policy checkpoint.
    PreDraftValidation,
    /// Content drafting via the external drafter.
    Drafting,
    /// Content policy checkpoint.
    ContentValidation,
    /// Approval wait and resolution.
    Approval,
    /// Pre-execute policy checkpoint.
    PreExecuteValidation,
    /// Delivery through the channel executor.
    Execution,
    /// Post-delivery metrics collection.
    MetricsCollection,
}

impl WorkflowStep {
    /// Returns the canonical step name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreDraftValidation => "pre_draft_validation",
            Self::Drafting => "drafting",
            Self::ContentValidation => "content_validation",
            Self::Approval => "approval",
            Self::PreExecuteValidation => "pre_execute_validation",
            Self::Execution => "execution",
            Self::MetricsCollection => "metrics_collection",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped failure record in a task's error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskErrorEntry {
    /// Workflow step that produced the failure.
    pub step: WorkflowStep,
    /// Human-readable explanation of the failure cause.
    pub message: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

/// Task aggregate root.
///
/// Tasks are created by upstream scheduling logic and mutated exclusively by
/// the workflow as it advances state; they are never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    campaign_id: CampaignId,
    task_type: TaskType,
    title: String,
    description: Option<String>,
    scheduled_at: DateTime<Utc>,
    connector_id: Option<ConnectorId>,
    input_params: Value,
    draft_content: Option<Value>,
    final_content: Option<Value>,
    status: TaskStatus,
    dry_run: bool,
    error_log: Vec<TaskErrorEntry>,
    execution_result: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a queued task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskTitle`] when the title is empty
    /// after trimming.
    pub fn new(
        campaign_id: CampaignId,
        task_type: TaskType,
        title: impl Into<String>,
        scheduled_at: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TaskDomainError::EmptyTaskTitle);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            campaign_id,
            task_type,
            title,
            description: None,
            scheduled_at,
            connector_id: None,
            input_params: Value::Null,
            draft_content: None,
            final_content: None,
            status: TaskStatus::Queued,
            dry_run: false,
            error_log: Vec::new(),
            execution_result: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the delivery-channel connector.
    #[must_use]
    pub const fn with_connector(mut self, connector_id: ConnectorId) -> Self {
        self.connector_id = Some(connector_id);
        self
    }

    /// Sets free-form input parameters.
    #[must_use]
    pub fn with_input_params(mut self, params: Value) -> Self {
        self.input_params = params;
        self
    }

    /// Flags the task as a dry run: validated and drafted, never delivered.
    #[must_use]
    pub const fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning campaign identifier.
    #[must_use]
    pub const fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    /// Returns the content type this task produces.
    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the scheduled delivery time.
    #[must_use]
    pub const fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    /// Returns the delivery connector reference, if any.
    #[must_use]
    pub const fn connector_id(&self) -> Option<ConnectorId> {
        self.connector_id
    }

    /// Returns the free-form input parameters.
    #[must_use]
    pub const fn input_params(&self) -> &Value {
        &self.input_params
    }

    /// Returns the draft content, if drafted.
    #[must_use]
    pub const fn draft_content(&self) -> Option<&Value> {
        self.draft_content.as_ref()
    }

    /// Returns the approved final content, if any.
    #[must_use]
    pub const fn final_content(&self) -> Option<&Value> {
        self.final_content.as_ref()
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns whether this task is a dry run.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the ordered error log.
    #[must_use]
    pub fn error_log(&self) -> &[TaskErrorEntry] {
        &self.error_log
    }

    /// Returns the execution result, if the task has executed.
    #[must_use]
    pub const fn execution_result(&self) -> Option<&Value> {
        self.execution_result.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the task as drafting.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not queued.
    pub fn begin_drafting(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Drafting, clock)
    }

    /// Stores draft content produced by the drafter.
    ///
    /// The task stays in `Drafting`; the draft awaits content validation.
    pub fn set_draft(&mut self, content: Value, clock: &impl Clock) {
        self.draft_content = Some(content);
        self.touch(clock);
    }

    /// Parks the task waiting for a human approval signal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoDraftContent`] when no draft exists, or
    /// [`TaskDomainError::InvalidStateTransition`] when the task is not
    /// drafting.
    pub fn await_approval(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.draft_content.is_none() {
            return Err(TaskDomainError::NoDraftContent(self.id));
        }
        self.transition_to(TaskStatus::PendingApproval, clock)
    }

    /// Promotes the draft to final content and marks the task approved.
    ///
    /// `final_content` is set here and nowhere else, so it can only exist
    /// after content validation has passed and any required approval has been
    /// resolved.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoDraftContent`] when no draft exists, or
    /// [`TaskDomainError::InvalidStateTransition`] when the task is neither
    /// drafting (auto-approval) nor pending approval.
    pub fn approve(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let Some(draft) = self.draft_content.clone() else {
            return Err(TaskDomainError::NoDraftContent(self.id));
        };
        self.transition_to(TaskStatus::Approved, clock)?;
        self.final_content = Some(draft);
        Ok(())
    }

    /// Marks delivery as in flight.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not approved.
    pub fn begin_execution(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Executing, clock)
    }

    /// Records the execution result and marks the task completed.
    ///
    /// Permitted from `Executing`, and directly from `Approved` for dry runs
    /// and connector-less tasks that never invoke a channel executor.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] otherwise.
    pub fn complete(&mut self, result: Value, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Completed, clock)?;
        self.execution_result = Some(result);
        Ok(())
    }

    /// Merges collected metrics into the execution result and marks the task
    /// evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not completed.
    pub fn record_evaluation(
        &mut self,
        metrics: Value,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Evaluated, clock)?;
        let merged = match (self.execution_result.take(), metrics) {
            (Some(Value::Object(mut result)), Value::Object(collected)) => {
                result.extend(collected);
                Value::Object(result)
            }
            (Some(result), collected) => {
                serde_json::json!({ "result": result, "metrics": collected })
            }
            (None, collected) => serde_json::json!({ "metrics": collected }),
        };
        self.execution_result = Some(merged);
        Ok(())
    }

    /// Cancels the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the current
    /// status does not permit cancellation.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Cancelled, clock)
    }

    /// Marks the task failed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the current
    /// status does not permit failing.
    pub fn fail(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Failed, clock)
    }

    /// Marks the task content-blocked, preserving the draft for inspection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not drafting.
    pub fn block_content(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::ContentBlocked, clock)
    }

    /// Appends a timestamped entry to the error log.
    pub fn record_error(
        &mut self,
        step: WorkflowStep,
        message: impl Into<String>,
        clock: &impl Clock,
    ) {
        self.error_log.push(TaskErrorEntry {
            step,
            message: message.into(),
            at: clock.utc(),
        });
        self.touch(clock);
    }

    /// Validates and applies a status transition.
    fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
