//! Heartbeat sweep: the recovery loop that makes suspension durable.
//!
//! The sweep does two things on every tick: it expires overdue pending
//! approvals (cancelling their tasks) and it resumes queued tasks whose
//! scheduled time has arrived. Because the workflow dispatches on stored
//! status, the same sweep also picks up tasks stranded by a crash.

use crate::task::domain::{TaskStatus, WorkflowStep};
use crate::task::ports::{ApprovalRepository, TaskRepository};
use crate::task::services::runner::{TaskWorkflow, WorkflowError};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;

/// What one sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartbeatReport {
    /// Pending approvals expired this sweep.
    pub approvals_expired: usize,
    /// Due queued tasks handed to the workflow this sweep.
    pub tasks_resumed: usize,
}

/// Periodic sweep over tasks and approvals.
pub struct Heartbeat<C> {
    tasks: Arc<dyn TaskRepository>,
    approvals: Arc<dyn ApprovalRepository>,
    workflow: Arc<TaskWorkflow<C>>,
    clock: Arc<C>,
}

impl<C> Heartbeat<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a heartbeat over the given stores and workflow.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        approvals: Arc<dyn ApprovalRepository>,
        workflow: Arc<TaskWorkflow<C>>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            approvals,
            workflow,
            clock,
        }
    }

    /// Runs one sweep.
    ///
    /// Failures on individual tasks are logged and skipped so one bad row
    /// cannot stall the rest of the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when listing expired approvals or due tasks
    /// fails.
    pub async fn run_once(&self) -> Result<HeartbeatReport, WorkflowError> {
        let now = self.clock.utc();
        let mut report = HeartbeatReport::default();

        for mut approval in self.approvals.list_expired_pending(now).await? {
            // A decision may have landed between the list and this expiry;
            // whichever commits first wins and the loser is skipped.
            if approval.expire(&*self.clock).is_err() {
                continue;
            }
            self.approvals.update(&approval).await?;
            report.approvals_expired += 1;

            let Some(mut task) = self.tasks.find_by_id(approval.task_id()).await? else {
                continue;
            };
            if task.status() != TaskStatus::PendingApproval {
                continue;
            }
            task.record_error(WorkflowStep::Approval, "approval window expired", &*self.clock);
            task.cancel(&*self.clock)?;
            self.tasks.update(&task).await?;
            self.workflow
                .audit(
                    Some(task.id()),
                    None,
                    "approval.expired",
                    json!({ "approvalId": approval.id() }),
                )
                .await;
        }

        for task in self.tasks.list_due_queued(now).await? {
            report.tasks_resumed += 1;
            if let Err(error) = self.workflow.handle_task_queued(task.id()).await {
                tracing::error!(task_id = %task.id(), %error, "heartbeat task run failed");
            }
        }

        Ok(report)
    }

    /// Sweeps forever at the given interval.
    pub async fn run(&self, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(report) => {
                    if report.approvals_expired > 0 || report.tasks_resumed > 0 {
                        tracing::info!(
                            approvals_expired = report.approvals_expired,
                            tasks_resumed = report.tasks_resumed,
                            "heartbeat sweep",
                        );
                    }
                }
                Err(error) => tracing::error!(%error, "heartbeat sweep failed"),
            }
        }
    }
}
