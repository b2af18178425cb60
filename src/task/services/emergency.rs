//! Emergency stop: halts all marketing activity for an organization at once.

use crate::records::domain::{CampaignId, CampaignStatus, OrganizationId};
use crate::records::ports::RecordStore;
use crate::task::ports::{AuditEntry, AuditSink, TaskRepository};
use crate::task::services::runner::WorkflowError;
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;

/// What an emergency stop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmergencyStopReport {
    /// Campaigns moved to `paused`.
    pub campaigns_paused: usize,
    /// In-flight tasks cancelled.
    pub tasks_cancelled: usize,
}

/// Organization-wide kill switch.
pub struct EmergencyStop<C> {
    records: Arc<dyn RecordStore>,
    tasks: Arc<dyn TaskRepository>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<C>,
}

impl<C> EmergencyStop<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an emergency stop over the given stores.
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        tasks: Arc<dyn TaskRepository>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            records,
            tasks,
            audit,
            clock,
        }
    }

    /// Stops the organization: sandboxes it, pauses its planned and active
    /// campaigns, and cancels every task that has not yet delivered.
    ///
    /// Completed tasks are left alone; their content is already out and
    /// cancelling them would only discard metrics. Idempotent: a second stop
    /// finds nothing left to pause or cancel.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::OrganizationNotFound`] when the organization
    /// does not exist, or a store error when persistence fails.
    pub async fn stop_organization(
        &self,
        organization_id: OrganizationId,
        actor: &str,
    ) -> Result<EmergencyStopReport, WorkflowError> {
        let mut organization = self
            .records
            .find_organization(organization_id)
            .await?
            .ok_or(WorkflowError::OrganizationNotFound(organization_id))?;
        organization.enter_sandbox();
        self.records.update_organization(&organization).await?;

        let campaigns = self
            .records
            .list_campaigns_by_organization(organization_id)
            .await?;
        let campaign_ids: Vec<CampaignId> =
            campaigns.iter().map(|campaign| campaign.id()).collect();

        let mut report = EmergencyStopReport::default();
        for mut campaign in campaigns {
            if !campaign.status().is_stoppable() {
                continue;
            }
            campaign.set_status(CampaignStatus::Paused);
            self.records.update_campaign(&campaign).await?;
            report.campaigns_paused += 1;
        }

        for mut task in self.tasks.list_by_campaigns(&campaign_ids).await? {
            if !task.status().is_cancellable() {
                continue;
            }
            task.cancel(&*self.clock)?;
            self.tasks.update(&task).await?;
            report.tasks_cancelled += 1;
            self.record(
                AuditEntry {
                    task_id: Some(task.id()),
                    actor: Some(actor.to_owned()),
                    action: "task.cancelled".to_owned(),
                    details: json!({ "reason": "emergency_stop" }),
                    at: self.clock.utc(),
                },
            )
            .await;
        }

        self.record(AuditEntry {
            task_id: None,
            actor: Some(actor.to_owned()),
            action: "organization.emergency_stop".to_owned(),
            details: json!({
                "organizationId": organization_id,
                "campaignsPaused": report.campaigns_paused,
                "tasksCancelled": report.tasks_cancelled,
            }),
            at: self.clock.utc(),
        })
        .await;

        Ok(report)
    }

    async fn record(&self, entry: AuditEntry) {
        let action = entry.action.clone();
        if let Err(error) = self.audit.record(entry).await {
            tracing::warn!(%error, action, "audit entry dropped");
        }
    }
}
