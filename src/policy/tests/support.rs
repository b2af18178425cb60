//! Shared fixtures and doubles for policy tests.

use crate::policy::checkers::CheckContext;
use crate::policy::domain::{Checkpoint, Policy, PolicyRule, PolicySeverity};
use crate::policy::ports::{
    ActivityScope, ActivityStore, ActivityStoreError, ActivityStoreResult,
};
use crate::records::domain::{CampaignId, OrganizationId, Product};
use crate::task::domain::{Task, TaskType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::DefaultClock;
use serde_json::json;

/// Activity store double returning fixed aggregates.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct StubActivity {
    pub count: u64,
    pub spend: i64,
    pub fail: bool,
}

#[async_trait]
impl ActivityStore for StubActivity {
    async fn completed_task_count(
        &self,
        _scope: ActivityScope,
        _since: Option<DateTime<Utc>>,
        _task_types: Option<&[TaskType]>,
    ) -> ActivityStoreResult<u64> {
        if self.fail {
            return Err(ActivityStoreError::persistence(std::io::Error::other(
                "activity store offline",
            )));
        }
        Ok(self.count)
    }

    async fn spend_cents(
        &self,
        _scope: ActivityScope,
        _since: Option<DateTime<Utc>>,
    ) -> ActivityStoreResult<i64> {
        if self.fail {
            return Err(ActivityStoreError::persistence(std::io::Error::other(
                "activity store offline",
            )));
        }
        Ok(self.spend)
    }
}

pub(super) fn block_policy(organization_id: OrganizationId, rule: PolicyRule) -> Policy {
    Policy::new(organization_id, "test policy", PolicySeverity::Block, rule)
}

pub(super) fn drafted_task(campaign_id: CampaignId, body: &str) -> Task {
    let mut task = Task::new(
        campaign_id,
        TaskType::SingleEmail,
        "Launch email",
        Utc::now(),
        &DefaultClock,
    )
    .expect("valid task title");
    task.set_draft(json!({ "subject": "Launch", "body": body }), &DefaultClock);
    task
}

pub(super) fn check_ctx<'a>(
    checkpoint: Checkpoint,
    organization_id: OrganizationId,
    product: Option<&'a Product>,
    activity: &'a StubActivity,
) -> CheckContext<'a> {
    CheckContext {
        checkpoint,
        now: Utc::now(),
        organization_id,
        product,
        activity,
    }
}
