//! Validation engine: evaluates an organization's active policies against a
//! task snapshot at one checkpoint and folds the results into a verdict.

use crate::policy::checkers::{self, CheckContext};
use crate::policy::domain::{denies, Checkpoint, PolicySeverity, ValidationOutcome};
use crate::policy::ports::{ActivityStore, PolicyRepository, PolicyRepositoryError};
use crate::records::domain::CampaignId;
use crate::records::ports::{RecordStore, RecordStoreError};
use crate::task::domain::Task;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Failure of the validation call itself, as opposed to a deny verdict.
///
/// A fault means no verdict was produced; callers must not treat it as
/// either pass or fail.
#[derive(Debug, Error)]
pub enum ValidationFault {
    /// The task references a campaign that does not exist.
    #[error("campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// Reference-data lookup failed.
    #[error(transparent)]
    Records(#[from] RecordStoreError),

    /// Policy definitions could not be loaded.
    #[error(transparent)]
    Policies(#[from] PolicyRepositoryError),
}

/// Evaluates policies for one checkpoint.
///
/// Stateless between calls: every validation loads the current active policy
/// set, so rule changes take effect on the next checkpoint without restarts.
pub struct PolicyEngine<C> {
    policies: Arc<dyn PolicyRepository>,
    records: Arc<dyn RecordStore>,
    activity: Arc<dyn ActivityStore>,
    clock: Arc<C>,
}

impl<C> PolicyEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an engine over the given stores.
    #[must_use]
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        records: Arc<dyn RecordStore>,
        activity: Arc<dyn ActivityStore>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            policies,
            records,
            activity,
            clock,
        }
    }

    /// Validates `task` at `checkpoint`.
    ///
    /// Policies whose kind does not apply at the checkpoint are skipped; the
    /// surviving checkers run concurrently. A checker fault is logged and
    /// treated as "no opinion" so one broken rule cannot freeze an
    /// organization's entire workflow, but a store failure aborts the call.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationFault`] when the campaign cannot be resolved or a
    /// store read fails.
    pub async fn validate(
        &self,
        task: &Task,
        checkpoint: Checkpoint,
    ) -> Result<ValidationOutcome, ValidationFault> {
        let now = self.clock.utc();

        let campaign = self
            .records
            .find_campaign(task.campaign_id())
            .await?
            .ok_or(ValidationFault::CampaignNotFound(task.campaign_id()))?;
        let product = match campaign.product_id() {
            Some(product_id) => self.records.find_product(product_id).await?,
            None => None,
        };

        let policies = self
            .policies
            .load_active(campaign.organization_id(), campaign.product_id())
            .await?;
        let applicable: Vec<_> = policies
            .iter()
            .filter(|policy| policy.kind().applies_at(checkpoint))
            .collect();

        let ctx = CheckContext {
            checkpoint,
            now,
            organization_id: campaign.organization_id(),
            product: product.as_ref(),
            activity: self.activity.as_ref(),
        };

        let results = futures::future::join_all(
            applicable
                .iter()
                .map(|policy| checkers::run(policy, task, &ctx)),
        )
        .await;

        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        for (policy, result) in applicable.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    violations.extend(outcome.violation);
                    warnings.extend(outcome.warning);
                }
                Err(fault) => {
                    tracing::warn!(
                        policy_id = %fault.policy_id,
                        policy_name = policy.name(),
                        checkpoint = %checkpoint,
                        error = %fault.message,
                        "checker fault; rule skipped for this validation",
                    );
                }
            }
        }

        let allowed = !denies(&violations);
        let feedback = feedback_summary(&violations, &warnings);
        Ok(ValidationOutcome {
            allowed,
            violations,
            warnings,
            feedback,
        })
    }
}

/// Builds the human-readable summary attached to non-clean outcomes.
fn feedback_summary(
    violations: &[crate::policy::domain::Violation],
    warnings: &[crate::policy::domain::Warning],
) -> Option<String> {
    if violations.is_empty() && warnings.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    let blocking: Vec<&str> = violations
        .iter()
        .filter(|violation| violation.severity == PolicySeverity::Block)
        .map(|violation| violation.policy_name.as_str())
        .collect();
    if !blocking.is_empty() {
        parts.push(format!("blocked by: {}", blocking.join(", ")));
    }
    let escalations = violations
        .iter()
        .filter(|violation| violation.severity == PolicySeverity::Escalate)
        .count();
    if escalations > 0 {
        parts.push(format!("{escalations} violation(s) escalated for review"));
    }
    let advisories = violations
        .iter()
        .filter(|violation| violation.severity == PolicySeverity::Warn)
        .count()
        + warnings.len();
    if advisories > 0 {
        parts.push(format!("{advisories} advisory finding(s)"));
    }
    Some(parts.join("; "))
}
