//! Rule checkers: one evaluator per rule kind.
//!
//! Each checker takes `(policy, task, context)` and returns a
//! [`CheckOutcome`] or a [`CheckerFault`]. Checkers never mutate the store;
//! aggregate reads go through the [`ActivityStore`] port carried by the
//! context. The dispatch in [`run`] matches the rule union exhaustively, so
//! a new rule kind cannot be added without a checker.
//!
//! Checkpoint-awareness, uniform across checkers: when the content field a
//! checker inspects is absent for the current checkpoint, the checker passes
//! trivially instead of fabricating a failure — except `required_phrase`,
//! which fails explicitly when no content exists at all.

mod banned_phrase;
mod budget_limit;
mod claim_lock;
mod content_rule;
mod domain_allowlist;
mod rate_limit;
mod required_phrase;
mod suppression;
mod time_window;

use crate::policy::domain::{CheckOutcome, Checkpoint, CheckerFault, Policy, PolicyRule};
use crate::policy::ports::ActivityStore;
use crate::records::domain::{OrganizationId, Product};
use crate::task::domain::Task;
use chrono::{DateTime, Utc};

/// Read-only context shared by every checker within one validation call.
pub struct CheckContext<'a> {
    /// Checkpoint being validated.
    pub checkpoint: Checkpoint,
    /// Evaluation instant; all outputs are stamped with it.
    pub now: DateTime<Utc>,
    /// Organization owning the task's campaign.
    pub organization_id: OrganizationId,
    /// Product targeted by the campaign, when resolved.
    pub product: Option<&'a Product>,
    /// Aggregate activity reads for rate-limit and budget rules.
    pub activity: &'a dyn ActivityStore,
}

/// Evaluates one policy against a task snapshot.
///
/// # Errors
///
/// Returns [`CheckerFault`] when the checker itself fails (bad rule pattern,
/// aggregate-store read failure); the engine treats faults as "no opinion".
pub async fn run(
    policy: &Policy,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    match policy.rule() {
        PolicyRule::RateLimit(rule) => rate_limit::check(policy, rule, task, ctx).await,
        PolicyRule::BannedPhrase(rule) => banned_phrase::check(policy, rule, task, ctx),
        PolicyRule::RequiredPhrase(rule) => required_phrase::check(policy, rule, task, ctx),
        PolicyRule::ClaimLock(rule) => claim_lock::check(policy, rule, task, ctx),
        PolicyRule::DomainAllowlist(rule) => domain_allowlist::check(policy, rule, task, ctx),
        PolicyRule::Suppression(rule) => suppression::check(policy, rule, task, ctx),
        PolicyRule::TimeWindow(rule) => time_window::check(policy, rule, task, ctx),
        PolicyRule::BudgetLimit(rule) => budget_limit::check(policy, rule, task, ctx).await,
        PolicyRule::ContentRule(rule) => content_rule::check(policy, rule, task, ctx),
    }
}

/// Returns the serialized content relevant to the current checkpoint, or
/// `None` when that content has not been produced yet.
///
/// The content checkpoint inspects the draft; pre-execute inspects the final
/// content (falling back to the draft for auto-approved paths mid-flight).
pub(crate) fn content_text(task: &Task, checkpoint: Checkpoint) -> Option<String> {
    let value = match checkpoint {
        Checkpoint::Content => task.draft_content(),
        Checkpoint::PreDraft | Checkpoint::PreExecute => {
            task.final_content().or_else(|| task.draft_content())
        }
    }?;
    serde_json::to_string(value).ok()
}
