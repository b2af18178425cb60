//! Claim-lock checker: blocks explicitly forbidden product claims and
//! reminds authors to stick to verified ones.

use super::{content_text, CheckContext};
use crate::policy::domain::{CheckOutcome, CheckerFault, ClaimLockRule, Policy, Violation, Warning};
use crate::task::domain::Task;

pub(super) fn check(
    policy: &Policy,
    rule: &ClaimLockRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let Some(content) = content_text(task, ctx.checkpoint) else {
        return Ok(CheckOutcome::pass());
    };
    let lowered = content.to_lowercase();

    let blocked: Vec<String> = rule
        .blocked_claims
        .iter()
        .flatten()
        .filter(|claim| lowered.contains(&claim.to_lowercase()))
        .cloned()
        .collect();
    if !blocked.is_empty() {
        return Ok(CheckOutcome::fail(Violation::new(
            policy,
            format!("content contains blocked claim(s): {}", blocked.join(", ")),
            serde_json::json!({ "blockedClaims": blocked }),
            ctx.now,
        )));
    }

    let verified_count = ctx
        .product
        .map(|product| product.verified_claims().len())
        .unwrap_or_default();
    Ok(CheckOutcome::pass_with_warning(Warning::new(
        policy,
        "claims were not individually verified; keep copy within the product's verified claims",
        serde_json::json!({
            "requireVerified": rule.require_verified,
            "verifiedClaimCount": verified_count,
        }),
        ctx.now,
    )))
}
