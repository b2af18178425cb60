//! Budget-limit checker: compares recorded spend in the rule's scope and
//! window against the configured ceiling, warning at 80% utilization.

use super::CheckContext;
use crate::policy::domain::{
    BudgetLimitRule, BudgetScope, BudgetWindow, CheckOutcome, CheckerFault, Policy, Violation,
    Warning,
};
use crate::policy::ports::ActivityScope;
use crate::task::domain::Task;
use chrono::{DateTime, Duration, Utc};

pub(super) async fn check(
    policy: &Policy,
    rule: &BudgetLimitRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let scope = match rule.scope {
        BudgetScope::Campaign => ActivityScope::Campaign(task.campaign_id()),
        BudgetScope::Product => match ctx.product {
            Some(product) => ActivityScope::Product(product.id()),
            // Product-scoped budgets cannot bind a campaign with no product.
            None => return Ok(CheckOutcome::pass()),
        },
        BudgetScope::Organization => ActivityScope::Organization(ctx.organization_id),
    };

    let since = window_cutoff(rule.window, ctx.now);
    let spend = ctx
        .activity
        .spend_cents(scope, since)
        .await
        .map_err(|error| CheckerFault::new(policy.id(), error.to_string()))?;

    if spend >= rule.max_spend_cents {
        return Ok(CheckOutcome::fail(Violation::new(
            policy,
            format!(
                "budget exhausted: {spend} of {} cents spent in the {} window",
                rule.max_spend_cents,
                rule.window.as_str()
            ),
            details(spend, rule),
            ctx.now,
        )));
    }
    // Warn from 80% utilization, computed without floating point.
    if spend * 5 >= rule.max_spend_cents * 4 {
        return Ok(CheckOutcome::pass_with_warning(Warning::new(
            policy,
            format!(
                "budget nearly exhausted: {spend} of {} cents spent in the {} window",
                rule.max_spend_cents,
                rule.window.as_str()
            ),
            details(spend, rule),
            ctx.now,
        )));
    }
    Ok(CheckOutcome::pass())
}

fn details(spend: i64, rule: &BudgetLimitRule) -> serde_json::Value {
    serde_json::json!({
        "spendCents": spend,
        "maxSpendCents": rule.max_spend_cents,
        "window": rule.window.as_str(),
        "scope": rule.scope.as_str(),
    })
}

/// Rolling windows cut off at a fixed duration before now; campaign and
/// lifetime budgets count all recorded spend.
fn window_cutoff(window: BudgetWindow, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match window {
        BudgetWindow::Day => Some(now - Duration::days(1)),
        BudgetWindow::Week => Some(now - Duration::days(7)),
        BudgetWindow::Month => Some(now - Duration::days(30)),
        BudgetWindow::Campaign | BudgetWindow::Lifetime => None,
    }
}
