//! Rate-limit checker: counts recently completed tasks in the rule's scope
//! and fails once the configured limit is reached.

use super::CheckContext;
use crate::policy::domain::{
    CheckOutcome, CheckerFault, Policy, RateLimitRule, RateScope, RateWindow, Violation,
};
use crate::policy::ports::ActivityScope;
use crate::task::domain::Task;
use chrono::Duration;

pub(super) async fn check(
    policy: &Policy,
    rule: &RateLimitRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let scope = rule.scope.unwrap_or(RateScope::Organization);
    let activity_scope = match scope {
        RateScope::Connector => match task.connector_id() {
            Some(connector_id) => ActivityScope::Connector(connector_id),
            // A connector-scoped limit has nothing to count for tasks that
            // never touch a connector.
            None => return Ok(CheckOutcome::pass()),
        },
        RateScope::Campaign => ActivityScope::Campaign(task.campaign_id()),
        RateScope::Product => match ctx.product {
            Some(product) => ActivityScope::Product(product.id()),
            None => return Ok(CheckOutcome::pass()),
        },
        RateScope::Organization => ActivityScope::Organization(ctx.organization_id),
    };

    let since = ctx.now - window_duration(rule.window);
    let count = ctx
        .activity
        .completed_task_count(activity_scope, Some(since), rule.task_types.as_deref())
        .await
        .map_err(|error| CheckerFault::new(policy.id(), error.to_string()))?;

    if count < u64::from(rule.limit) {
        return Ok(CheckOutcome::pass());
    }
    Ok(CheckOutcome::fail(Violation::new(
        policy,
        format!(
            "rate limit reached: {count} task(s) completed in the last {} against a limit of {}",
            rule.window.as_str(),
            rule.limit
        ),
        serde_json::json!({
            "count": count,
            "limit": rule.limit,
            "window": rule.window.as_str(),
            "scope": scope.as_str(),
        }),
        ctx.now,
    )))
}

fn window_duration(window: RateWindow) -> Duration {
    match window {
        RateWindow::Hour => Duration::hours(1),
        RateWindow::Day => Duration::days(1),
        RateWindow::Week => Duration::days(7),
        RateWindow::Month => Duration::days(30),
    }
}
