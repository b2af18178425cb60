//! Time-window checker: the scheduled send must fall on an allowed weekday
//! and inside the allowed hour range, in the rule's timezone.

use super::CheckContext;
use crate::policy::domain::{CheckOutcome, CheckerFault, Policy, TimeWindowRule, Violation};
use crate::task::domain::Task;
use chrono::{Datelike, FixedOffset, Timelike};

pub(super) fn check(
    policy: &Policy,
    rule: &TimeWindowRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let offset = parse_timezone(&rule.timezone)
        .ok_or_else(|| CheckerFault::new(policy.id(), format!("unsupported timezone: {}", rule.timezone)))?;

    let local = task.scheduled_at().with_timezone(&offset);
    let weekday = u8::try_from(local.weekday().num_days_from_sunday()).unwrap_or(0);
    let hour = u8::try_from(local.hour()).unwrap_or(0);

    let day_allowed = rule.allowed_days.contains(&weekday);
    let hour_allowed = hour >= rule.allowed_hours.start && hour < rule.allowed_hours.end;

    if day_allowed && hour_allowed {
        return Ok(CheckOutcome::pass());
    }
    Ok(CheckOutcome::fail(Violation::new(
        policy,
        format!(
            "scheduled time falls outside the allowed window (weekday {weekday}, hour {hour} in {})",
            rule.timezone
        ),
        serde_json::json!({
            "weekday": weekday,
            "hour": hour,
            "allowedDays": rule.allowed_days,
            "allowedHours": { "start": rule.allowed_hours.start, "end": rule.allowed_hours.end },
        }),
        ctx.now,
    )))
}

/// Accepts `UTC`/`GMT` and fixed `±HH:MM` offsets. Named zone databases are
/// out of scope; an unrecognized zone is a checker fault and fails open.
fn parse_timezone(timezone: &str) -> Option<FixedOffset> {
    let trimmed = timezone.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("gmt") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match trimmed.split_at_checked(1)? {
        ("+", rest) => (1i32, rest),
        ("-", rest) => (-1i32, rest),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
