//! Content-constraint checker: length bounds plus required and forbidden
//! structural elements, folded into a single violation.

use super::{content_text, CheckContext};
use crate::policy::domain::{
    CheckOutcome, CheckerFault, ContentConstraintRule, Policy, Violation,
};
use crate::task::domain::Task;

pub(super) fn check(
    policy: &Policy,
    rule: &ContentConstraintRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let Some(content) = content_text(task, ctx.checkpoint) else {
        return Ok(CheckOutcome::pass());
    };
    let length = content.chars().count();

    let mut issues = Vec::new();
    if let Some(max) = rule.max_length {
        if length > max {
            issues.push(format!("content is {length} characters, above the maximum of {max}"));
        }
    }
    if let Some(min) = rule.min_length {
        if length < min {
            issues.push(format!("content is {length} characters, below the minimum of {min}"));
        }
    }
    for element in rule.required_elements.iter().flatten() {
        if !content.contains(element.as_str()) {
            issues.push(format!("missing required element: {element}"));
        }
    }
    for element in rule.forbidden_elements.iter().flatten() {
        if content.contains(element.as_str()) {
            issues.push(format!("contains forbidden element: {element}"));
        }
    }

    if issues.is_empty() {
        return Ok(CheckOutcome::pass());
    }
    Ok(CheckOutcome::fail(Violation::new(
        policy,
        issues.join("; "),
        serde_json::json!({ "issues": issues, "length": length }),
        ctx.now,
    )))
}
