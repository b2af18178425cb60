//! Suppression checker: a deliberately soft control that always passes but
//! recommends a suppression-list cross-check for the extracted recipients.

use super::CheckContext;
use crate::policy::domain::{CheckOutcome, CheckerFault, Policy, SuppressionRule, Warning};
use crate::task::domain::Task;
use serde_json::Value;

pub(super) fn check(
    policy: &Policy,
    rule: &SuppressionRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let recipients = extract_recipients(task.input_params());

    Ok(CheckOutcome::pass_with_warning(Warning::new(
        policy,
        "recipients were not cross-checked against suppression lists",
        serde_json::json!({
            "recipientCount": recipients.len(),
            "recipients": recipients,
            "checkGlobalList": rule.check_global_list,
            "checkProductList": rule.check_product_list,
            "suppressionListId": rule.suppression_list_id,
        }),
        ctx.now,
    )))
}

/// Pulls recipient addresses from the task's `to` and `recipients` input
/// parameters; both may be a single string or an array of strings.
fn extract_recipients(params: &Value) -> Vec<String> {
    let mut recipients = Vec::new();
    for key in ["to", "recipients"] {
        match params.get(key) {
            Some(Value::String(address)) => recipients.push(address.clone()),
            Some(Value::Array(addresses)) => recipients.extend(
                addresses
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned),
            ),
            _ => {}
        }
    }
    recipients
}
