//! Required-phrase checker: fails when configured phrases are missing.
//!
//! Unlike the other content checkers, this one fails explicitly when no
//! content exists at all, since "required" is meaningless against nothing.

use super::{content_text, CheckContext};
use crate::policy::domain::{
    CheckOutcome, CheckerFault, PhraseLocation, Policy, RequiredPhraseRule, Violation,
};
use crate::task::domain::Task;

/// Fraction of the content treated as header or footer, in percent.
const EDGE_SLICE_PERCENT: usize = 20;

pub(super) fn check(
    policy: &Policy,
    rule: &RequiredPhraseRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let Some(content) = content_text(task, ctx.checkpoint) else {
        return Ok(CheckOutcome::fail(Violation::new(
            policy,
            "no content available to satisfy required phrases",
            serde_json::json!({ "phrases": rule.phrases }),
            ctx.now,
        )));
    };

    let haystack = slice_for_location(&content, rule.location);
    let haystack = if rule.case_sensitive {
        haystack
    } else {
        haystack.to_lowercase()
    };

    let mut missing = Vec::new();
    let mut present = 0usize;
    for phrase in &rule.phrases {
        let needle = if rule.case_sensitive {
            phrase.clone()
        } else {
            phrase.to_lowercase()
        };
        if haystack.contains(&needle) {
            present += 1;
        } else {
            missing.push(phrase.clone());
        }
    }

    if rule.at_least_one {
        if present > 0 {
            return Ok(CheckOutcome::pass());
        }
        return Ok(CheckOutcome::fail(Violation::new(
            policy,
            "none of the required phrases are present",
            serde_json::json!({ "phrases": rule.phrases }),
            ctx.now,
        )));
    }

    if missing.is_empty() {
        return Ok(CheckOutcome::pass());
    }
    Ok(CheckOutcome::fail(Violation::new(
        policy,
        format!("missing required phrase(s): {}", missing.join(", ")),
        serde_json::json!({ "missing": missing }),
        ctx.now,
    )))
}

/// Restricts the search to the first or last 20% of the content when the
/// rule targets a header or footer.
fn slice_for_location(content: &str, location: PhraseLocation) -> String {
    let total = content.chars().count();
    #[expect(
        clippy::integer_division,
        reason = "truncation to whole characters is the intended edge size"
    )]
    let edge = total * EDGE_SLICE_PERCENT / 100;
    match location {
        PhraseLocation::Anywhere => content.to_owned(),
        PhraseLocation::Header => content.chars().take(edge).collect(),
        PhraseLocation::Footer => content.chars().skip(total.saturating_sub(edge)).collect(),
    }
}
