//! Banned-phrase checker: fails when any configured phrase appears in the
//! serialized content.

use super::{content_text, CheckContext};
use crate::policy::domain::{
    BannedPhraseRule, CheckOutcome, CheckerFault, Policy, Violation,
};
use crate::task::domain::Task;
use regex::RegexBuilder;

pub(super) fn check(
    policy: &Policy,
    rule: &BannedPhraseRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let Some(content) = content_text(task, ctx.checkpoint) else {
        return Ok(CheckOutcome::pass());
    };

    let mut found = Vec::new();
    for phrase in &rule.phrases {
        if phrase_matches(phrase, &content, rule).map_err(|err| {
            CheckerFault::new(policy.id(), format!("invalid banned phrase pattern: {err}"))
        })? {
            found.push(phrase.clone());
        }
    }

    if found.is_empty() {
        return Ok(CheckOutcome::pass());
    }
    Ok(CheckOutcome::fail(Violation::new(
        policy,
        format!("content contains banned phrase(s): {}", found.join(", ")),
        serde_json::json!({ "phrases": found }),
        ctx.now,
    )))
}

fn phrase_matches(
    phrase: &str,
    content: &str,
    rule: &BannedPhraseRule,
) -> Result<bool, regex::Error> {
    if rule.regex || rule.whole_word {
        let pattern = if rule.regex {
            phrase.to_owned()
        } else {
            format!(r"\b{}\b", regex::escape(phrase))
        };
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(!rule.case_sensitive)
            .build()?;
        return Ok(matcher.is_match(content));
    }

    if rule.case_sensitive {
        Ok(content.contains(phrase))
    } else {
        Ok(content.to_lowercase().contains(&phrase.to_lowercase()))
    }
}
