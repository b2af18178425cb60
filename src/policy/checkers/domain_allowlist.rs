//! Domain-allowlist checker: every URL in the content must point at an
//! allowed domain.

use super::{content_text, CheckContext};
use crate::policy::domain::{
    CheckOutcome, CheckerFault, DomainAllowlistRule, Policy, Violation,
};
use crate::task::domain::Task;
use regex::Regex;
use std::sync::LazyLock;

/// Generic URL pattern capturing the host.
#[expect(clippy::expect_used, reason = "the pattern is a valid literal")]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://([A-Za-z0-9][A-Za-z0-9.-]*)").expect("URL pattern is valid")
});

pub(super) fn check(
    policy: &Policy,
    rule: &DomainAllowlistRule,
    task: &Task,
    ctx: &CheckContext<'_>,
) -> Result<CheckOutcome, CheckerFault> {
    let Some(content) = content_text(task, ctx.checkpoint) else {
        return Ok(CheckOutcome::pass());
    };

    let domains: Vec<String> = URL_PATTERN
        .captures_iter(&content)
        .filter_map(|capture| capture.get(1))
        .map(|host| host.as_str().to_lowercase())
        .collect();

    if domains.is_empty() {
        return Ok(CheckOutcome::pass());
    }

    if rule.block_all {
        return Ok(CheckOutcome::fail(Violation::new(
            policy,
            "links are not permitted in this content",
            serde_json::json!({ "domains": domains }),
            ctx.now,
        )));
    }

    let mut disallowed: Vec<String> = domains
        .into_iter()
        .filter(|domain| !is_allowed(domain, &rule.allowed_domains))
        .collect();
    disallowed.dedup();

    if disallowed.is_empty() {
        return Ok(CheckOutcome::pass());
    }
    Ok(CheckOutcome::fail(Violation::new(
        policy,
        format!("links point at disallowed domain(s): {}", disallowed.join(", ")),
        serde_json::json!({ "domains": disallowed }),
        ctx.now,
    )))
}

/// Suffix match: `www.example.com` is allowed by `example.com`.
fn is_allowed(domain: &str, allowed_domains: &[String]) -> bool {
    allowed_domains.iter().any(|allowed| {
        let allowed = allowed.to_lowercase();
        domain == allowed || domain.ends_with(&format!(".{allowed}"))
    })
}
