//! Validation outputs: violations, warnings, checker outcomes, and the
//! per-checkpoint result.
//!
//! Violations and warnings are transient evaluation outputs, produced fresh
//! on every validation call and never persisted as entities.

use super::{Policy, PolicyId, PolicyKind, PolicySeverity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A policy whose rule was violated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Violated policy identifier.
    pub policy_id: PolicyId,
    /// Violated policy name.
    pub policy_name: String,
    /// Rule kind that fired.
    pub policy_kind: PolicyKind,
    /// Severity of the violated policy.
    pub severity: PolicySeverity,
    /// Human-readable explanation.
    pub message: String,
    /// Structured supporting detail for log readers.
    pub details: Value,
    /// When the violation was produced.
    pub timestamp: DateTime<Utc>,
}

impl Violation {
    /// Creates a violation attributed to `policy`.
    #[must_use]
    pub fn new(
        policy: &Policy,
        message: impl Into<String>,
        details: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            policy_id: policy.id(),
            policy_name: policy.name().to_owned(),
            policy_kind: policy.kind(),
            severity: policy.severity(),
            message: message.into(),
            details,
            timestamp,
        }
    }
}

/// Advisory output that never affects the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Originating policy identifier.
    pub policy_id: PolicyId,
    /// Originating policy name.
    pub policy_name: String,
    /// Rule kind that produced the warning.
    pub policy_kind: PolicyKind,
    /// Human-readable advisory.
    pub message: String,
    /// Structured supporting detail for log readers.
    pub details: Value,
    /// When the warning was produced.
    pub timestamp: DateTime<Utc>,
}

impl Warning {
    /// Creates a warning attributed to `policy`.
    #[must_use]
    pub fn new(
        policy: &Policy,
        message: impl Into<String>,
        details: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            policy_id: policy.id(),
            policy_name: policy.name().to_owned(),
            policy_kind: policy.kind(),
            message: message.into(),
            details,
            timestamp,
        }
    }
}

/// A single checker's verdict for one policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// Whether the rule passed.
    pub passed: bool,
    /// Violation produced on failure.
    pub violation: Option<Violation>,
    /// Advisory warning, possible on pass or fail.
    pub warning: Option<Warning>,
}

impl CheckOutcome {
    /// A clean pass.
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            violation: None,
            warning: None,
        }
    }

    /// A pass carrying an advisory warning.
    #[must_use]
    pub const fn pass_with_warning(warning: Warning) -> Self {
        Self {
            passed: true,
            violation: None,
            warning: Some(warning),
        }
    }

    /// A failure carrying its violation.
    #[must_use]
    pub const fn fail(violation: Violation) -> Self {
        Self {
            passed: false,
            violation: Some(violation),
            warning: None,
        }
    }
}

/// The engine's per-checkpoint output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the workflow may proceed past this checkpoint.
    pub allowed: bool,
    /// Violations, in policy load order.
    pub violations: Vec<Violation>,
    /// Advisory warnings.
    pub warnings: Vec<Warning>,
    /// Summary for humans, present when anything fired.
    pub feedback: Option<String>,
}

impl ValidationOutcome {
    /// Returns whether any violation carries `escalate` severity.
    #[must_use]
    pub fn has_escalations(&self) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.severity == PolicySeverity::Escalate)
    }

    /// Returns the names of policies that blocked, for error logs.
    #[must_use]
    pub fn blocking_policy_names(&self) -> Vec<String> {
        self.violations
            .iter()
            .filter(|violation| violation.severity == PolicySeverity::Block)
            .map(|violation| violation.policy_name.clone())
            .collect()
    }
}

/// Central severity semantics: the validation is denied iff at least one
/// violation carries `block` severity.
///
/// `warn` and `escalate` violations are surfaced but never deny; keeping
/// this the single decision point stops the three severities drifting apart
/// between checkers and engine.
#[must_use]
pub fn denies(violations: &[Violation]) -> bool {
    violations
        .iter()
        .any(|violation| violation.severity == PolicySeverity::Block)
}
