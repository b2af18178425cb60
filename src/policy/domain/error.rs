//! Error types for the policy domain.

use super::PolicyId;
use thiserror::Error;

/// A fault inside one rule checker.
///
/// Checker faults are isolated per policy and fail open: the engine logs the
/// fault and treats the checker as having no opinion, so one misbehaving
/// rule cannot block unrelated tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("checker fault for policy {policy_id}: {message}")]
pub struct CheckerFault {
    /// Policy whose checker faulted.
    pub policy_id: PolicyId,
    /// What went wrong.
    pub message: String,
}

impl CheckerFault {
    /// Creates a fault attributed to `policy_id`.
    #[must_use]
    pub fn new(policy_id: PolicyId, message: impl Into<String>) -> Self {
        Self {
            policy_id,
            message: message.into(),
        }
    }
}

/// Error returned while parsing policy severities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown policy severity: {0}")]
pub struct ParsePolicySeverityError(pub String);
