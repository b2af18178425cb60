//! Approval aggregate: a side record created when a task needs human
//! sign-off.

use super::{ApprovalId, ParseApprovalStatusError, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Resolution state of an approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for a human decision.
    Pending,
    /// Approved by a human.
    Approved,
    /// Rejected by a human.
    Rejected,
    /// Timed out without a decision.
    Expired,
    /// Approved automatically (no human required).
    AutoApproved,
}

impl ApprovalStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::AutoApproved => "auto_approved",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ApprovalStatus {
    type Error = ParseApprovalStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            "auto_approved" => Ok(Self::AutoApproved),
            _ => Err(ParseApprovalStatusError(value.to_owned())),
        }
    }
}

/// Approval aggregate root.
///
/// Carries a snapshot of the content being approved plus a SHA-256 digest of
/// that snapshot, so a resolution arriving after the content changed (or
/// after expiry) can be detected and refused. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    id: ApprovalId,
    task_id: TaskId,
    status: ApprovalStatus,
    content_snapshot: Value,
    content_digest: String,
    expires_at: DateTime<Utc>,
    approver_id: Option<String>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl Approval {
    /// Creates a pending approval for the given content snapshot.
    #[must_use]
    pub fn new_pending(
        task_id: TaskId,
        content_snapshot: Value,
        expires_at: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Self {
        let digest = content_digest(&content_snapshot);
        Self {
            id: ApprovalId::new(),
            task_id,
            status: ApprovalStatus::Pending,
            content_snapshot,
            content_digest: digest,
            expires_at,
            approver_id: None,
            created_at: clock.utc(),
            resolved_at: None,
        }
    }

    /// Creates an already-resolved auto-approval row.
    #[must_use]
    pub fn new_auto_approved(task_id: TaskId, content_snapshot: Value, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let digest = content_digest(&content_snapshot);
        Self {
            id: ApprovalId::new(),
            task_id,
            status: ApprovalStatus::AutoApproved,
            content_snapshot,
            content_digest: digest,
            expires_at: timestamp,
            approver_id: None,
            created_at: timestamp,
            resolved_at: Some(timestamp),
        }
    }

    /// Returns the approval identifier.
    #[must_use]
    pub const fn id(&self) -> ApprovalId {
        self.id
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the resolution status.
    #[must_use]
    pub const fn status(&self) -> ApprovalStatus {
        self.status
    }

    /// Returns the content snapshot under approval.
    #[must_use]
    pub const fn content_snapshot(&self) -> &Value {
        &self.content_snapshot
    }

    /// Returns the hex SHA-256 digest of the content snapshot.
    #[must_use]
    pub fn content_digest(&self) -> &str {
        &self.content_digest
    }

    /// Returns the expiry deadline.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the approver identifier for human resolutions.
    #[must_use]
    pub fn approver_id(&self) -> Option<&str> {
        self.approver_id.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the approval was resolved, if it has been.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns whether the approval is still awaiting a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ApprovalStatus::Pending)
    }

    /// Returns whether the expiry deadline has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns whether `content` still matches the approved snapshot.
    #[must_use]
    pub fn matches_content(&self, content: &Value) -> bool {
        content_digest(content) == self.content_digest
    }

    /// Resolves the approval as approved by a human.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ApprovalNotPending`] when already resolved.
    pub fn approve(
        &mut self,
        approver_id: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.resolve(ApprovalStatus::Approved, Some(approver_id.into()), clock)
    }

    /// Resolves the approval as rejected by a human.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ApprovalNotPending`] when already resolved.
    pub fn reject(
        &mut self,
        approver_id: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.resolve(ApprovalStatus::Rejected, Some(approver_id.into()), clock)
    }

    /// Resolves the approval as expired.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ApprovalNotPending`] when already resolved.
    pub fn expire(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.resolve(ApprovalStatus::Expired, None, clock)
    }

    fn resolve(
        &mut self,
        status: ApprovalStatus,
        approver_id: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.is_pending() {
            return Err(TaskDomainError::ApprovalNotPending(self.id));
        }
        self.status = status;
        self.approver_id = approver_id;
        self.resolved_at = Some(clock.utc());
        Ok(())
    }
}

/// Computes the hex SHA-256 digest of a JSON content document.
fn content_digest(content: &Value) -> String {
    let serialized = serde_json::to_vec(content).unwrap_or_default();
    let digest = Sha256::digest(&serialized);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
