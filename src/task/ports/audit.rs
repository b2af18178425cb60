//! Audit sink port: append-only trail of state-changing actions.

use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Task the action concerns, when there is one.
    pub task_id: Option<TaskId>,
    /// Who triggered the action; `None` for the workflow itself.
    pub actor: Option<String>,
    /// Dotted action name, e.g. `task.cancelled` or `approval.granted`.
    pub action: String,
    /// Structured supporting detail.
    pub details: Value,
    /// When the action happened.
    pub at: DateTime<Utc>,
}

/// Append-only audit trail contract.
///
/// A sink failure is logged by the caller but never fails the action being
/// audited.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one entry to the trail.
    async fn record(&self, entry: AuditEntry) -> AuditResult<()>;
}

/// Errors returned by audit sink implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
