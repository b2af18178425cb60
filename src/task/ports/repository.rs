//! Persistence ports for tasks and approvals.

use crate::records::domain::CampaignId;
use crate::task::domain::{Approval, ApprovalId, Task, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// The workflow persists after every status transition, so a crashed run can
/// resume from the stored status alone.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns queued tasks whose scheduled time has arrived.
    async fn list_due_queued(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every task belonging to any of the given campaigns.
    async fn list_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Result type for approval repository operations.
pub type ApprovalRepositoryResult<T> = Result<T, ApprovalRepositoryError>;

/// Approval persistence contract.
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// Stores a new approval record.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalRepositoryError::PendingExists`] when the task
    /// already has a pending approval; at most one may be outstanding per
    /// task.
    async fn store(&self, approval: &Approval) -> ApprovalRepositoryResult<()>;

    /// Persists changes to an existing approval record.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalRepositoryError::NotFound`] when the record does not
    /// exist.
    async fn update(&self, approval: &Approval) -> ApprovalRepositoryResult<()>;

    /// Finds the pending approval for a task, if one is outstanding.
    async fn find_pending_by_task(
        &self,
        task_id: TaskId,
    ) -> ApprovalRepositoryResult<Option<Approval>>;

    /// Returns pending approvals whose expiry deadline has passed.
    async fn list_expired_pending(
        &self,
        now: DateTime<Utc>,
    ) -> ApprovalRepositoryResult<Vec<Approval>>;
}

/// Errors returned by approval repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ApprovalRepositoryError {
    /// The approval record was not found.
    #[error("approval not found: {0}")]
    NotFound(ApprovalId),

    /// The task already has a pending approval.
    #[error("task already has a pending approval: {0}")]
    PendingExists(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ApprovalRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
