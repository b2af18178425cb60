//! Error types for task domain validation and parsing.

use super::{ApprovalId, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while mutating domain task and approval values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// The requested state transition is not permitted.
    #[error("invalid task state transition for {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current state.
        from: TaskStatus,
        /// Requested state.
        to: TaskStatus,
    },

    /// Approval was requested before any draft content exists.
    #[error("task {0} has no draft content to approve")]
    NoDraftContent(TaskId),

    /// The approval has already been resolved.
    #[error("approval {0} is not pending")]
    ApprovalNotPending(ApprovalId),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing approval statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown approval status: {0}")]
pub struct ParseApprovalStatusError(pub String);

/// Error returned while parsing task types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task type: {0}")]
pub struct ParseTaskTypeError(pub String);
