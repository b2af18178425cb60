//! Domain model for the content-production task lifecycle.
//!
//! The task aggregate owns the workflow state machine; the approval aggregate
//! records human sign-off with a content digest so that stale or late
//! resolutions are detectable. All infrastructure concerns stay outside the
//! domain boundary.

mod approval;
mod error;
mod ids;
mod task;
mod task_type;

pub use approval::{Approval, ApprovalStatus};
pub use error::{
    ParseApprovalStatusError, ParseTaskStatusError, ParseTaskTypeError, TaskDomainError,
};
pub use ids::{ApprovalId, TaskId};
pub use task::{Task, TaskErrorEntry, TaskStatus, WorkflowStep};
pub use task_type::TaskType;
