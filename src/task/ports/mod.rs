//! Port contracts for the task workflow context.

mod audit;
mod drafter;
mod events;
mod executor;
mod metrics;
mod repository;

pub use audit::{AuditEntry, AuditError, AuditResult, AuditSink};
pub use drafter::{ContentDrafter, DrafterError, DrafterResult};
pub use events::{EventError, EventResult, EventSink};
pub use executor::{ChannelExecutor, ExecutorError, ExecutorResult};
pub use metrics::{MetricsCollector, MetricsError, MetricsResult};
pub use repository::{
    ApprovalRepository, ApprovalRepositoryError, ApprovalRepositoryResult, TaskRepository,
    TaskRepositoryError, TaskRepositoryResult,
};
