//! Content drafter port: produces draft content for a task.

use crate::task::domain::Task;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type for drafter operations.
pub type DrafterResult<T> = Result<T, DrafterError>;

/// Contract for the external content-generation service.
///
/// Drafting is treated as a black box: the workflow hands over the task and
/// receives a JSON content document shaped for the task's type.
#[async_trait]
pub trait ContentDrafter: Send + Sync {
    /// Produces draft content for the task.
    async fn draft(&self, task: &Task) -> DrafterResult<Value>;
}

/// Errors returned by drafter implementations.
///
/// All drafter failures are treated as retryable up to the configured
/// attempt cap.
#[derive(Debug, Clone, Error)]
#[error("draft generation failed: {0}")]
pub struct DrafterError(pub String);
