//! Metrics collector port: fetches post-delivery performance data.

use crate::task::domain::Task;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type for metrics collection.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Contract for fetching delivery metrics from the channel after execution.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Collects metrics for a completed task, as a JSON object merged into
    /// the task's execution result.
    async fn collect(&self, task: &Task) -> MetricsResult<Value>;
}

/// Errors returned by metrics collector implementations.
///
/// A metrics failure never un-delivers anything; the task stays completed
/// and collection is retried on a later resume.
#[derive(Debug, Clone, Error)]
#[error("metrics collection failed: {0}")]
pub struct MetricsError(pub String);
