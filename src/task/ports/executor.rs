//! Channel executor port: delivers final content through a connector.

use crate::records::domain::Connector;
use crate::task::domain::Task;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Contract for delivery through an external channel.
///
/// Implementations translate the task's final content into the channel's API
/// calls and return a JSON execution result (delivery identifiers, spend in
/// `costCents`, and whatever else the channel reports).
#[async_trait]
pub trait ChannelExecutor: Send + Sync {
    /// Delivers the task's final content through the connector's channel.
    async fn execute(&self, task: &Task, connector: &Connector) -> ExecutorResult<Value>;
}

/// Errors returned by executor implementations.
///
/// All execution failures are treated as retryable up to the configured
/// attempt cap.
#[derive(Debug, Clone, Error)]
#[error("channel execution failed: {0}")]
pub struct ExecutorError(pub String);
