//! Event sink port: notifications emitted as the workflow finishes tasks.

use crate::task::domain::Task;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for event emission.
pub type EventResult<T> = Result<T, EventError>;

/// Outbound notification contract.
///
/// Emission failures are logged by the caller but never fail the workflow;
/// downstream consumers reconcile from the store.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Signals that metrics were collected and the task is evaluated.
    async fn metrics_collected(&self, task: &Task, metrics: &Value) -> EventResult<()>;
}

/// Errors returned by event sink implementations.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    /// Delivery failure to the downstream consumer.
    #[error("event delivery error: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl EventError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
