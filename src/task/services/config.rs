//! Workflow tuning knobs.

use chrono::Duration;

/// Timing and retry configuration for the task workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// How long a pending approval stays open before it expires.
    pub approval_timeout: Duration,
    /// Wait between delivery and metrics collection, giving the channel time
    /// to register engagement.
    pub metrics_delay: std::time::Duration,
    /// Attempts per external call (drafting, execution, metrics) before the
    /// step is given up.
    pub max_step_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            approval_timeout: Duration::hours(72),
            metrics_delay: std::time::Duration::from_secs(300),
            max_step_attempts: 3,
        }
    }
}
