//! Services orchestrating the task workflow.

mod config;
mod emergency;
mod heartbeat;
mod runner;

pub use config::WorkflowConfig;
pub use emergency::{EmergencyStop, EmergencyStopReport};
pub use heartbeat::{Heartbeat, HeartbeatReport};
pub use runner::{RunOutcome, TaskWorkflow, TaskWorkflowParams, WorkflowError};
