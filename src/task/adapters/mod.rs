//! Adapter implementations for the task workflow ports.

mod memory;

pub use memory::{
    InMemoryActivityStore, InMemoryApprovalRepository, InMemoryAuditSink, InMemoryEventSink,
    InMemoryTaskRepository,
};
