//! Adapter implementations for the policy context.

pub mod memory;
