//! Adapter implementations for the records context.

pub mod memory;
