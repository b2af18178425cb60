//! Task workflow for Herald.
//!
//! A task is one unit of marketing content production: drafted, validated,
//! approved, delivered through a channel connector, and measured. The
//! workflow is a durable state machine; every transition is persisted, and
//! suspension for human approval survives process restarts. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestrating services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
