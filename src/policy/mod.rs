//! Compliance policy validation for Herald.
//!
//! Policies are organization-owned rule definitions evaluated at three fixed
//! workflow checkpoints. Each of the nine rule kinds has exactly one checker;
//! the engine selects the kinds applicable to a checkpoint, runs the
//! surviving checkers concurrently, and folds their outputs into a single
//! allow/deny decision with severity semantics. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Rule checkers in [`checkers`]
//! - The validation engine in [`engine`]

pub mod adapters;
pub mod checkers;
pub mod domain;
pub mod engine;
pub mod ports;

#[cfg(test)]
mod tests;
