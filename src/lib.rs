//! Herald: marketing-operations content workflow core.
//!
//! This crate provides the durable task workflow that drives one piece of
//! marketing content from intake to delivery, and the policy validation
//! engine that gates it at three checkpoints (pre-draft, content,
//! pre-execute).
//!
//! # Architecture
//!
//! Herald follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (stores, channels, etc.)
//!
//! # Modules
//!
//! - [`records`]: Organization, campaign, product, and connector records
//! - [`policy`]: Compliance policies, rule checkers, and the validation engine
//! - [`task`]: Task lifecycle, approvals, and the workflow orchestrator

pub mod policy;
pub mod records;
pub mod task;
