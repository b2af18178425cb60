//! Organization, campaign, product, and connector records.
//!
//! The workflow and the policy engine treat these as a record store keyed by
//! id: campaigns resolve to their owning organization and optional product,
//! connectors describe delivery channels, and the organization carries the
//! sandbox flag flipped by an emergency stop. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
