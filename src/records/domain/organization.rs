//! Organization aggregate.

use super::{OrganizationId, RecordDomainError};
use serde::{Deserialize, Serialize};

/// Organization aggregate root.
///
/// The `sandboxed` flag is set by an emergency stop and read by downstream
/// drafting and execution collaborators before they act; it is deliberately
/// an explicit field rather than ambient global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    name: String,
    sandboxed: bool,
}

impl Organization {
    /// Creates an organization with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RecordDomainError::EmptyOrganizationName`] when the name is
    /// empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, RecordDomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RecordDomainError::EmptyOrganizationName);
        }
        Ok(Self {
            id: OrganizationId::new(),
            name,
            sandboxed: false,
        })
    }

    /// Returns the organization identifier.
    #[must_use]
    pub const fn id(&self) -> OrganizationId {
        self.id
    }

    /// Returns the organization name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the organization is sandboxed.
    #[must_use]
    pub const fn is_sandboxed(&self) -> bool {
        self.sandboxed
    }

    /// Places the organization in sandbox mode.
    ///
    /// Idempotent: sandboxing an already-sandboxed organization is a no-op.
    pub fn enter_sandbox(&mut self) {
        self.sandboxed = true;
    }

    /// Lifts sandbox mode.
    pub fn leave_sandbox(&mut self) {
        self.sandboxed = false;
    }
}
