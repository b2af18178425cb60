//! Policy aggregate root and severity.

use super::{ParsePolicySeverityError, PolicyId, PolicyKind, PolicyRule};
use crate::records::domain::{OrganizationId, ProductId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a violated policy affects the validation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySeverity {
    /// Logged only; never affects the verdict.
    Warn,
    /// Surfaced for human attention; does not block by itself.
    Escalate,
    /// Denies the validation outright.
    Block,
}

impl PolicySeverity {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Escalate => "escalate",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for PolicySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PolicySeverity {
    type Error = ParsePolicySeverityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "warn" => Ok(Self::Warn),
            "escalate" => Ok(Self::Escalate),
            "block" => Ok(Self::Block),
            _ => Err(ParsePolicySeverityError(value.to_owned())),
        }
    }
}

/// Policy aggregate root.
///
/// Authored by administrative tooling outside the core; read-only from the
/// workflow's perspective. A policy scoped to a product applies only to tasks
/// whose campaign targets that product; an unscoped policy applies
/// organization-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    id: PolicyId,
    organization_id: OrganizationId,
    product_id: Option<ProductId>,
    name: String,
    severity: PolicySeverity,
    active: bool,
    rule: PolicyRule,
}

impl Policy {
    /// Creates an active, organization-wide policy.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        name: impl Into<String>,
        severity: PolicySeverity,
        rule: PolicyRule,
    ) -> Self {
        Self {
            id: PolicyId::new(),
            organization_id,
            product_id: None,
            name: name.into(),
            severity,
            active: true,
            rule,
        }
    }

    /// Scopes the policy to one product.
    #[must_use]
    pub const fn scoped_to_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Deactivates the policy; inactive policies are never evaluated.
    #[must_use]
    pub const fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns the policy identifier.
    #[must_use]
    pub const fn id(&self) -> PolicyId {
        self.id
    }

    /// Returns the owning organization identifier.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the product scope, if any.
    #[must_use]
    pub const fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> PolicySeverity {
        self.severity
    }

    /// Returns whether the policy is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the rule payload.
    #[must_use]
    pub const fn rule(&self) -> &PolicyRule {
        &self.rule
    }

    /// Returns the rule kind.
    #[must_use]
    pub const fn kind(&self) -> PolicyKind {
        self.rule.kind()
    }
}
