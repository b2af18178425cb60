//! Product aggregate with its verified-claims list.

use super::{OrganizationId, ProductId};
use serde::{Deserialize, Serialize};

/// Product record carrying the verified-claims list consulted by the
/// claim-lock checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    organization_id: OrganizationId,
    name: String,
    verified_claims: Vec<String>,
}

impl Product {
    /// Creates a product with a fresh identifier.
    #[must_use]
    pub fn new(organization_id: OrganizationId, name: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(),
            organization_id,
            name: name.into(),
            verified_claims: Vec::new(),
        }
    }

    /// Sets the verified-claims list.
    #[must_use]
    pub fn with_verified_claims(mut self, claims: impl IntoIterator<Item = String>) -> Self {
        self.verified_claims = claims.into_iter().collect();
        self
    }

    /// Returns the product identifier.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    /// Returns the owning organization identifier.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the product name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the verified claims approved for this product.
    #[must_use]
    pub fn verified_claims(&self) -> &[String] {
        &self.verified_claims
    }
}
