//! Policy store port: loads active rule definitions for an organization.

use crate::policy::domain::Policy;
use crate::records::domain::{OrganizationId, ProductId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for policy repository operations.
pub type PolicyRepositoryResult<T> = Result<T, PolicyRepositoryError>;

/// Policy persistence contract.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Returns every active policy belonging to the organization that is
    /// either unscoped or scoped to the given product.
    ///
    /// Ordering: `block`-severity policies first, as a readability hint for
    /// humans scanning logs; evaluation order does not affect correctness.
    ///
    /// # Errors
    ///
    /// A store failure is fatal for the validation call and must propagate;
    /// finding zero rows is a valid empty result, not an error.
    async fn load_active(
        &self,
        organization_id: OrganizationId,
        product_id: Option<ProductId>,
    ) -> PolicyRepositoryResult<Vec<Policy>>;
}

/// Errors returned by policy repository implementations.
#[derive(Debug, Clone, Error)]
pub enum PolicyRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PolicyRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
