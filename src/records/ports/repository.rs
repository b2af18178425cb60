//! Record store port for organization-scoped reference data.

use crate::records::domain::{
    Campaign, CampaignId, Connector, ConnectorId, Organization, OrganizationId, Product, ProductId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for record store operations.
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

/// Read/update contract over organization, campaign, product, and connector
/// records.
///
/// The core never creates or deletes these records; it reads them and writes
/// back only the fields it owns (campaign status, organization sandbox flag,
/// connector bookkeeping).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Finds an organization by identifier.
    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> RecordStoreResult<Option<Organization>>;

    /// Persists organization changes (sandbox flag).
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::OrganizationNotFound`] when the
    /// organization does not exist.
    async fn update_organization(&self, organization: &Organization) -> RecordStoreResult<()>;

    /// Finds a campaign by identifier.
    async fn find_campaign(&self, id: CampaignId) -> RecordStoreResult<Option<Campaign>>;

    /// Returns every campaign owned by the organization.
    async fn list_campaigns_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> RecordStoreResult<Vec<Campaign>>;

    /// Persists campaign changes (status).
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::CampaignNotFound`] when the campaign does
    /// not exist.
    async fn update_campaign(&self, campaign: &Campaign) -> RecordStoreResult<()>;

    /// Finds a product by identifier.
    async fn find_product(&self, id: ProductId) -> RecordStoreResult<Option<Product>>;

    /// Finds a connector by identifier.
    async fn find_connector(&self, id: ConnectorId) -> RecordStoreResult<Option<Connector>>;

    /// Persists connector changes (last-used timestamp, last error).
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::ConnectorNotFound`] when the connector
    /// does not exist.
    async fn update_connector(&self, connector: &Connector) -> RecordStoreResult<()>;
}

/// Errors returned by record store implementations.
#[derive(Debug, Clone, Error)]
pub enum RecordStoreError {
    /// The organization was not found.
    #[error("organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    /// The campaign was not found.
    #[error("campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// The connector was not found.
    #[error("connector not found: {0}")]
    ConnectorNotFound(ConnectorId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RecordStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
