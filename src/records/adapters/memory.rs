//! In-memory record store for workflow and engine tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::records::{
    domain::{
        Campaign, CampaignId, Connector, ConnectorId, Organization, OrganizationId, Product,
        ProductId,
    },
    ports::{RecordStore, RecordStoreError, RecordStoreResult},
};

/// Thread-safe in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<RwLock<InMemoryRecordState>>,
}

#[derive(Debug, Default)]
struct InMemoryRecordState {
    organizations: HashMap<OrganizationId, Organization>,
    campaigns: HashMap<CampaignId, Campaign>,
    products: HashMap<ProductId, Product>,
    connectors: HashMap<ConnectorId, Connector>,
}

impl InMemoryRecordStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an organization.
    pub fn insert_organization(&self, organization: Organization) {
        if let Ok(mut state) = self.state.write() {
            state
                .organizations
                .insert(organization.id(), organization);
        }
    }

    /// Seeds a campaign.
    pub fn insert_campaign(&self, campaign: Campaign) {
        if let Ok(mut state) = self.state.write() {
            state.campaigns.insert(campaign.id(), campaign);
        }
    }

    /// Seeds a product.
    pub fn insert_product(&self, product: Product) {
        if let Ok(mut state) = self.state.write() {
            state.products.insert(product.id(), product);
        }
    }

    /// Seeds a connector.
    pub fn insert_connector(&self, connector: Connector) {
        if let Ok(mut state) = self.state.write() {
            state.connectors.insert(connector.id(), connector);
        }
    }
}

fn lock_error(err: impl std::fmt::Display) -> RecordStoreError {
    RecordStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> RecordStoreResult<Option<Organization>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.organizations.get(&id).cloned())
    }

    async fn update_organization(&self, organization: &Organization) -> RecordStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.organizations.contains_key(&organization.id()) {
            return Err(RecordStoreError::OrganizationNotFound(organization.id()));
        }
        state
            .organizations
            .insert(organization.id(), organization.clone());
        Ok(())
    }

    async fn find_campaign(&self, id: CampaignId) -> RecordStoreResult<Option<Campaign>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.campaigns.get(&id).cloned())
    }

    async fn list_campaigns_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> RecordStoreResult<Vec<Campaign>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .campaigns
            .values()
            .filter(|campaign| campaign.organization_id() == organization_id)
            .cloned()
            .collect())
    }

    async fn update_campaign(&self, campaign: &Campaign) -> RecordStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.campaigns.contains_key(&campaign.id()) {
            return Err(RecordStoreError::CampaignNotFound(campaign.id()));
        }
        state.campaigns.insert(campaign.id(), campaign.clone());
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> RecordStoreResult<Option<Product>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.products.get(&id).cloned())
    }

    async fn find_connector(&self, id: ConnectorId) -> RecordStoreResult<Option<Connector>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.connectors.get(&id).cloned())
    }

    async fn update_connector(&self, connector: &Connector) -> RecordStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.connectors.contains_key(&connector.id()) {
            return Err(RecordStoreError::ConnectorNotFound(connector.id()));
        }
        state.connectors.insert(connector.id(), connector.clone());
        Ok(())
    }
}
