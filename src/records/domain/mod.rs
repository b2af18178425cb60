//! Domain model for organization-scoped records.
//!
//! These aggregates are authored by administrative tooling outside the core;
//! the workflow reads them and mutates only the narrow fields it owns
//! (campaign pause state, organization sandbox flag, connector bookkeeping).

mod campaign;
mod connector;
mod error;
mod ids;
mod organization;
mod product;

pub use campaign::{Campaign, CampaignStatus};
pub use connector::{ChannelType, Connector, ConnectorRateLimits};
pub use error::{ParseCampaignStatusError, ParseChannelTypeError, RecordDomainError};
pub use ids::{CampaignId, ConnectorId, OrganizationId, ProductId};
pub use organization::Organization;
pub use product::Product;
