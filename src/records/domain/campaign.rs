//! Campaign aggregate and status.

use super::{CampaignId, OrganizationId, ParseCampaignStatusError, ProductId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Campaign lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Campaign is planned but not yet running.
    Planned,
    /// Campaign is actively producing tasks.
    Active,
    /// Campaign has been paused (manually or by an emergency stop).
    Paused,
    /// Campaign has finished.
    Completed,
}

impl CampaignStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Returns whether an emergency stop pauses campaigns in this status.
    #[must_use]
    pub const fn is_stoppable(self) -> bool {
        matches!(self, Self::Planned | Self::Active)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CampaignStatus {
    type Error = ParseCampaignStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "planned" => Ok(Self::Planned),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseCampaignStatusError(value.to_owned())),
        }
    }
}

/// Campaign aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    id: CampaignId,
    organization_id: OrganizationId,
    product_id: Option<ProductId>,
    name: String,
    status: CampaignStatus,
}

impl Campaign {
    /// Creates an active campaign.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        product_id: Option<ProductId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: CampaignId::new(),
            organization_id,
            product_id,
            name: name.into(),
            status: CampaignStatus::Active,
        }
    }

    /// Returns the campaign identifier.
    #[must_use]
    pub const fn id(&self) -> CampaignId {
        self.id
    }

    /// Returns the owning organization identifier.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the associated product identifier, if any.
    #[must_use]
    pub const fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    /// Returns the campaign name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the campaign status.
    #[must_use]
    pub const fn status(&self) -> CampaignStatus {
        self.status
    }

    /// Sets the campaign status.
    pub fn set_status(&mut self, status: CampaignStatus) {
        self.status = status;
    }
}
