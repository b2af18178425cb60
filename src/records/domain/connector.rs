//! Delivery-channel connector configuration.

use super::{ConnectorId, OrganizationId, ParseChannelTypeError, RecordDomainError};
use crate::task::domain::TaskType;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of third-party delivery channel a connector talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Email service provider.
    Email,
    /// Content management system (blog posts, landing pages).
    Cms,
    /// Social network publishing API.
    Social,
    /// Paid advertising platform.
    Ads,
}

impl ChannelType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Cms => "cms",
            Self::Social => "social",
            Self::Ads => "ads",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ChannelType {
    type Error = ParseChannelTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "email" => Ok(Self::Email),
            "cms" => Ok(Self::Cms),
            "social" => Ok(Self::Social),
            "ads" => Ok(Self::Ads),
            _ => Err(ParseChannelTypeError(value.to_owned())),
        }
    }
}

/// Per-connector execution rate limits, checked immediately before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectorRateLimits {
    /// Maximum completed executions per rolling hour, if capped.
    pub per_hour: Option<u32>,
    /// Maximum completed executions per rolling day, if capped.
    pub per_day: Option<u32>,
}

impl ConnectorRateLimits {
    /// Creates validated rate limits.
    ///
    /// # Errors
    ///
    /// Returns [`RecordDomainError::ZeroRateLimit`] when either cap is zero.
    pub const fn new(
        per_hour: Option<u32>,
        per_day: Option<u32>,
    ) -> Result<Self, RecordDomainError> {
        if matches!(per_hour, Some(0)) || matches!(per_day, Some(0)) {
            return Err(RecordDomainError::ZeroRateLimit);
        }
        Ok(Self { per_hour, per_day })
    }
}

/// Connector aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    id: ConnectorId,
    organization_id: OrganizationId,
    channel: ChannelType,
    name: String,
    requires_approval: bool,
    auto_approve_types: Vec<TaskType>,
    rate_limits: ConnectorRateLimits,
    last_used_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl Connector {
    /// Creates a connector with a fresh identifier and no rate caps.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        channel: ChannelType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: ConnectorId::new(),
            organization_id,
            channel,
            name: name.into(),
            requires_approval: false,
            auto_approve_types: Vec::new(),
            rate_limits: ConnectorRateLimits::default(),
            last_used_at: None,
            last_error: None,
        }
    }

    /// Requires human approval before executing through this connector.
    #[must_use]
    pub const fn with_approval_required(mut self) -> Self {
        self.requires_approval = true;
        self
    }

    /// Sets task types exempt from the approval requirement.
    #[must_use]
    pub fn with_auto_approve_types(mut self, types: impl IntoIterator<Item = TaskType>) -> Self {
        self.auto_approve_types = types.into_iter().collect();
        self
    }

    /// Sets execution rate limits.
    #[must_use]
    pub const fn with_rate_limits(mut self, limits: ConnectorRateLimits) -> Self {
        self.rate_limits = limits;
        self
    }

    /// Returns the connector identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectorId {
        self.id
    }

    /// Returns the owning organization identifier.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the channel type.
    #[must_use]
    pub const fn channel(&self) -> ChannelType {
        self.channel
    }

    /// Returns the connector name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the execution rate limits.
    #[must_use]
    pub const fn rate_limits(&self) -> ConnectorRateLimits {
        self.rate_limits
    }

    /// Returns when the connector last executed successfully, if ever.
    #[must_use]
    pub const fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    /// Returns the most recent execution error, if one is outstanding.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns whether a task of the given type needs human approval.
    ///
    /// Approval is required when the connector demands it and the type is not
    /// in the auto-approve allowlist.
    #[must_use]
    pub fn approval_required_for(&self, task_type: TaskType) -> bool {
        self.requires_approval && !self.auto_approve_types.contains(&task_type)
    }

    /// Records a successful execution, clearing any outstanding error.
    pub fn mark_used(&mut self, clock: &impl Clock) {
        self.last_used_at = Some(clock.utc());
        self.last_error = None;
    }

    /// Records an execution failure.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}
