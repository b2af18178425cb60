//! Error types for record domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing record domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordDomainError {
    /// The organization name is empty after trimming.
    #[error("organization name must not be empty")]
    EmptyOrganizationName,

    /// A connector rate limit of zero would reject every execution.
    #[error("connector rate limit must be positive")]
    ZeroRateLimit,
}

/// Error returned while parsing campaign statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown campaign status: {0}")]
pub struct ParseCampaignStatusError(pub String);

/// Error returned while parsing channel types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown channel type: {0}")]
pub struct ParseChannelTypeError(pub String);
