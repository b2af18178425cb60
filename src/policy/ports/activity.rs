//! Activity store port: aggregate task counts and spend sums consulted by
//! the rate-limit and budget checkers.
//!
//! Reads are unlocked aggregate queries; a burst of concurrent tasks may
//! transiently exceed a limit by a small margin, an accepted bounded race
//! for this domain.

use crate::records::domain::{CampaignId, ConnectorId, OrganizationId, ProductId};
use crate::task::domain::TaskType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for activity store operations.
pub type ActivityStoreResult<T> = Result<T, ActivityStoreError>;

/// Scope an aggregate query counts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityScope {
    /// Tasks delivered through one connector.
    Connector(ConnectorId),
    /// Tasks in one campaign.
    Campaign(CampaignId),
    /// Tasks for one product.
    Product(ProductId),
    /// Tasks across one organization.
    Organization(OrganizationId),
}

/// Aggregate-query contract over historical task activity.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Counts completed or evaluated tasks in scope, optionally restricted to
    /// a time cutoff and a set of task types.
    async fn completed_task_count(
        &self,
        scope: ActivityScope,
        since: Option<DateTime<Utc>>,
        task_types: Option<&[TaskType]>,
    ) -> ActivityStoreResult<u64>;

    /// Sums `costCents` across completed tasks' execution results in scope,
    /// optionally restricted to a time cutoff.
    async fn spend_cents(
        &self,
        scope: ActivityScope,
        since: Option<DateTime<Utc>>,
    ) -> ActivityStoreResult<i64>;
}

/// Errors returned by activity store implementations.
#[derive(Debug, Clone, Error)]
pub enum ActivityStoreError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ActivityStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
