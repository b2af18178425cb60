//! In-memory policy repository for engine and workflow tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::policy::{
    domain::{Policy, PolicyId, PolicySeverity},
    ports::{PolicyRepository, PolicyRepositoryError, PolicyRepositoryResult},
};
use crate::records::domain::{OrganizationId, ProductId};

/// Thread-safe in-memory policy repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicyRepository {
    state: Arc<RwLock<HashMap<PolicyId, Policy>>>,
}

impl InMemoryPolicyRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a policy.
    pub fn insert(&self, policy: Policy) {
        if let Ok(mut state) = self.state.write() {
            state.insert(policy.id(), policy);
        }
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn load_active(
        &self,
        organization_id: OrganizationId,
        product_id: Option<ProductId>,
    ) -> PolicyRepositoryResult<Vec<Policy>> {
        let state = self
            .state
            .read()
            .map_err(|err| PolicyRepositoryError::persistence(std::io::Error::other(err.to_string())))?;
        let mut policies: Vec<Policy> = state
            .values()
            .filter(|policy| policy.is_active())
            .filter(|policy| policy.organization_id() == organization_id)
            .filter(|policy| match policy.product_id() {
                None => true,
                Some(scope) => product_id == Some(scope),
            })
            .cloned()
            .collect();
        // Block-severity policies first, for log readability.
        policies.sort_by_key(|policy| match policy.severity() {
            PolicySeverity::Block => 0,
            PolicySeverity::Escalate => 1,
            PolicySeverity::Warn => 2,
        });
        Ok(policies)
    }
}
