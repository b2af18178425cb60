//! Port contracts for the policy context.

mod activity;
mod repository;

pub use activity::{ActivityScope, ActivityStore, ActivityStoreError, ActivityStoreResult};
pub use repository::{PolicyRepository, PolicyRepositoryError, PolicyRepositoryResult};
