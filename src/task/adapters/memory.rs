//! In-memory adapters for the task workflow ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::policy::ports::{
    ActivityScope, ActivityStore, ActivityStoreError, ActivityStoreResult,
};
use crate::records::domain::CampaignId;
use crate::records::ports::RecordStore;
use crate::task::domain::{Approval, ApprovalId, Task, TaskId, TaskStatus, TaskType};
use crate::task::ports::{
    ApprovalRepository, ApprovalRepositoryError, ApprovalRepositoryResult, AuditEntry, AuditError,
    AuditResult, AuditSink, EventResult, EventSink, TaskRepository, TaskRepositoryError,
    TaskRepositoryResult,
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored task.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the lock is poisoned.
    pub fn snapshot(&self) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(task_lock_error)?;
        Ok(tasks.values().cloned().collect())
    }
}

fn task_lock_error(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.tasks.write().map_err(task_lock_error)?;
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.tasks.write().map_err(task_lock_error)?;
        if !tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(task_lock_error)?;
        Ok(tasks.get(&id).cloned())
    }

    async fn list_due_queued(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(task_lock_error)?;
        Ok(tasks
            .values()
            .filter(|task| task.status() == TaskStatus::Queued && task.scheduled_at() <= now)
            .cloned()
            .collect())
    }

    async fn list_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(task_lock_error)?;
        Ok(tasks
            .values()
            .filter(|task| campaign_ids.contains(&task.campaign_id()))
            .cloned()
            .collect())
    }
}

/// Thread-safe in-memory approval repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApprovalRepository {
    approvals: Arc<RwLock<HashMap<ApprovalId, Approval>>>,
}

impl InMemoryApprovalRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn approval_lock_error(err: impl std::fmt::Display) -> ApprovalRepositoryError {
    ApprovalRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ApprovalRepository for InMemoryApprovalRepository {
    async fn store(&self, approval: &Approval) -> ApprovalRepositoryResult<()> {
        let mut approvals = self.approvals.write().map_err(approval_lock_error)?;
        let pending_exists = approval.is_pending()
            && approvals
                .values()
                .any(|existing| existing.task_id() == approval.task_id() && existing.is_pending());
        if pending_exists {
            return Err(ApprovalRepositoryError::PendingExists(approval.task_id()));
        }
        approvals.insert(approval.id(), approval.clone());
        Ok(())
    }

    async fn update(&self, approval: &Approval) -> ApprovalRepositoryResult<()> {
        let mut approvals = self.approvals.write().map_err(approval_lock_error)?;
        if !approvals.contains_key(&approval.id()) {
            return Err(ApprovalRepositoryError::NotFound(approval.id()));
        }
        approvals.insert(approval.id(), approval.clone());
        Ok(())
    }

    async fn find_pending_by_task(
        &self,
        task_id: TaskId,
    ) -> ApprovalRepositoryResult<Option<Approval>> {
        let approvals = self.approvals.read().map_err(approval_lock_error)?;
        Ok(approvals
            .values()
            .find(|approval| approval.task_id() == task_id && approval.is_pending())
            .cloned())
    }

    async fn list_expired_pending(
        &self,
        now: DateTime<Utc>,
    ) -> ApprovalRepositoryResult<Vec<Approval>> {
        let approvals = self.approvals.read().map_err(approval_lock_error)?;
        Ok(approvals
            .values()
            .filter(|approval| approval.is_pending() && approval.is_expired_at(now))
            .cloned()
            .collect())
    }
}

/// Activity store over the in-memory task repository.
///
/// Completion time is approximated by the task's `updated_at` timestamp,
/// which is exact for tasks that finished on their last mutation.
pub struct InMemoryActivityStore {
    tasks: InMemoryTaskRepository,
    records: Arc<dyn RecordStore>,
}

impl InMemoryActivityStore {
    /// Creates an activity view over the given task repository, using the
    /// record store to resolve campaign ownership for product and
    /// organization scopes.
    #[must_use]
    pub fn new(tasks: InMemoryTaskRepository, records: Arc<dyn RecordStore>) -> Self {
        Self { tasks, records }
    }

    async fn finished_tasks_in_scope(
        &self,
        scope: ActivityScope,
        since: Option<DateTime<Utc>>,
    ) -> ActivityStoreResult<Vec<Task>> {
        let snapshot = self
            .tasks
            .snapshot()
            .map_err(ActivityStoreError::persistence)?;
        let mut matched = Vec::new();
        for task in snapshot {
            if !matches!(task.status(), TaskStatus::Completed | TaskStatus::Evaluated) {
                continue;
            }
            if let Some(cutoff) = since {
                if task.updated_at() < cutoff {
                    continue;
                }
            }
            if self.in_scope(&task, scope).await? {
                matched.push(task);
            }
        }
        Ok(matched)
    }

    async fn in_scope(&self, task: &Task, scope: ActivityScope) -> ActivityStoreResult<bool> {
        match scope {
            ActivityScope::Connector(connector_id) => {
                Ok(task.connector_id() == Some(connector_id))
            }
            ActivityScope::Campaign(campaign_id) => Ok(task.campaign_id() == campaign_id),
            ActivityScope::Product(product_id) => {
                let campaign = self
                    .records
                    .find_campaign(task.campaign_id())
                    .await
                    .map_err(ActivityStoreError::persistence)?;
                Ok(campaign.is_some_and(|campaign| campaign.product_id() == Some(product_id)))
            }
            ActivityScope::Organization(organization_id) => {
                let campaign = self
                    .records
                    .find_campaign(task.campaign_id())
                    .await
                    .map_err(ActivityStoreError::persistence)?;
                Ok(campaign.is_some_and(|campaign| campaign.organization_id() == organization_id))
            }
        }
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn completed_task_count(
        &self,
        scope: ActivityScope,
        since: Option<DateTime<Utc>>,
        task_types: Option<&[TaskType]>,
    ) -> ActivityStoreResult<u64> {
        let matched = self.finished_tasks_in_scope(scope, since).await?;
        let count = matched
            .iter()
            .filter(|task| task_types.is_none_or(|types| types.contains(&task.task_type())))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn spend_cents(
        &self,
        scope: ActivityScope,
        since: Option<DateTime<Utc>>,
    ) -> ActivityStoreResult<i64> {
        let matched = self.finished_tasks_in_scope(scope, since).await?;
        Ok(matched
            .iter()
            .filter_map(Task::execution_result)
            .filter_map(|result| result.get("costCents"))
            .filter_map(Value::as_i64)
            .sum())
    }
}

/// In-memory audit sink retaining entries in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the trail.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the lock is poisoned.
    pub fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|err| AuditError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(entries.clone())
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> AuditResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| AuditError::persistence(std::io::Error::other(err.to_string())))?;
        entries.push(entry);
        Ok(())
    }
}

/// In-memory event sink retaining emitted notifications.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<RwLock<Vec<(TaskId, Value)>>>,
}

impl InMemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `(task, metrics)` pairs emitted so far.
    #[must_use]
    pub fn emitted(&self) -> Vec<(TaskId, Value)> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn metrics_collected(&self, task: &Task, metrics: &Value) -> EventResult<()> {
        if let Ok(mut events) = self.events.write() {
            events.push((task.id(), metrics.clone()));
        }
        Ok(())
    }
}
