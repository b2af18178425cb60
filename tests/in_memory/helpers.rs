//! Shared harness and scripted doubles for the in-memory integration tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use herald::policy::adapters::memory::InMemoryPolicyRepository;
use herald::policy::engine::PolicyEngine;
use herald::records::adapters::memory::InMemoryRecordStore;
use herald::records::domain::{Campaign, ChannelType, Connector, Organization};
use herald::task::adapters::{
    InMemoryActivityStore, InMemoryApprovalRepository, InMemoryAuditSink, InMemoryEventSink,
    InMemoryTaskRepository,
};
use herald::task::domain::{Task, TaskType};
use herald::task::ports::{
    ChannelExecutor, ContentDrafter, DrafterError, DrafterResult, ExecutorError, ExecutorResult,
    MetricsCollector, MetricsError, MetricsResult,
};
use herald::task::services::{TaskWorkflow, TaskWorkflowParams, WorkflowConfig};
use mockable::DefaultClock;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Drafter double: fails a scripted number of times, then returns fixed
/// content.
pub struct ScriptedDrafter {
    content: Value,
    failures_left: AtomicU32,
    calls: AtomicUsize,
}

impl ScriptedDrafter {
    pub fn new(content: Value) -> Self {
        Self {
            content,
            failures_left: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_times(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentDrafter for ScriptedDrafter {
    async fn draft(&self, _task: &Task) -> DrafterResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
        {
            return Err(DrafterError("generator timeout".to_owned()));
        }
        Ok(self.content.clone())
    }
}

/// Executor double: fails a scripted number of times, then reports delivery.
pub struct ScriptedExecutor {
    failures_left: AtomicU32,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            failures_left: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_times(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelExecutor for ScriptedExecutor {
    async fn execute(&self, _task: &Task, _connector: &Connector) -> ExecutorResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
        {
            return Err(ExecutorError("downstream 503".to_owned()));
        }
        Ok(json!({ "deliveryId": "dlv-1", "costCents": 250 }))
    }
}

/// Metrics double: fails a scripted number of times, then returns fixed
/// engagement numbers.
pub struct ScriptedMetrics {
    failures_left: AtomicU32,
}

impl ScriptedMetrics {
    pub fn new() -> Self {
        Self {
            failures_left: AtomicU32::new(0),
        }
    }

    pub fn fail_times(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl MetricsCollector for ScriptedMetrics {
    async fn collect(&self, _task: &Task) -> MetricsResult<Value> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
        {
            return Err(MetricsError("metrics api offline".to_owned()));
        }
        Ok(json!({ "opens": 42, "clicks": 7 }))
    }
}

/// Fully wired in-memory workflow.
pub struct Harness {
    pub records: InMemoryRecordStore,
    pub policies: InMemoryPolicyRepository,
    pub tasks: InMemoryTaskRepository,
    pub approvals: InMemoryApprovalRepository,
    pub audit: InMemoryAuditSink,
    pub events: InMemoryEventSink,
    pub drafter: Arc<ScriptedDrafter>,
    pub executor: Arc<ScriptedExecutor>,
    pub workflow: Arc<TaskWorkflow<DefaultClock>>,
    pub organization: Organization,
    pub campaign: Campaign,
}

/// Configuration with no metrics delay, for fast tests.
pub fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        metrics_delay: std::time::Duration::ZERO,
        ..WorkflowConfig::default()
    }
}

pub fn harness(config: WorkflowConfig) -> Harness {
    harness_with(
        config,
        ScriptedDrafter::new(json!({ "subject": "Hello", "body": "Fresh savings inside" })),
        ScriptedExecutor::new(),
        ScriptedMetrics::new(),
    )
}

pub fn harness_with(
    config: WorkflowConfig,
    drafter: ScriptedDrafter,
    executor: ScriptedExecutor,
    metrics: ScriptedMetrics,
) -> Harness {
    let records = InMemoryRecordStore::new();
    let policies = InMemoryPolicyRepository::new();
    let tasks = InMemoryTaskRepository::new();
    let approvals = InMemoryApprovalRepository::new();
    let audit = InMemoryAuditSink::new();
    let events = InMemoryEventSink::new();

    let organization = Organization::new("Acme Marketing").expect("valid organization name");
    let campaign = Campaign::new(organization.id(), None, "Spring launch");
    records.insert_organization(organization.clone());
    records.insert_campaign(campaign.clone());

    let records_arc: Arc<InMemoryRecordStore> = Arc::new(records.clone());
    let activity = Arc::new(InMemoryActivityStore::new(
        tasks.clone(),
        records_arc.clone(),
    ));
    let clock = Arc::new(DefaultClock);
    let engine = Arc::new(PolicyEngine::new(
        Arc::new(policies.clone()),
        records_arc.clone(),
        activity.clone(),
        clock.clone(),
    ));

    let drafter = Arc::new(drafter);
    let executor = Arc::new(executor);
    let workflow = Arc::new(TaskWorkflow::new(
        TaskWorkflowParams {
            tasks: Arc::new(tasks.clone()),
            approvals: Arc::new(approvals.clone()),
            records: records_arc,
            activity,
            engine,
            drafter: drafter.clone(),
            executor: executor.clone(),
            metrics: Arc::new(metrics),
            audit: Arc::new(audit.clone()),
            events: Arc::new(events.clone()),
            clock,
        },
        config,
    ));

    Harness {
        records,
        policies,
        tasks,
        approvals,
        audit,
        events,
        drafter,
        executor,
        workflow,
        organization,
        campaign,
    }
}

impl Harness {
    /// Seeds an email connector, optionally demanding approval.
    pub fn email_connector(&self, requires_approval: bool) -> Connector {
        let mut connector =
            Connector::new(self.organization.id(), ChannelType::Email, "Campaign ESP");
        if requires_approval {
            connector = connector.with_approval_required();
        }
        self.records.insert_connector(connector.clone());
        connector
    }

    /// Builds a queued email task scheduled an hour ago.
    pub fn email_task(&self) -> Task {
        Task::new(
            self.campaign.id(),
            TaskType::SingleEmail,
            "Spring promo",
            Utc::now() - Duration::hours(1),
            &DefaultClock,
        )
        .expect("valid task title")
    }
}
