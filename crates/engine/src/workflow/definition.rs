//! Workflow definition and entry point

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::driver::{run_concurrent, run_sequential};
use super::{ActivitySnapshot, WorkflowExecutionError, WorkflowSnapshot, WorkflowState};
use crate::activity::{Action, Activity};
use crate::config::{EngineConfig, ExecutionMode};
use crate::reliability::BackoffStrategy;

/// An ordered, named sequence of activities executed as one logical unit
///
/// The workflow owns its activities; their order is fixed at construction and
/// is the execution order. A workflow runs once: `Pending → Running →
/// {Completed | Failed}`.
///
/// # Example
///
/// ```
/// use flowrun_engine::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut workflow = Workflow::builder("nightly-report")
///     .add_activity(
///         Activity::new("extract", ScriptedAction::fail_times(2), 3)
///             .with_backoff(BackoffPolicy::none()),
///     )
///     .add_activity(Activity::new("publish", LogAction::new("publishing"), 3))
///     .build();
///
/// workflow.start().await.unwrap();
///
/// assert_eq!(workflow.state(), WorkflowState::Completed);
/// assert_eq!(workflow.activities()[0].attempt_count(), 3);
/// # }
/// ```
#[derive(Debug)]
pub struct Workflow {
    id: Uuid,
    name: String,
    activities: Vec<Activity>,
    state: WorkflowState,
    execution_mode: ExecutionMode,
    cancel: CancellationToken,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    failure: Option<WorkflowExecutionError>,
}

impl Workflow {
    /// Create a sequential workflow from activities in execution order
    pub fn new(name: impl Into<String>, activities: Vec<Activity>) -> Self {
        let name = name.into();
        let mut activities = activities;
        for activity in &mut activities {
            activity.set_workflow(&name);
        }

        Self {
            id: Uuid::now_v7(),
            name,
            activities,
            state: WorkflowState::Pending,
            execution_mode: ExecutionMode::Sequential,
            cancel: CancellationToken::new(),
            started_at: None,
            finished_at: None,
            failure: None,
        }
    }

    /// Start building a workflow
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(name)
    }

    /// Choose the execution driver
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    /// Activities in execution order
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Look up an activity by name
    pub fn activity(&self, name: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.name() == name)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Error that ended the run, once `Failed`
    pub fn failure(&self) -> Option<&WorkflowExecutionError> {
        self.failure.as_ref()
    }

    /// Token that cancels this workflow's run when triggered
    ///
    /// Take a clone before calling [`start`](Self::start) to cancel from
    /// another task. The driver observes it before every attempt and during
    /// backoff delays.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Execute the workflow
    ///
    /// Runs every activity through its retry loop using the configured driver.
    /// Succeeds once all activities are `Completed`. Fails with
    /// [`WorkflowExecutionError::ActivityFailed`] naming the first permanently
    /// failed activity and its last failure; activities after it are never
    /// attempted. An empty workflow completes immediately.
    #[instrument(skip_all, fields(workflow = %self.name, workflow_id = %self.id))]
    pub async fn start(&mut self) -> Result<(), WorkflowExecutionError> {
        if self.state != WorkflowState::Pending {
            return Err(WorkflowExecutionError::AlreadyStarted {
                workflow: self.name.clone(),
                state: self.state,
            });
        }

        self.state = WorkflowState::Running;
        self.started_at = Some(Utc::now());
        info!(
            workflow = %self.name,
            activities = self.activities.len(),
            mode = ?self.execution_mode,
            "workflow started"
        );

        let result = match self.execution_mode {
            ExecutionMode::Sequential => {
                run_sequential(&self.name, &mut self.activities, &self.cancel).await
            }
            ExecutionMode::Concurrent {
                max_concurrency,
                failure_policy,
            } => {
                run_concurrent(
                    &self.name,
                    &mut self.activities,
                    &self.cancel,
                    max_concurrency,
                    failure_policy,
                )
                .await
            }
        };

        self.finished_at = Some(Utc::now());
        match &result {
            Ok(()) => {
                self.state = WorkflowState::Completed;
                info!(workflow = %self.name, "workflow completed");
            }
            Err(err) => {
                self.state = WorkflowState::Failed;
                self.failure = Some(err.clone());
                error!(
                    workflow = %self.name,
                    activity = err.activity().unwrap_or_default(),
                    attempts = err.attempts().unwrap_or_default(),
                    error = %err,
                    "workflow failed"
                );
            }
        }

        result
    }

    /// Alias for [`start`](Self::start)
    pub async fn run(&mut self) -> Result<(), WorkflowExecutionError> {
        self.start().await
    }

    /// Capture the current state of the workflow and its activities
    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            id: self.id,
            name: self.name.clone(),
            state: self.state,
            started_at: self.started_at,
            finished_at: self.finished_at,
            activities: self.activities.iter().map(ActivitySnapshot::from).collect(),
        }
    }
}

/// Builder for [`Workflow`]
///
/// Activities added by name pick up the retry budget, backoff and timeout from
/// the builder's [`EngineConfig`]; activities added with
/// [`add_activity`](Self::add_activity) keep their own settings.
#[derive(Debug)]
pub struct WorkflowBuilder {
    name: String,
    config: EngineConfig,
    backoff: Option<Arc<dyn BackoffStrategy>>,
    activities: Vec<Activity>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: EngineConfig::default(),
            backoff: None,
            activities: Vec::new(),
        }
    }

    /// Use `config` for defaults and the execution mode
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom backoff strategy for activities added by name
    pub fn with_backoff(mut self, backoff: impl BackoffStrategy + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// Override the execution mode from the config
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.config.execution_mode = mode;
        self
    }

    /// Append an activity using the configured default retry budget
    pub fn activity(self, name: impl Into<String>, action: impl Action + 'static) -> Self {
        let max_retries = self.config.default_max_retries;
        self.activity_with_retries(name, action, max_retries)
    }

    /// Append an activity with an explicit retry budget
    pub fn activity_with_retries(
        mut self,
        name: impl Into<String>,
        action: impl Action + 'static,
        max_retries: u32,
    ) -> Self {
        let backoff: Arc<dyn BackoffStrategy> = match &self.backoff {
            Some(backoff) => Arc::clone(backoff),
            None => Arc::new(self.config.backoff.clone()),
        };
        let mut activity = Activity::new(name, action, max_retries).with_shared_backoff(backoff);
        if let Some(limit) = self.config.attempt_timeout {
            activity = activity.with_attempt_timeout(limit);
        }
        self.activities.push(activity);
        self
    }

    /// Append a fully configured activity
    pub fn add_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    pub fn build(self) -> Workflow {
        Workflow::new(self.name, self.activities).with_execution_mode(self.config.execution_mode)
    }
}
