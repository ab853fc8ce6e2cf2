//! # Workflow Execution Engine
//!
//! A single-process engine that runs an ordered sequence of named activities,
//! retrying each one with backoff until it succeeds or its budget runs out.
//!
//! ## Features
//!
//! - **Bounded retries**: an activity with `max_retries = r` is attempted at most `r + 1` times
//! - **Pluggable backoff**: fixed, exponential, jittered, or any [`BackoffStrategy`]
//! - **Sequential driver**: strict declaration order, aborts at the first exhausted activity
//! - **Concurrent driver**: optional fan-out with fail-fast or collect-all semantics
//! - **Cancellation**: observed between attempts and during backoff delays
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Workflow                             │
//! │  (Pending → Running → Completed | Failed, owns activities)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ run_with_retries()
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Activity                             │
//! │  (attempt counter, last error, backoff between attempts)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ execute()
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Action                              │
//! │  (user work, reports success or ActionFailure)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use flowrun_engine::prelude::*;
//!
//! struct SendInvoice;
//!
//! #[async_trait]
//! impl Action for SendInvoice {
//!     async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
//!         mailer::send().await.map_err(|e| ActionFailure::new(e.to_string()))
//!     }
//! }
//!
//! let mut workflow = Workflow::builder("billing")
//!     .with_config(EngineConfig::from_env())
//!     .activity("send-invoice", SendInvoice)
//!     .build();
//!
//! workflow.start().await?;
//! ```

pub mod activity;
pub mod config;
pub mod reliability;
pub mod workflow;

/// Prelude for common imports
pub mod prelude {
    pub use crate::activity::{
        Action, ActionContext, ActionFailure, Activity, ActivityError, ActivityExhausted,
        ActivityState, AttemptOutcome, FnAction, LogAction, ScriptedAction,
    };
    pub use crate::config::{EngineConfig, ExecutionMode, FailurePolicy};
    pub use crate::reliability::{BackoffPolicy, BackoffStrategy};
    pub use crate::workflow::{
        ActivitySnapshot, Workflow, WorkflowBuilder, WorkflowExecutionError, WorkflowSnapshot,
        WorkflowState,
    };
    pub use async_trait::async_trait;
    pub use tokio_util::sync::CancellationToken;
}

// Re-export key types at crate root
pub use activity::{
    Action, ActionContext, ActionFailure, Activity, ActivityError, ActivityExhausted,
    ActivityState, AttemptOutcome, FnAction, LogAction, ScriptedAction,
};
pub use config::{EngineConfig, ExecutionMode, FailurePolicy};
pub use reliability::{BackoffPolicy, BackoffStrategy};
pub use tokio_util::sync::CancellationToken;
pub use workflow::{
    ActivitySnapshot, Workflow, WorkflowBuilder, WorkflowExecutionError, WorkflowSnapshot,
    WorkflowState,
};
