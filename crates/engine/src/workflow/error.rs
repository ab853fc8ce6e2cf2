//! Workflow execution errors

use crate::activity::{ActionFailure, ActivityExhausted};

use super::WorkflowState;

/// Error returned by [`Workflow::start`](crate::Workflow::start)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowExecutionError {
    /// An activity exhausted its retry budget; later activities were not attempted
    #[error("workflow '{workflow}' failed: {source}")]
    ActivityFailed {
        workflow: String,
        source: ActivityExhausted,
    },

    /// Cancellation was observed while `activity` was between attempts
    #[error("workflow '{workflow}' cancelled during activity '{activity}' after {attempts} attempt(s)")]
    Cancelled {
        workflow: String,
        activity: String,
        attempts: u32,
    },

    /// `start()` on a workflow that has already left `Pending`
    #[error("workflow '{workflow}' is {state}; only a pending workflow can be started")]
    AlreadyStarted {
        workflow: String,
        state: WorkflowState,
    },
}

impl WorkflowExecutionError {
    /// Name of the workflow that failed
    pub fn workflow(&self) -> &str {
        match self {
            Self::ActivityFailed { workflow, .. }
            | Self::Cancelled { workflow, .. }
            | Self::AlreadyStarted { workflow, .. } => workflow,
        }
    }

    /// Activity the run stopped at
    pub fn activity(&self) -> Option<&str> {
        match self {
            Self::ActivityFailed { source, .. } => Some(&source.activity),
            Self::Cancelled { activity, .. } => Some(activity),
            Self::AlreadyStarted { .. } => None,
        }
    }

    /// Last failure reported by the failing activity's action
    pub fn reason(&self) -> Option<&ActionFailure> {
        match self {
            Self::ActivityFailed { source, .. } => Some(&source.last_error),
            Self::Cancelled { .. } | Self::AlreadyStarted { .. } => None,
        }
    }

    /// Attempts made by the activity the run stopped at
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::ActivityFailed { source, .. } => Some(source.attempts),
            Self::Cancelled { attempts, .. } => Some(*attempts),
            Self::AlreadyStarted { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
