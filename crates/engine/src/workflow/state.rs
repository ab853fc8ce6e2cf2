//! Workflow lifecycle state

use serde::{Deserialize, Serialize};

/// Lifecycle state of a workflow
///
/// `Pending → Running → {Completed | Failed}`, mirroring [`ActivityState`](crate::ActivityState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Workflow created but not started
    #[default]
    Pending,

    /// Workflow is running
    Running,

    /// Every activity completed
    Completed,

    /// An activity failed or the run was cancelled
    Failed,
}

impl WorkflowState {
    /// No further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
