//! Activity lifecycle state

use serde::{Deserialize, Serialize};

/// Lifecycle state of an activity
///
/// ```text
/// Pending ──► Running ──► Completed
///    ▲           │
///    └── retry ──┤
///                └──────► Failed
/// ```
///
/// `Pending` with a non-zero attempt count means a retry is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// Not yet attempted, or waiting for its next retry
    #[default]
    Pending,

    /// An attempt is in flight
    Running,

    /// The most recent attempt succeeded
    Completed,

    /// Retry budget exhausted
    Failed,
}

impl ActivityState {
    /// No further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for ActivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
