//! Point-in-time views of a workflow for reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WorkflowState;
use crate::activity::{ActionFailure, Activity, ActivityState};

/// Observable state of one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub name: String,
    pub state: ActivityState,
    pub attempt_count: u32,
    pub max_retries: u32,
    pub last_error: Option<ActionFailure>,
}

impl From<&Activity> for ActivitySnapshot {
    fn from(activity: &Activity) -> Self {
        Self {
            name: activity.name().to_string(),
            state: activity.state(),
            attempt_count: activity.attempt_count(),
            max_retries: activity.max_retries(),
            last_error: activity.last_error().cloned(),
        }
    }
}

/// Observable state of a workflow and all of its activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub id: Uuid,
    pub name: String,
    pub state: WorkflowState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub activities: Vec<ActivitySnapshot>,
}

impl WorkflowSnapshot {
    /// The activity that ended `Failed`, if any
    pub fn failed_activity(&self) -> Option<&ActivitySnapshot> {
        self.activities
            .iter()
            .find(|a| a.state == ActivityState::Failed)
    }

    /// Total attempts across all activities
    pub fn total_attempts(&self) -> u64 {
        self.activities
            .iter()
            .map(|a| u64::from(a.attempt_count))
            .sum()
    }
}
