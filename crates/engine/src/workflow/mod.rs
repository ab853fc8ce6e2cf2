//! Workflow abstractions and types
//!
//! This module contains the workflow primitives:
//! - [`Workflow`] owning an ordered list of activities and driving them
//! - [`WorkflowState`] lifecycle enum
//! - [`WorkflowExecutionError`] surfaced to callers
//! - [`WorkflowSnapshot`] for observing progress

mod definition;
mod driver;
mod error;
mod snapshot;
mod state;

pub use definition::{Workflow, WorkflowBuilder};
pub use error::WorkflowExecutionError;
pub use snapshot::{ActivitySnapshot, WorkflowSnapshot};
pub use state::WorkflowState;
