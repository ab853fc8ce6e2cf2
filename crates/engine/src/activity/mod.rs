//! Activity abstractions
//!
//! Activities are the retryable units of work inside a workflow. They:
//! - Wrap an [`Action`] that reports success or failure
//! - Retry failed attempts up to a fixed budget with backoff in between
//! - Track their own attempt count, last failure and lifecycle state

mod actions;
mod context;
mod definition;
mod runner;
mod state;

pub use actions::{FnAction, LogAction, ScriptedAction};
pub use context::ActionContext;
pub use definition::{Action, ActionFailure};
pub use runner::{Activity, ActivityError, ActivityExhausted, AttemptOutcome};
pub use state::ActivityState;
