//! Reliability patterns for activity execution
//!
//! This module provides:
//! - [`BackoffStrategy`] - Pluggable delay schedule between attempts
//! - [`BackoffPolicy`] - Fixed or exponential backoff with jitter

mod backoff;

pub(crate) use backoff::{option_duration_millis, saturating_millis};
pub use backoff::{BackoffPolicy, BackoffStrategy};
