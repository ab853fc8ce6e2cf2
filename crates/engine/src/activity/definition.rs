//! Action trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ActionContext;

/// Failure reported by a single action attempt
///
/// Action failures are always transient: the owning activity retries until its
/// budget is exhausted and only then surfaces the last failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionFailure {
    /// Error message
    pub message: String,

    /// Error type/code for programmatic handling
    pub error_type: Option<String>,

    /// Additional error details (for debugging)
    pub details: Option<serde_json::Value>,
}

impl ActionFailure {
    /// Create a new failure
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            details: None,
        }
    }

    /// Failure recorded when an attempt exceeds its time limit
    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::new(format!("attempt timed out after {limit:?}")).with_type("timeout")
    }

    /// Set the error type
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Add error details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActionFailure {}

impl From<anyhow::Error> for ActionFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

impl From<String> for ActionFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ActionFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// The work performed by an activity
///
/// An action reports only success or failure. It may do arbitrary externally
/// observable work (I/O, logging); the engine inspects nothing but the result.
///
/// # Example
///
/// ```ignore
/// use flowrun_engine::prelude::*;
///
/// struct ChargeCard {
///     gateway: GatewayClient,
/// }
///
/// #[async_trait]
/// impl Action for ChargeCard {
///     async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
///         self.gateway.charge().await.map_err(|e| ActionFailure::new(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Action: Send + Sync {
    /// Run one attempt
    ///
    /// The context carries the attempt number and a cancellation check that
    /// long-running actions can poll.
    async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure>;
}

#[async_trait]
impl<A: Action + ?Sized> Action for Box<A> {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
        (**self).execute(ctx).await
    }
}

#[async_trait]
impl<A: Action + ?Sized> Action for std::sync::Arc<A> {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
        (**self).execute(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_failure_display() {
        let failure = ActionFailure::new("connection refused");
        assert_eq!(failure.to_string(), "connection refused");
        assert!(failure.error_type.is_none());
    }

    #[test]
    fn test_action_failure_with_type() {
        let failure = ActionFailure::new("connection failed").with_type("CONNECTION_ERROR");

        assert_eq!(failure.error_type, Some("CONNECTION_ERROR".to_string()));
    }

    #[test]
    fn test_timeout_failure() {
        let failure = ActionFailure::timeout(std::time::Duration::from_secs(3));
        assert_eq!(failure.error_type.as_deref(), Some("timeout"));
        assert!(failure.message.contains("3s"));
    }

    #[test]
    fn test_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("disk full").context("writing report");
        let failure = ActionFailure::from(err);
        assert_eq!(failure.message, "writing report: disk full");
    }

    #[test]
    fn test_action_failure_serialization() {
        let failure = ActionFailure::new("test error")
            .with_type("TEST")
            .with_details(serde_json::json!({"key": "value"}));

        let json = serde_json::to_string(&failure).unwrap();
        let parsed: ActionFailure = serde_json::from_str(&json).unwrap();

        assert_eq!(failure, parsed);
    }
}
