//! Ready-made [`Action`] implementations

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tracing::info;

use super::{Action, ActionContext, ActionFailure};

/// Adapts an async closure into an [`Action`]
///
/// The closure receives an owned copy of the context for each attempt.
///
/// ```
/// use flowrun_engine::{ActionFailure, FnAction};
///
/// let action = FnAction::new(|ctx| async move {
///     if ctx.attempt < 2 {
///         return Err(ActionFailure::new("warming up"));
///     }
///     Ok(())
/// });
/// # let _ = action;
/// ```
pub struct FnAction<F> {
    f: F,
}

impl<F, Fut> FnAction<F>
where
    F: Fn(ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ActionFailure>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Action for FnAction<F>
where
    F: Fn(ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ActionFailure>> + Send + 'static,
{
    async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
        (self.f)(ctx.clone()).await
    }
}

/// Deterministic action that fails a fixed number of times, then succeeds
///
/// Counts every invocation, which makes it the natural fixture for checking
/// attempt budgets.
#[derive(Debug)]
pub struct ScriptedAction {
    failures: u32,
    message: String,
    calls: AtomicU32,
}

impl ScriptedAction {
    /// Fail the first `failures` attempts, succeed afterwards
    pub fn fail_times(failures: u32) -> Self {
        Self {
            failures,
            message: "scripted failure".to_string(),
            calls: AtomicU32::new(0),
        }
    }

    /// Succeed on every attempt
    pub fn succeed() -> Self {
        Self::fail_times(0)
    }

    /// Fail on every attempt
    pub fn always_fail() -> Self {
        Self::fail_times(u32::MAX)
    }

    /// Use a custom failure message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Number of times the action has been invoked
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Action for ScriptedAction {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if call <= self.failures {
            return Err(ActionFailure::new(format!(
                "{} in {} (call {call})",
                self.message, ctx.activity
            ))
            .with_type("scripted"));
        }
        Ok(())
    }
}

/// Logs a message and succeeds
#[derive(Debug, Clone)]
pub struct LogAction {
    message: String,
}

impl LogAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Action for LogAction {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
        info!(
            activity = %ctx.activity,
            attempt = ctx.attempt,
            "{}",
            self.message
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_fails_then_succeeds() {
        let action = ScriptedAction::fail_times(2);
        let ctx = ActionContext::new("a", 1, 5);

        assert!(action.execute(&ctx).await.is_err());
        assert!(action.execute(&ctx).await.is_err());
        assert!(action.execute(&ctx).await.is_ok());
        assert!(action.execute(&ctx).await.is_ok());
        assert_eq!(action.calls(), 4);
    }

    #[tokio::test]
    async fn test_scripted_failure_message() {
        let action = ScriptedAction::always_fail().with_message("gateway down");
        let err = action
            .execute(&ActionContext::new("charge", 1, 1))
            .await
            .unwrap_err();

        assert_eq!(err.message, "gateway down in charge (call 1)");
        assert_eq!(err.error_type.as_deref(), Some("scripted"));
    }

    #[tokio::test]
    async fn test_fn_action_sees_attempt() {
        let action = FnAction::new(|ctx| async move {
            if ctx.is_last_attempt() {
                Ok(())
            } else {
                Err(ActionFailure::new("not yet"))
            }
        });

        assert!(action.execute(&ActionContext::new("a", 1, 2)).await.is_err());
        assert!(action.execute(&ActionContext::new("a", 2, 2)).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_action_succeeds() {
        let action = LogAction::new("Executing Activity 1");
        assert!(action.execute(&ActionContext::new("a", 1, 1)).await.is_ok());
    }
}
