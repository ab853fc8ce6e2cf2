//! Action execution context

use tokio_util::sync::CancellationToken;

/// Context handed to an action for one attempt
///
/// The context provides:
/// - Which activity and workflow the attempt belongs to
/// - The current attempt number and the attempt budget
/// - Cooperative cancellation detection
///
/// # Example
///
/// ```ignore
/// async fn execute(&self, ctx: &ActionContext) -> Result<(), ActionFailure> {
///     for chunk in self.chunks() {
///         if ctx.is_cancelled() {
///             return Err(ActionFailure::new("cancelled"));
///         }
///         upload(chunk).await?;
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Name of the activity running the action
    pub activity: String,

    /// Name of the owning workflow, if any
    pub workflow: Option<String>,

    /// Current attempt number (1-based)
    pub attempt: u32,

    /// Maximum attempts allowed (retries + 1)
    pub max_attempts: u32,

    cancel: CancellationToken,
}

impl ActionContext {
    /// Create a new context
    pub fn new(activity: impl Into<String>, attempt: u32, max_attempts: u32) -> Self {
        Self {
            activity: activity.into(),
            workflow: None,
            attempt,
            max_attempts,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the owning workflow name
    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.workflow = Some(workflow.into());
        self
    }

    /// Share a cancellation token with the driver
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when cancellation is requested
    ///
    /// Useful in `tokio::select!` against the action's own work.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Check if this is the last attempt in the budget
    pub fn is_last_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}
