//! Activity retry state machine

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::{Action, ActionContext, ActionFailure, ActivityState};
use crate::reliability::{saturating_millis, BackoffPolicy, BackoffStrategy};

/// Raised once an activity's retry budget is consumed without a success
///
/// Permanent: the workflow never retries an exhausted activity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("activity '{activity}' failed after {attempts} attempt(s): {last_error}")]
pub struct ActivityExhausted {
    /// Name of the exhausted activity
    pub activity: String,

    /// Attempts made (always retries + 1)
    pub attempts: u32,

    /// Failure reported by the final attempt
    pub last_error: ActionFailure,
}

/// Errors from driving an activity
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivityError {
    /// Retry budget exhausted
    #[error(transparent)]
    Exhausted(#[from] ActivityExhausted),

    /// Cancellation observed between attempts
    #[error("activity '{activity}' cancelled after {attempts} attempt(s)")]
    Cancelled { activity: String, attempts: u32 },
}

/// Result of a single non-exhausting attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The action succeeded; the activity is `Completed`
    Completed,

    /// The action failed with budget left; backoff has already elapsed
    RetryPending {
        /// Delay that was waited before returning
        delay: Duration,
    },
}

/// A named, retryable unit of work
///
/// An activity owns its action, its attempt counter and its last failure.
/// It allows at most `max_retries + 1` attempts: one initial attempt plus up to
/// `max_retries` retries, with a backoff delay between consecutive attempts.
///
/// # Example
///
/// ```
/// use flowrun_engine::{Activity, ActivityState, BackoffPolicy, ScriptedAction};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut activity = Activity::new("fetch", ScriptedAction::fail_times(1), 2)
///     .with_backoff(BackoffPolicy::none());
///
/// activity.run_with_retries(&CancellationToken::new()).await.unwrap();
///
/// assert_eq!(activity.state(), ActivityState::Completed);
/// assert_eq!(activity.attempt_count(), 2);
/// # }
/// ```
pub struct Activity {
    name: String,
    action: Box<dyn Action>,
    max_retries: u32,
    attempt_count: u32,
    last_error: Option<ActionFailure>,
    state: ActivityState,
    backoff: Arc<dyn BackoffStrategy>,
    attempt_timeout: Option<Duration>,
    workflow: Option<String>,
}

impl std::fmt::Debug for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activity")
            .field("name", &self.name)
            .field("max_retries", &self.max_retries)
            .field("attempt_count", &self.attempt_count)
            .field("last_error", &self.last_error)
            .field("state", &self.state)
            .field("backoff", &self.backoff)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl Activity {
    /// Create a pending activity with the default backoff (fixed 2 seconds)
    pub fn new(name: impl Into<String>, action: impl Action + 'static, max_retries: u32) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
            max_retries,
            attempt_count: 0,
            last_error: None,
            state: ActivityState::Pending,
            backoff: Arc::new(BackoffPolicy::default()),
            attempt_timeout: None,
            workflow: None,
        }
    }

    /// Replace the backoff strategy
    pub fn with_backoff(mut self, backoff: impl BackoffStrategy + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Share an existing backoff strategy
    pub fn with_shared_backoff(mut self, backoff: Arc<dyn BackoffStrategy>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fail any attempt that runs longer than `limit`
    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    pub(crate) fn set_workflow(&mut self, workflow: &str) {
        self.workflow = Some(workflow.to_string());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts the budget allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Most recent failure; cleared by a successful attempt
    pub fn last_error(&self) -> Option<&ActionFailure> {
        self.last_error.as_ref()
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    /// Make one attempt
    ///
    /// On failure with budget remaining, waits out the backoff delay before
    /// returning so the activity is immediately eligible for the next attempt.
    /// The wait ends early with [`ActivityError::Cancelled`] if `cancel` fires.
    /// On failure with no budget left, transitions to `Failed` and returns
    /// [`ActivityError::Exhausted`] without waiting.
    ///
    /// A terminal activity is never invoked again: the call reports the
    /// terminal outcome and leaves the attempt counter untouched.
    pub async fn attempt(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome, ActivityError> {
        match self.state {
            ActivityState::Completed => return Ok(AttemptOutcome::Completed),
            ActivityState::Failed => return Err(self.exhausted().into()),
            ActivityState::Pending | ActivityState::Running => {}
        }

        if cancel.is_cancelled() {
            return Err(self.cancelled());
        }

        self.attempt_count += 1;
        self.state = ActivityState::Running;

        let max_attempts = self.max_attempts();
        let mut ctx = ActionContext::new(&self.name, self.attempt_count, max_attempts)
            .with_cancellation(cancel.clone());
        if let Some(workflow) = &self.workflow {
            ctx = ctx.with_workflow(workflow);
        }

        debug!(
            activity = %self.name,
            attempt = self.attempt_count,
            max_attempts,
            "executing action"
        );

        let result = match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.action.execute(&ctx))
                .await
                .unwrap_or_else(|_| Err(ActionFailure::timeout(limit))),
            None => self.action.execute(&ctx).await,
        };

        let failure = match result {
            Ok(()) => {
                self.state = ActivityState::Completed;
                self.last_error = None;
                info!(
                    activity = %self.name,
                    attempt = self.attempt_count,
                    "activity completed"
                );
                return Ok(AttemptOutcome::Completed);
            }
            Err(failure) => failure,
        };

        if self.attempt_count >= max_attempts {
            self.state = ActivityState::Failed;
            self.last_error = Some(failure.clone());
            error!(
                activity = %self.name,
                attempts = self.attempt_count,
                error = %failure,
                "activity exhausted retry budget"
            );
            return Err(ActivityError::Exhausted(ActivityExhausted {
                activity: self.name.clone(),
                attempts: self.attempt_count,
                last_error: failure,
            }));
        }

        let delay = self.backoff.delay_for_retry(self.attempt_count);
        warn!(
            activity = %self.name,
            attempt = self.attempt_count,
            max_attempts,
            delay_ms = saturating_millis(delay),
            error = %failure,
            "attempt failed, retrying"
        );
        self.last_error = Some(failure);
        self.state = ActivityState::Pending;

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        Ok(AttemptOutcome::RetryPending { delay })
    }

    /// Attempt until the activity reaches a terminal state
    ///
    /// Returns `Ok(())` once `Completed`, or the exhaustion error carrying the
    /// last failure once `Failed`. Calling this on an already terminal activity
    /// reports that outcome again without making another attempt.
    #[instrument(skip_all, fields(activity = %self.name, max_retries = self.max_retries))]
    pub async fn run_with_retries(&mut self, cancel: &CancellationToken) -> Result<(), ActivityError> {
        loop {
            match self.attempt(cancel).await? {
                AttemptOutcome::Completed => return Ok(()),
                AttemptOutcome::RetryPending { .. } => continue,
            }
        }
    }

    fn cancelled(&self) -> ActivityError {
        info!(
            activity = %self.name,
            attempts = self.attempt_count,
            "activity cancelled"
        );
        ActivityError::Cancelled {
            activity: self.name.clone(),
            attempts: self.attempt_count,
        }
    }

    fn exhausted(&self) -> ActivityExhausted {
        ActivityExhausted {
            activity: self.name.clone(),
            attempts: self.attempt_count,
            last_error: self
                .last_error
                .clone()
                .unwrap_or_else(|| ActionFailure::new("no failure recorded")),
        }
    }
}
