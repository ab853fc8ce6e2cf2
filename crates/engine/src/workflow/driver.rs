//! Execution drivers
//!
//! The sequential driver is the engine's contract: strict declaration order,
//! stop at the first exhausted activity. The concurrent driver is an opt-in
//! mode that trades ordering for throughput.

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::WorkflowExecutionError;
use crate::activity::{Activity, ActivityError};
use crate::config::FailurePolicy;

/// Run activities one at a time in declaration order
///
/// Activities after the first failure are never attempted and stay `Pending`.
pub(crate) async fn run_sequential(
    workflow: &str,
    activities: &mut [Activity],
    cancel: &CancellationToken,
) -> Result<(), WorkflowExecutionError> {
    for (index, activity) in activities.iter_mut().enumerate() {
        debug!(workflow, activity = activity.name(), index, "starting activity");
        activity
            .run_with_retries(cancel)
            .await
            .map_err(|err| workflow_error(workflow, err))?;
    }
    Ok(())
}

/// Run activities concurrently, at most `max_concurrency` in flight
///
/// The reported error is the one from the failed activity earliest in
/// declaration order. Under [`FailurePolicy::FailFast`] the first exhausted
/// activity cancels the others at their next attempt boundary; activities that
/// never started stay `Pending`.
pub(crate) async fn run_concurrent(
    workflow: &str,
    activities: &mut [Activity],
    cancel: &CancellationToken,
    max_concurrency: usize,
    failure_policy: FailurePolicy,
) -> Result<(), WorkflowExecutionError> {
    // Child token: fail-fast must not cancel the caller's token
    let run_cancel = cancel.child_token();

    let mut results: Vec<(usize, Result<(), ActivityError>)> =
        stream::iter(activities.iter_mut().enumerate().map(|(index, activity)| {
            let run_cancel = &run_cancel;
            async move {
                let result = activity.run_with_retries(run_cancel).await;
                if let Err(ActivityError::Exhausted(exhausted)) = &result {
                    if failure_policy == FailurePolicy::FailFast && !run_cancel.is_cancelled() {
                        warn!(
                            workflow,
                            activity = %exhausted.activity,
                            "activity exhausted, cancelling remaining activities"
                        );
                        run_cancel.cancel();
                    }
                }
                (index, result)
            }
        }))
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);

    // An exhausted activity outranks the cancellations it caused
    let mut first_cancelled = None;
    for (_, result) in results {
        match result {
            Ok(()) => {}
            Err(err @ ActivityError::Exhausted(_)) => return Err(workflow_error(workflow, err)),
            Err(err @ ActivityError::Cancelled { .. }) => {
                first_cancelled.get_or_insert(err);
            }
        }
    }

    match first_cancelled {
        Some(err) => Err(workflow_error(workflow, err)),
        None => Ok(()),
    }
}

fn workflow_error(workflow: &str, err: ActivityError) -> WorkflowExecutionError {
    match err {
        ActivityError::Exhausted(source) => WorkflowExecutionError::ActivityFailed {
            workflow: workflow.to_string(),
            source,
        },
        ActivityError::Cancelled { activity, attempts } => WorkflowExecutionError::Cancelled {
            workflow: workflow.to_string(),
            activity,
            attempts,
        },
    }
}
