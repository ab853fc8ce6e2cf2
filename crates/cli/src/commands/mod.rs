// CLI subcommands and shared reporting

pub mod demo;
pub mod run;

use anyhow::Result;
use flowrun_engine::{Workflow, WorkflowExecutionError, WorkflowSnapshot};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::output::{print_field, print_table_header, print_table_row, OutputFormat};

/// Structured result of one workflow run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub workflow: WorkflowSnapshot,
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub activity: Option<String>,
    pub attempts: Option<u32>,
    pub cancelled: bool,
}

impl From<&WorkflowExecutionError> for ErrorReport {
    fn from(err: &WorkflowExecutionError) -> Self {
        Self {
            message: err.to_string(),
            activity: err.activity().map(str::to_string),
            attempts: err.attempts(),
            cancelled: err.is_cancelled(),
        }
    }
}

/// Cancel `workflow` when the process receives Ctrl-C
fn spawn_cancel_on_ctrl_c(workflow: &Workflow) -> JoinHandle<()> {
    let token = workflow.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling workflow");
            token.cancel();
        }
    })
}

impl RunReport {
    /// Capture the outcome of a finished run
    pub fn new(workflow: &Workflow, result: &Result<(), WorkflowExecutionError>) -> Self {
        Self {
            workflow: workflow.snapshot(),
            error: result.as_ref().err().map(ErrorReport::from),
        }
    }

    pub fn completed(&self) -> bool {
        self.error.is_none()
    }
}

/// Start `workflow`, cancelling it on Ctrl-C
pub async fn execute(mut workflow: Workflow) -> RunReport {
    let interrupt = spawn_cancel_on_ctrl_c(&workflow);
    let result = workflow.start().await;
    interrupt.abort();

    RunReport::new(&workflow, &result)
}

/// Start `workflow` and print its outcome
///
/// Returns whether the workflow completed.
pub async fn execute_and_report(workflow: Workflow, format: OutputFormat) -> Result<bool> {
    let report = execute(workflow).await;

    if format.is_text() {
        print_report(&report);
    } else {
        format.print_value(&report)?;
    }

    Ok(report.completed())
}

pub fn print_report(report: &RunReport) {
    let snapshot = &report.workflow;

    println!();
    print_field("Workflow", &snapshot.name);
    print_field("ID", &snapshot.id.to_string());
    print_field("State", &snapshot.state.to_string());
    print_field("Attempts", &snapshot.total_attempts().to_string());
    println!();

    print_table_header(&[
        ("ACTIVITY", 20),
        ("STATE", 10),
        ("ATTEMPTS", 9),
        ("LAST ERROR", 48),
    ]);
    for activity in &snapshot.activities {
        let attempts = format!(
            "{}/{}",
            activity.attempt_count,
            activity.max_retries.saturating_add(1)
        );
        let state = activity.state.to_string();
        let last_error = activity
            .last_error
            .as_ref()
            .map(|e| e.message.as_str())
            .unwrap_or("-");
        print_table_row(&[
            (&activity.name, 20),
            (&state, 10),
            (&attempts, 9),
            (last_error, 48),
        ]);
    }

    if let Some(error) = &report.error {
        println!();
        println!("Error: {}", error.message);
    }
}
