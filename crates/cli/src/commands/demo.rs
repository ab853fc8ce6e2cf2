// Built-in demonstration scenarios

use std::time::Duration;

use anyhow::Result;
use flowrun_engine::{BackoffPolicy, EngineConfig, LogAction, ScriptedAction, Workflow};
use tracing::info;

use super::{execute, print_report, RunReport};
use crate::output::OutputFormat;

/// Activity 1 succeeds, Activity 2 fails twice then succeeds, Activity 3 succeeds
fn retry_workflow(config: EngineConfig) -> Workflow {
    Workflow::builder("Sample Workflow")
        .with_config(config)
        .activity_with_retries("Activity 1", LogAction::new("Executing Activity 1"), 3)
        .activity_with_retries(
            "Activity 2",
            ScriptedAction::fail_times(2).with_message("simulated failure"),
            3,
        )
        .activity_with_retries("Activity 3", LogAction::new("Executing Activity 3"), 3)
        .build()
}

/// Activity 1 succeeds, Activity 2 always fails and aborts the workflow
fn abort_workflow(config: EngineConfig) -> Workflow {
    Workflow::builder("Aborting Workflow")
        .with_config(config)
        .activity_with_retries("Activity 1", LogAction::new("Executing Activity 1"), 3)
        .activity_with_retries(
            "Activity 2",
            ScriptedAction::always_fail().with_message("simulated failure"),
            3,
        )
        .activity_with_retries("Activity 3", LogAction::new("Executing Activity 3"), 3)
        .build()
}

/// Run the selected scenarios, pairing each report with whether the
/// workflow was expected to complete
async fn run_scenarios(scenario: &str, config: EngineConfig) -> Vec<(RunReport, bool)> {
    let mut scenarios = Vec::new();
    if matches!(scenario, "retry" | "all") {
        scenarios.push((retry_workflow(config.clone()), true));
    }
    if matches!(scenario, "abort" | "all") {
        scenarios.push((abort_workflow(config), false));
    }

    let mut reports = Vec::with_capacity(scenarios.len());
    for (workflow, expect_completed) in scenarios {
        info!(workflow = %workflow.name(), expect_completed, "running demo scenario");
        reports.push((execute(workflow).await, expect_completed));
    }
    reports
}

pub async fn run(scenario: &str, delay_ms: u64, format: OutputFormat) -> Result<bool> {
    let config =
        EngineConfig::default().with_backoff(BackoffPolicy::fixed(Duration::from_millis(delay_ms)));

    let results = run_scenarios(scenario, config).await;
    let as_expected = results
        .iter()
        .all(|(report, expect_completed)| report.completed() == *expect_completed);

    let reports: Vec<RunReport> = results.into_iter().map(|(report, _)| report).collect();
    if format.is_text() {
        reports.iter().for_each(print_report);
    } else {
        // One document covering every scenario
        format.print_value(&reports)?;
    }

    Ok(as_expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowrun_engine::{ActivityState, WorkflowState};

    fn fast() -> EngineConfig {
        EngineConfig::default().with_backoff(BackoffPolicy::none())
    }

    #[tokio::test]
    async fn test_all_scenarios_render_as_one_document() {
        let results = run_scenarios("all", fast()).await;
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|(report, expected)| report.completed() == *expected));

        let reports: Vec<RunReport> = results.into_iter().map(|(report, _)| report).collect();

        let json = OutputFormat::Json.render_value(&reports).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["workflow"]["name"], "Sample Workflow");
        assert!(items[0]["error"].is_null());
        assert_eq!(items[1]["workflow"]["name"], "Aborting Workflow");
        assert_eq!(items[1]["error"]["activity"], "Activity 2");

        let yaml = OutputFormat::Yaml.render_value(&reports).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let items = parsed.as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["error"]["attempts"].as_u64(), Some(4));
    }

    #[tokio::test]
    async fn test_retry_scenario_completes() {
        let mut workflow = retry_workflow(fast());
        workflow.start().await.unwrap();

        assert_eq!(workflow.state(), WorkflowState::Completed);
        let attempts: Vec<u32> = workflow
            .activities()
            .iter()
            .map(|a| a.attempt_count())
            .collect();
        assert_eq!(attempts, vec![1, 3, 1]);
    }

    #[tokio::test]
    async fn test_abort_scenario_fails_at_second_activity() {
        let mut workflow = abort_workflow(fast());
        let err = workflow.start().await.unwrap_err();

        assert_eq!(workflow.state(), WorkflowState::Failed);
        assert_eq!(err.activity(), Some("Activity 2"));
        assert_eq!(err.attempts(), Some(4));
        assert_eq!(
            workflow.activity("Activity 3").unwrap().state(),
            ActivityState::Pending
        );
    }
}
