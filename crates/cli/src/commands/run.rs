// Run a workflow described on the command line

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use flowrun_engine::{
    BackoffPolicy, EngineConfig, ExecutionMode, FailurePolicy, LogAction, ScriptedAction, Workflow,
};
use tracing::info;

use super::execute_and_report;
use crate::output::OutputFormat;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow name
    #[arg(long, short, default_value = "workflow")]
    pub name: String,

    /// Activity as NAME[:RETRIES[:FAILURES|always]], in execution order
    #[arg(long = "activity", short = 'a', value_name = "SPEC", required = true)]
    pub activities: Vec<ActivitySpec>,

    /// Base delay between retries in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Backoff shape between retries
    #[arg(long, value_parser = ["fixed", "exponential", "none"])]
    pub backoff: Option<String>,

    /// Per-attempt time limit in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Execution mode
    #[arg(long, value_parser = ["sequential", "concurrent"])]
    pub mode: Option<String>,

    /// Maximum activities in flight (concurrent mode)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Let every activity finish after one fails (concurrent mode)
    #[arg(long, conflicts_with = "fail_fast")]
    pub collect_all: bool,

    /// Cancel remaining activities after one fails (concurrent mode)
    #[arg(long)]
    pub fail_fast: bool,
}

/// One activity parsed from `NAME[:RETRIES[:FAILURES|always]]`
///
/// Without a failure count the activity logs a line and succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySpec {
    pub name: String,
    pub max_retries: Option<u32>,
    pub failures: u32,
}

impl FromStr for ActivitySpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(format!("activity spec '{s}' has no name"));
        }

        let max_retries = match parts.next().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| format!("invalid retry count '{raw}' in '{s}'"))?,
            ),
        };

        let failures = match parts.next().map(str::trim) {
            None | Some("") => 0,
            Some("always") => u32::MAX,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| format!("invalid failure count '{raw}' in '{s}'"))?,
        };

        if parts.next().is_some() {
            return Err(format!("activity spec '{s}' has too many fields"));
        }

        Ok(Self {
            name: name.to_string(),
            max_retries,
            failures,
        })
    }
}

/// Layer command-line flags over the environment configuration
fn apply_overrides(mut config: EngineConfig, args: &RunArgs) -> EngineConfig {
    let delay = args.delay_ms.map(Duration::from_millis);

    config.backoff = match (args.backoff.as_deref(), delay) {
        (Some("none"), _) => BackoffPolicy::none(),
        (Some("exponential"), delay) => {
            let policy = BackoffPolicy::exponential();
            match delay {
                Some(delay) => policy.with_initial_interval(delay),
                None => policy,
            }
        }
        (Some(_), delay) => {
            BackoffPolicy::fixed(delay.unwrap_or(config.backoff.initial_interval))
        }
        (None, Some(delay)) if config.backoff.backoff_coefficient <= 1.0 => {
            BackoffPolicy::fixed(delay)
        }
        (None, Some(delay)) => config.backoff.clone().with_initial_interval(delay),
        (None, None) => config.backoff.clone(),
    };

    if let Some(ms) = args.timeout_ms {
        config.attempt_timeout = Some(Duration::from_millis(ms));
    }

    let (current_max, current_policy) = match config.execution_mode {
        ExecutionMode::Sequential => (10, FailurePolicy::default()),
        ExecutionMode::Concurrent {
            max_concurrency,
            failure_policy,
        } => (max_concurrency, failure_policy),
    };
    let policy = if args.collect_all {
        FailurePolicy::CollectAll
    } else if args.fail_fast {
        FailurePolicy::FailFast
    } else {
        current_policy
    };
    let concurrent = match args.mode.as_deref() {
        Some("concurrent") => true,
        Some(_) => false,
        None => matches!(config.execution_mode, ExecutionMode::Concurrent { .. }),
    };
    config.execution_mode = if concurrent {
        ExecutionMode::concurrent(policy)
            .with_max_concurrency(args.max_concurrency.unwrap_or(current_max))
    } else {
        ExecutionMode::Sequential
    };

    config
}

fn build_workflow(args: &RunArgs, config: EngineConfig) -> Result<Workflow> {
    let mut seen = std::collections::HashSet::new();
    for spec in &args.activities {
        if !seen.insert(spec.name.as_str()) {
            bail!("duplicate activity name '{}'", spec.name);
        }
    }

    let default_retries = config.default_max_retries;
    let mut builder = Workflow::builder(&args.name).with_config(config);
    for spec in &args.activities {
        let retries = spec.max_retries.unwrap_or(default_retries);
        builder = if spec.failures == 0 {
            builder.activity_with_retries(
                &spec.name,
                LogAction::new(format!("Executing {}", spec.name)),
                retries,
            )
        } else {
            builder.activity_with_retries(
                &spec.name,
                ScriptedAction::fail_times(spec.failures).with_message("simulated failure"),
                retries,
            )
        };
    }

    Ok(builder.build())
}

pub async fn run(args: RunArgs, format: OutputFormat) -> Result<bool> {
    let config = apply_overrides(EngineConfig::from_env(), &args);
    info!(
        workflow = %args.name,
        activities = args.activities.len(),
        mode = ?config.execution_mode,
        "starting workflow"
    );

    let workflow = build_workflow(&args, config)?;
    execute_and_report(workflow, format).await
}
