//! Engine configuration
//!
//! Defaults applied to activities that are added to a workflow by name, plus the
//! driver used to execute the workflow. Loaded from environment variables or
//! built in code.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::reliability::{option_duration_millis, saturating_millis, BackoffPolicy};

/// What the concurrent driver does when an activity is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Cancel the remaining activities at their next attempt boundary
    #[default]
    FailFast,

    /// Let every activity run to a terminal state
    CollectAll,
}

/// How a workflow drives its activities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One activity at a time, in declaration order, aborting on the first failure
    #[default]
    Sequential,

    /// All activities at once, each with its own retry loop; no ordering guarantee
    Concurrent {
        /// Maximum activities in flight
        max_concurrency: usize,

        /// Reaction to the first exhausted activity
        failure_policy: FailurePolicy,
    },
}

impl ExecutionMode {
    /// Concurrent mode with up to 10 activities in flight
    pub fn concurrent(failure_policy: FailurePolicy) -> Self {
        Self::Concurrent {
            max_concurrency: 10,
            failure_policy,
        }
    }

    /// Set the concurrency limit (no effect in sequential mode)
    pub fn with_max_concurrency(self, max: usize) -> Self {
        match self {
            Self::Sequential => Self::Sequential,
            Self::Concurrent { failure_policy, .. } => Self::Concurrent {
                max_concurrency: max.max(1),
                failure_policy,
            },
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Retry budget for activities added without an explicit one
    pub default_max_retries: u32,

    /// Backoff applied to activities added by name
    pub backoff: BackoffPolicy,

    /// Per-attempt time limit applied to activities added by name
    #[serde(with = "option_duration_millis")]
    pub attempt_timeout: Option<Duration>,

    /// Driver used by workflows built with this config
    pub execution_mode: ExecutionMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_retries: 3,
            backoff: BackoffPolicy::default(),
            attempt_timeout: None,
            execution_mode: ExecutionMode::Sequential,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `FLOWRUN_MAX_RETRIES`: Default retry budget (default: 3)
    /// - `FLOWRUN_RETRY_DELAY_MS`: Base retry delay in milliseconds (default: 2000)
    /// - `FLOWRUN_BACKOFF`: `fixed`, `exponential` or `none` (default: fixed)
    /// - `FLOWRUN_ATTEMPT_TIMEOUT_MS`: Per-attempt time limit (default: unset)
    /// - `FLOWRUN_EXECUTION_MODE`: `sequential` or `concurrent` (default: sequential)
    /// - `FLOWRUN_MAX_CONCURRENCY`: Concurrent mode limit (default: 10)
    /// - `FLOWRUN_FAILURE_POLICY`: `fail_fast` or `collect_all` (default: fail_fast)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable values are logged and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_max_retries =
            parse_or("FLOWRUN_MAX_RETRIES", &lookup, defaults.default_max_retries);

        let delay = Duration::from_millis(parse_or(
            "FLOWRUN_RETRY_DELAY_MS",
            &lookup,
            saturating_millis(defaults.backoff.initial_interval),
        ));
        let backoff = match lookup("FLOWRUN_BACKOFF").as_deref().map(str::trim) {
            None | Some("fixed") => BackoffPolicy::fixed(delay),
            Some("exponential") => BackoffPolicy::exponential().with_initial_interval(delay),
            Some("none") => BackoffPolicy::none(),
            Some(other) => {
                warn!(key = "FLOWRUN_BACKOFF", value = other, "unknown backoff, using fixed");
                BackoffPolicy::fixed(delay)
            }
        };

        let attempt_timeout = lookup("FLOWRUN_ATTEMPT_TIMEOUT_MS").and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(_) => {
                    warn!(key = "FLOWRUN_ATTEMPT_TIMEOUT_MS", value = %raw, "invalid timeout, ignoring");
                    None
                }
            }
        });

        let failure_policy = match lookup("FLOWRUN_FAILURE_POLICY").as_deref().map(str::trim) {
            None | Some("fail_fast") => FailurePolicy::FailFast,
            Some("collect_all") => FailurePolicy::CollectAll,
            Some(other) => {
                warn!(key = "FLOWRUN_FAILURE_POLICY", value = other, "unknown failure policy, using fail_fast");
                FailurePolicy::FailFast
            }
        };

        let execution_mode = match lookup("FLOWRUN_EXECUTION_MODE").as_deref().map(str::trim) {
            None | Some("sequential") => ExecutionMode::Sequential,
            Some("concurrent") => ExecutionMode::concurrent(failure_policy)
                .with_max_concurrency(parse_or("FLOWRUN_MAX_CONCURRENCY", &lookup, 10)),
            Some(other) => {
                warn!(key = "FLOWRUN_EXECUTION_MODE", value = other, "unknown execution mode, using sequential");
                ExecutionMode::Sequential
            }
        };

        Self {
            default_max_retries,
            backoff,
            attempt_timeout,
            execution_mode,
        }
    }

    /// Set the default retry budget
    pub fn with_default_max_retries(mut self, max_retries: u32) -> Self {
        self.default_max_retries = max_retries;
        self
    }

    /// Set the backoff policy
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Set the execution mode
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[]));

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_max_retries, 3);
        assert_eq!(config.backoff, BackoffPolicy::fixed(Duration::from_secs(2)));
        assert_eq!(config.execution_mode, ExecutionMode::Sequential);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("FLOWRUN_MAX_RETRIES", "5"),
            ("FLOWRUN_RETRY_DELAY_MS", "250"),
            ("FLOWRUN_BACKOFF", "exponential"),
            ("FLOWRUN_ATTEMPT_TIMEOUT_MS", "1000"),
            ("FLOWRUN_EXECUTION_MODE", "concurrent"),
            ("FLOWRUN_MAX_CONCURRENCY", "4"),
            ("FLOWRUN_FAILURE_POLICY", "collect_all"),
        ]));

        assert_eq!(config.default_max_retries, 5);
        assert_eq!(config.backoff.initial_interval, Duration::from_millis(250));
        assert_eq!(config.backoff.backoff_coefficient, 2.0);
        assert_eq!(config.attempt_timeout, Some(Duration::from_secs(1)));
        assert_eq!(
            config.execution_mode,
            ExecutionMode::Concurrent {
                max_concurrency: 4,
                failure_policy: FailurePolicy::CollectAll,
            }
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("FLOWRUN_MAX_RETRIES", "many"),
            ("FLOWRUN_BACKOFF", "sideways"),
            ("FLOWRUN_EXECUTION_MODE", "parallel-ish"),
        ]));

        assert_eq!(config.default_max_retries, 3);
        assert_eq!(config.backoff, BackoffPolicy::default());
        assert_eq!(config.execution_mode, ExecutionMode::Sequential);
    }

    #[test]
    fn test_max_concurrency_floor() {
        let mode = ExecutionMode::concurrent(FailurePolicy::FailFast).with_max_concurrency(0);
        assert!(matches!(
            mode,
            ExecutionMode::Concurrent {
                max_concurrency: 1,
                ..
            }
        ));
        assert_eq!(
            ExecutionMode::Sequential.with_max_concurrency(8),
            ExecutionMode::Sequential
        );
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig::default()
            .with_attempt_timeout(Duration::from_millis(1500))
            .with_execution_mode(ExecutionMode::concurrent(FailurePolicy::CollectAll));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["attempt_timeout"], 1500);
        assert_eq!(json["execution_mode"]["mode"], "concurrent");
        assert_eq!(json["execution_mode"]["failure_policy"], "collect_all");

        let parsed: EngineConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config, parsed);
    }
}
