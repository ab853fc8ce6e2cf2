//! Backoff between activity attempts

use std::fmt::Debug;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decides how long an activity waits between a failed attempt and the next one
///
/// Implement this to plug a custom delay schedule into an [`Activity`](crate::Activity).
/// The engine only consults the strategy when another attempt will actually be
/// made, so no delay ever follows the final failing attempt.
pub trait BackoffStrategy: Send + Sync + Debug {
    /// Delay before retry number `retry` (1-based: 1 is the wait before the second attempt)
    fn delay_for_retry(&self, retry: u32) -> Duration;
}

/// Configurable backoff schedule
///
/// Covers fixed delays, exponential growth with a cap, and optional jitter.
///
/// # Example
///
/// ```
/// use flowrun_engine::{BackoffPolicy, BackoffStrategy};
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::exponential()
///     .with_initial_interval(Duration::from_millis(500))
///     .with_max_interval(Duration::from_secs(10))
///     .with_jitter(0.0);
///
/// assert_eq!(policy.delay_for_retry(1), Duration::from_millis(500));
/// assert_eq!(policy.delay_for_retry(2), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    #[serde(with = "duration_millis")]
    pub initial_interval: Duration,

    /// Upper bound on any single delay
    #[serde(with = "duration_millis")]
    pub max_interval: Duration,

    /// Growth factor per retry (1.0 = fixed)
    pub backoff_coefficient: f64,

    /// Jitter factor (0.0-1.0)
    ///
    /// A value of 0.1 means ±10% randomness.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

impl BackoffPolicy {
    /// Same delay before every retry
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            backoff_coefficient: 1.0,
            jitter: 0.0,
        }
    }

    /// Exponential backoff with sensible defaults
    ///
    /// - 1 second initial interval
    /// - 60 second max interval
    /// - 2x backoff coefficient
    /// - 10% jitter
    pub fn exponential() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
            backoff_coefficient: 2.0,
            jitter: 0.1,
        }
    }

    /// Retry immediately
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Set the initial retry interval
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the maximum retry interval
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the backoff coefficient
    pub fn with_backoff_coefficient(mut self, coefficient: f64) -> Self {
        self.backoff_coefficient = coefficient.max(1.0);
        self
    }

    /// Set the jitter factor (0.0-1.0)
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }
}

impl BackoffStrategy for BackoffPolicy {
    fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let base = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent);
        let capped = base.min(self.max_interval.as_secs_f64());

        let jitter_range = capped * self.jitter;
        let jittered = if jitter_range > 0.0 {
            let offset = rand::thread_rng().gen_range(-jitter_range..jitter_range);
            (capped + offset).max(0.0)
        } else {
            capped
        };

        // Saturates to the cap when the float overflows Duration
        Duration::try_from_secs_f64(jittered).unwrap_or(self.max_interval)
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serde support for Duration as milliseconds
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Serde support for Option<Duration> as milliseconds
pub(crate) mod option_duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_millis().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_two_seconds() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(5), Duration::from_secs(2));
    }

    #[test]
    fn test_uncapped_exponential_saturates() {
        let policy = BackoffPolicy::exponential()
            .with_max_interval(Duration::MAX)
            .with_jitter(0.0);

        assert_eq!(policy.delay_for_retry(200), Duration::MAX);
        assert_eq!(policy.delay_for_retry(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_no_delay_for_retry_zero() {
        let policy = BackoffPolicy::exponential().with_jitter(0.0);
        assert_eq!(policy.delay_for_retry(0), Duration::ZERO);
    }

    #[test]
    fn test_exponential_growth() {
        let policy = BackoffPolicy::exponential().with_jitter(0.0);

        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(4));
    }

    #[test]
    fn test_max_interval_cap() {
        let policy = BackoffPolicy::exponential()
            .with_max_interval(Duration::from_secs(5))
            .with_jitter(0.0);

        assert_eq!(policy.delay_for_retry(10), Duration::from_secs(5));
        assert_eq!(policy.delay_for_retry(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(10)).with_jitter(0.5);

        for retry in 1..50 {
            let delay = policy.delay_for_retry(retry);
            assert!(delay >= Duration::from_secs(5));
            assert!(delay <= Duration::from_secs(15));
        }
    }

    #[test]
    fn test_none_never_waits() {
        let policy = BackoffPolicy::none().with_jitter(0.5);
        assert_eq!(policy.delay_for_retry(3), Duration::ZERO);
    }

    #[test]
    fn test_serialization() {
        let policy = BackoffPolicy::exponential().with_max_interval(Duration::from_secs(30));

        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"max_interval\":30000"));

        let parsed: BackoffPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, parsed);
    }
}
