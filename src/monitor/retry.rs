//! Retry policy for failed polls.

use std::time::Duration;

use serde::Deserialize;

/// How the scheduler treats consecutive poll transport failures.
///
/// The default keeps polling at the regular interval forever. Setting a cap
/// makes the scheduler give up, and a multiplier above 1.0 spaces polls out
/// after each failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Give up after this many failures in a row. `None` never gives up.
    pub max_consecutive_failures: Option<u32>,

    /// Backoff multiplier applied per consecutive failure.
    pub backoff_multiplier: f64,

    /// Upper bound for a backed-off delay.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: None,
            backoff_multiplier: 1.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that stops after `max` failures in a row.
    pub fn capped(max: u32) -> Self {
        Self {
            max_consecutive_failures: Some(max),
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.backoff_multiplier = multiplier;
        self.max_delay_ms = max_delay.as_millis() as u64;
        self
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn is_exhausted(&self, failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|max| failures >= max)
    }

    /// Delay before the next poll after `failures` consecutive failures.
    ///
    /// `interval * multiplier^(failures - 1)`, capped at `max_delay` but never
    /// shorter than `interval`.
    pub fn next_delay(&self, interval: Duration, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let delay = interval.as_secs_f64() * factor;
        let capped = delay.min(self.max_delay().as_secs_f64().max(interval.as_secs_f64()));
        Duration::from_secs_f64(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn default_policy_retries_forever_at_fixed_interval() {
        let policy = RetryPolicy::default();

        assert!(!policy.is_exhausted(u32::MAX));
        assert_eq!(policy.next_delay(SECOND, 1), SECOND);
        assert_eq!(policy.next_delay(SECOND, 50), SECOND);
    }

    #[test]
    fn exponential_backoff_increases_until_capped() {
        let policy = RetryPolicy::default().with_backoff(2.0, Duration::from_secs(5));

        assert_eq!(policy.next_delay(SECOND, 1), SECOND);
        assert_eq!(policy.next_delay(SECOND, 2), Duration::from_secs(2));
        assert_eq!(policy.next_delay(SECOND, 3), Duration::from_secs(4));
        assert_eq!(policy.next_delay(SECOND, 4), Duration::from_secs(5));
        assert_eq!(policy.next_delay(SECOND, 40), Duration::from_secs(5));
    }

    #[test]
    fn cap_is_reached_at_max_failures() {
        let policy = RetryPolicy::capped(3);

        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }

    #[test]
    fn small_max_delay_never_undercuts_interval() {
        let policy = RetryPolicy::default().with_backoff(3.0, Duration::from_millis(10));

        assert_eq!(policy.next_delay(SECOND, 3), SECOND);
    }
}
