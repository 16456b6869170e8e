//! Backoff between subscriber connection attempts

use database::common::{apply_jitter, backoff_delay_ms};
use std::time::Duration;

/// Exponential reconnect backoff with a cap and optional jitter.
///
/// Unlike [`database::common::RetryConfig`] there is no attempt limit: a
/// subscriber keeps trying for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl ReconnectPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            ..Self::default()
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Wait before reconnect attempt `attempt` (1-based, counted since the
    /// last successful subscription).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let nominal = backoff_delay_ms(
            self.initial_delay.as_millis() as u64,
            self.multiplier,
            self.max_delay.as_millis() as u64,
            attempt,
        );
        Duration::from_millis(if self.jitter {
            apply_jitter(nominal)
        } else {
            nominal
        })
    }
}

impl Default for ReconnectPolicy {
    /// 50ms doubling up to 2s, with jitter.
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(2000),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_until_cap() {
        let policy = ReconnectPolicy::default().without_jitter();
        let delays: Vec<u64> = (1..=8)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![50, 100, 200, 400, 800, 1600, 2000, 2000]);
    }

    #[test]
    fn test_delay_never_exceeds_cap_for_large_attempts() {
        let policy = ReconnectPolicy::default();
        for attempt in [10, 100, 10_000, u32::MAX] {
            assert!(policy.delay_for(attempt) <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_jitter_keeps_delay_within_half_to_full() {
        let policy = ReconnectPolicy::new(Duration::from_millis(400), Duration::from_secs(5));
        for _ in 0..20 {
            let delay = policy.delay_for(1).as_millis();
            assert!((200..=400).contains(&delay));
        }
    }

    #[test]
    fn test_multiplier_below_one_is_treated_as_constant() {
        let policy = ReconnectPolicy::default()
            .with_multiplier(0.5)
            .without_jitter();
        assert_eq!(policy.delay_for(5), Duration::from_millis(50));
    }
}
