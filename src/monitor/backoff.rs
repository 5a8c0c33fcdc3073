//! Reconnect backoff.

use crate::config::ReconnectConfig;
use std::time::Duration;

/// Calculates the delay before reconnect attempt `attempt` (1-based).
///
/// Formula: `base * 2^(attempt-1)`, capped at `max`. Attempt 0 waits nothing.
///
/// With base=5s, max=300s:
/// - Attempt 1: 5s
/// - Attempt 2: 10s
/// - Attempt 3: 20s
/// - Attempt 7+: 300s (capped)
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let multiplier = 2u32.saturating_pow(attempt - 1);
    base.saturating_mul(multiplier).min(max)
}

/// Per-monitor reconnect bookkeeping.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    base: Duration,
    max: Duration,
    max_attempts: Option<u32>,
    attempt: u32,
}

impl ReconnectPolicy {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            base: config.base_delay(),
            max: config.max_delay(),
            max_attempts: config.max_attempts,
            attempt: 0,
        }
    }

    /// Delay before the next reconnect, or `None` once attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempt >= max) {
            return None;
        }
        self.attempt += 1;
        Some(calculate_backoff(self.attempt, self.base, self.max))
    }

    /// Called once a session reaches Connected.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_secs(5);
        let max = Duration::from_secs(300);
        assert_eq!(calculate_backoff(0, base, max), Duration::ZERO);
        assert_eq!(calculate_backoff(1, base, max), Duration::from_secs(5));
        assert_eq!(calculate_backoff(2, base, max), Duration::from_secs(10));
        assert_eq!(calculate_backoff(3, base, max), Duration::from_secs(20));
        assert_eq!(calculate_backoff(7, base, max), Duration::from_secs(300));
        assert_eq!(calculate_backoff(u32::MAX, base, max), max);
    }

    #[test]
    fn policy_gives_up_after_max_attempts() {
        let mut policy = ReconnectPolicy::new(&ReconnectConfig {
            base_delay_secs: 1,
            max_delay_secs: 4,
            max_attempts: Some(3),
        });
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(1)));
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(2)));
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(4)));
        assert_eq!(policy.next_delay(), None);

        policy.reset();
        assert_eq!(policy.attempt(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn unlimited_policy_keeps_going() {
        let mut policy = ReconnectPolicy::new(&ReconnectConfig::default());
        for _ in 0..100 {
            assert!(policy.next_delay().is_some());
        }
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(300)));
    }
}
