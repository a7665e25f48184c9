//! Reconnect delay schedule.

use std::time::Duration;

/// Exponential backoff parameters: `initial * factor^n`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub factor: f64,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 1.5,
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (zero based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let max = self.max.as_secs_f64();
        let mut secs = self.initial.as_secs_f64().min(max);
        if self.factor <= 1.0 {
            return Duration::from_secs_f64(secs);
        }
        for _ in 0..attempt {
            secs = (secs * self.factor).min(max);
            if secs >= max {
                break;
            }
        }
        Duration::from_secs_f64(secs)
    }

    pub fn schedule(&self) -> Backoff {
        Backoff {
            policy: *self,
            attempt: 0,
        }
    }
}

/// Iterator over successive delays of a [`BackoffPolicy`]. Never ends.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.policy.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let delays: Vec<f64> = BackoffPolicy::default()
            .schedule()
            .take(12)
            .map(|d| d.as_secs_f64())
            .collect();
        let expected = [
            1.0, 1.5, 2.25, 3.375, 5.0625, 7.59375, 11.390625, 17.0859375, 25.62890625, 30.0,
            30.0, 30.0,
        ];
        assert_eq!(delays.len(), expected.len());
        for (got, want) in delays.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_delay_is_capped_for_large_attempts() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(1000), Duration::from_secs(30));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_initial_above_cap() {
        let policy = BackoffPolicy {
            initial: Duration::from_secs(60),
            factor: 2.0,
            max: Duration::from_secs(30),
        };
        assert_eq!(policy.delay(0), Duration::from_secs(30));
    }
}
