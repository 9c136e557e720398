// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delay schedule between reconnect attempts.

use std::time::Duration;

pub use tradechat_config::BackoffKind;

/// How long to wait before each reconnect, and when to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub backoff: BackoffKind,
    pub max_delay: Duration,
    /// Consecutive failures tolerated before giving up. `None` never gives up.
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// Retry forever, always after `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            backoff: BackoffKind::Fixed,
            max_delay: delay,
            max_attempts: None,
        }
    }

    /// Delay before the retry that follows the `failures`-th consecutive
    /// failure (1-based), or `None` once the attempt cap is exceeded.
    pub fn delay_for(&self, failures: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts
            && failures > max
        {
            return None;
        }

        let delay = match self.backoff {
            BackoffKind::Fixed => self.base_delay,
            BackoffKind::Exponential => {
                let shift = failures.saturating_sub(1).min(31);
                self.base_delay
                    .checked_mul(1u32 << shift)
                    .unwrap_or(self.max_delay)
                    .min(self.max_delay)
            }
        };
        Some(delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_policy_never_gives_up() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_for(10_000), Some(Duration::from_secs(3)));
    }

    #[test]
    fn exponential_doubles_up_to_cap() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_secs(1),
            backoff: BackoffKind::Exponential,
            max_delay: Duration::from_secs(10),
            max_attempts: None,
        };
        let delays: Vec<_> = (1..=6).map(|n| policy.delay_for(n).unwrap()).collect();
        assert_eq!(
            delays,
            [1, 2, 4, 8, 10, 10].map(Duration::from_secs).to_vec()
        );
    }

    #[test]
    fn attempt_cap_stops_retries() {
        let policy = ReconnectPolicy {
            max_attempts: Some(2),
            ..ReconnectPolicy::default()
        };
        assert!(policy.delay_for(1).is_some());
        assert!(policy.delay_for(2).is_some());
        assert!(policy.delay_for(3).is_none());
    }

    proptest! {
        #[test]
        fn exponential_delay_stays_within_bounds(
            base_ms in 1u64..10_000,
            extra_ms in 0u64..100_000,
            failures in 1u32..200,
        ) {
            let policy = ReconnectPolicy {
                base_delay: Duration::from_millis(base_ms),
                backoff: BackoffKind::Exponential,
                max_delay: Duration::from_millis(base_ms + extra_ms),
                max_attempts: None,
            };
            let delay = policy.delay_for(failures).unwrap();
            prop_assert!(delay >= policy.base_delay);
            prop_assert!(delay <= policy.max_delay);
        }
    }
}
