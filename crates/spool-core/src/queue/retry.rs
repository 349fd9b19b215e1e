//! Retry policy: decides backoff delays.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff schedule shared by every task kind.
///
/// Configured in whole seconds:
/// `{ "base_delay_secs": 2, "multiplier": 2.0, "max_delay_secs": 300 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    #[serde(rename = "base_delay_secs", with = "secs")]
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for any single delay.
    #[serde(rename = "max_delay_secs", with = "secs")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// `min(2^retry_count, 300)` seconds.
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt.
    ///
    /// # Arguments
    /// * `retry_count` - failures so far, *after* counting the one that just happened.
    ///
    /// delay = min(base_delay * multiplier^(retry_count - 1), max_delay)
    ///
    /// With the defaults:
    /// - retry 1: 2s
    /// - retry 2: 4s
    /// - retry 3: 8s
    /// - retry 9 and later: 300s
    pub fn next_delay(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let max_secs = self.max_delay.as_secs_f64();

        if !delay_secs.is_finite() || delay_secs >= max_secs {
            return self.max_delay;
        }
        Duration::from_secs_f64(delay_secs.max(0.0))
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
