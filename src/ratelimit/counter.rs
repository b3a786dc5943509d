//! Rate limit counter value type.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Stores the initial access time of a window and the number of calls made
/// from that point.
///
/// `count` is a float because the sliding-window blend produces fractional
/// values before they are rounded; the persisted per-window count itself is
/// always a whole number in practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitCounter {
    /// When the window this counter belongs to started.
    pub timestamp: SystemTime,
    /// Number of calls attributed to this window.
    pub count: f64,
}

impl RateLimitCounter {
    /// A fresh counter for a window starting at `now` with one call recorded.
    pub fn first_call(now: SystemTime) -> Self {
        Self {
            timestamp: now,
            count: 1.0,
        }
    }

    /// Whether this counter's window ended more than `period` seconds before `now`.
    ///
    /// Bucket keys already rotate per slot, so this mostly guards against a
    /// stale entry surviving in the store past its window.
    pub fn is_expired(&self, period: u32, now: SystemTime) -> bool {
        self.timestamp + Duration::from_secs(u64::from(period)) < now
    }

    /// Seconds elapsed from the window start to `now`, zero if the
    /// timestamp is in the future (clock skew).
    pub fn elapsed(&self, now: SystemTime) -> Duration {
        now.duration_since(self.timestamp).unwrap_or(Duration::ZERO)
    }
}
