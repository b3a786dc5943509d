//! Two-window sliding estimate.
//!
//! Two adjacent fixed windows approximate a sliding window: the estimate
//! blends the current window's count with the previous window's count,
//! weighted by how far into the current window "now" sits:
//!
//! ```text
//! total = ceil(current * fraction + previous * (1 - fraction))
//! fraction = (now - current.timestamp) / period
//! ```

use std::time::SystemTime;

use super::counter::RateLimitCounter;

/// Blend the current and previous window counts into one estimated total.
///
/// With no previous window the estimate is just the current count. The
/// blend fraction is clamped to `[0, 1]`: a stale current bucket or a
/// skewed store timestamp must not push the weighting outside the windows
/// it interpolates between. The result is always rounded up, so fractional
/// spillover from the previous window rejects slightly early rather than
/// late.
pub fn merge_windows(
    current: &RateLimitCounter,
    previous: Option<&RateLimitCounter>,
    now: SystemTime,
    period: u32,
) -> f64 {
    let Some(previous) = previous else {
        return current.count;
    };

    let elapsed = current.elapsed(now).as_secs_f64();
    let fraction = (elapsed / f64::from(period)).clamp(0.0, 1.0);

    (current.count * fraction + previous.count * (1.0 - fraction)).ceil()
}
