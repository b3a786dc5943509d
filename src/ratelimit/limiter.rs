//! Core rate limiter implementation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::store::CounterStore;

use super::counter::RateLimitCounter;
use super::identity::RequestIdentity;
use super::key::build_counter_keys;
use super::rules::RateLimitRule;
use super::window::merge_windows;

/// Number of lock stripes. Unrelated buckets hash to different stripes so a
/// hot client does not serialize everyone else's evaluations.
const LOCK_STRIPES: usize = 64;

/// Persisted buckets outlive their own window by this factor so they can
/// still serve as "previous" for the next window and absorb store skew.
const TTL_PERIODS: u32 = 3;

/// The core sliding-window rate limiter.
///
/// Evaluates requests against a [`CounterStore`] of per-window counters.
/// Thread-safe; share one instance across tasks behind an `Arc`.
pub struct RateLimiter<S> {
    store: S,
    clock: Arc<dyn Clock>,
    locks: Vec<RwLock<()>>,
}

impl<S: CounterStore> RateLimiter<S> {
    /// Create a limiter over `store` using the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a limiter with an explicit clock, for tests or hosts with
    /// their own time source.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: (0..LOCK_STRIPES).map(|_| RwLock::new(())).collect(),
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn stripe(&self, key: &str) -> &RwLock<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.locks[hasher.finish() as usize % LOCK_STRIPES]
    }

    /// Evaluate a request against `rule`, recording it when admitted.
    ///
    /// Returns `Ok(true)` when the request may proceed and `Ok(false)` when
    /// the quota is exhausted. Store failures propagate as errors; whether
    /// to then fail open or closed is the caller's decision.
    ///
    /// A rule with `limit == 0` rejects unconditionally without touching
    /// the store.
    pub async fn process_request(
        &self,
        identity: &RequestIdentity,
        rule: &RateLimitRule,
    ) -> Result<bool> {
        if rule.limit == 0 {
            info!(
                identity = %identity.identity,
                verb = %identity.http_verb,
                path = %identity.path,
                limit = rule.limit,
                period = rule.period,
                "request blocked, no quota configured"
            );
            return Ok(false);
        }

        let now = self.clock.now();
        let keys = build_counter_keys(identity, rule, now)?;

        trace!(key = %keys.current, "evaluating request against current window");

        // Hold the stripe exclusively across read-merge-decide-write so two
        // concurrent admits cannot both see the same count and lose one
        // increment.
        let _guard = self.stripe(&keys.current).write().await;

        let current = match self.store.get(&keys.current).await? {
            Some(mut counter) if !counter.is_expired(rule.period, now) => {
                // Current slot alone full: skip the previous-window fetch.
                if counter.count >= f64::from(rule.limit) {
                    info!(
                        identity = %identity.identity,
                        verb = %identity.http_verb,
                        path = %identity.path,
                        limit = rule.limit,
                        period = rule.period,
                        "request blocked, quota reached in current slot"
                    );
                    return Ok(false);
                }

                counter.count += 1.0;
                counter
            }
            // Absent or left over from an earlier window.
            _ => RateLimitCounter::first_call(now),
        };

        let previous = self.store.get(&keys.previous).await?;
        let total = merge_windows(&current, previous.as_ref(), now, rule.period);

        if total > f64::from(rule.limit) {
            info!(
                identity = %identity.identity,
                verb = %identity.http_verb,
                path = %identity.path,
                limit = rule.limit,
                period = rule.period,
                estimated = total,
                "request blocked, quota exceeded across current and previous slots"
            );
            return Ok(false);
        }

        // Persist the window's own count, not the blended estimate.
        let ttl = Duration::from_secs(u64::from(rule.period) * u64::from(TTL_PERIODS))
            .saturating_sub(current.elapsed(now));
        self.store.set(&keys.current, &current, Some(ttl)).await?;

        debug!(
            key = %keys.current,
            count = current.count,
            estimated = total,
            "request admitted"
        );
        Ok(true)
    }

    /// Remaining quota in the current window for `identity` under `rule`.
    ///
    /// May be negative when the window is already over quota; callers must
    /// treat negative values as "blocked", not as capacity. A rule with
    /// `limit == 0` reports zero without consulting the store.
    pub async fn check_availability(
        &self,
        identity: &RequestIdentity,
        rule: &RateLimitRule,
    ) -> Result<i64> {
        if rule.limit == 0 {
            return Ok(0);
        }

        let now = self.clock.now();
        let keys = build_counter_keys(identity, rule, now)?;

        let _guard = self.stripe(&keys.current).read().await;

        match self.store.get(&keys.current).await? {
            None => Ok(i64::from(rule.limit)),
            Some(counter) => Ok(i64::from(rule.limit) - counter.count as i64),
        }
    }
}
