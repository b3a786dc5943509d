//! Process-local counter store.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::ratelimit::RateLimitCounter;

use super::{CounterStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    counter: RateLimitCounter,
    expires_at: Option<SystemTime>,
}

impl Entry {
    fn is_expired(&self, now: SystemTime) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-memory counter store backed by a concurrent map.
///
/// Expired entries are dropped lazily when touched, so the map only ever
/// holds live buckets plus recently dead ones awaiting their next access.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, Entry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired or not. Test hook.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_counter(&self, key: &str) -> Option<RateLimitCounter> {
        let now = SystemTime::now();

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.counter.clone());
            }
        } else {
            return None;
        }

        // Drop the read guard before removing the dead entry.
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.live_counter(key).is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<RateLimitCounter>, StoreError> {
        Ok(self.live_counter(key))
    }

    async fn set(
        &self,
        key: &str,
        counter: &RateLimitCounter,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let entry = Entry {
            counter: counter.clone(),
            expires_at: ttl.map(|ttl| SystemTime::now() + ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
