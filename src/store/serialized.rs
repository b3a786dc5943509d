//! Counter store adapter for byte-level caches.
//!
//! Networked caches (redis, memcached, a distributed cache service) expose
//! get/set/remove of raw bytes with a TTL. [`SerializedCounterStore`] turns
//! any such cache into a [`CounterStore`] by encoding counters as JSON, so
//! the limiter core never depends on a particular cache client.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::ratelimit::RateLimitCounter;

use super::{CounterStore, StoreError};

/// Byte-level cache capability, the shape networked caches expose.
#[async_trait]
pub trait ByteCache: Send + Sync {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    async fn remove_bytes(&self, key: &str) -> Result<(), StoreError>;
}

/// A [`CounterStore`] over any [`ByteCache`], serializing counters as JSON.
#[derive(Debug)]
pub struct SerializedCounterStore<C> {
    cache: C,
}

impl<C: ByteCache> SerializedCounterStore<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<C: ByteCache> CounterStore for SerializedCounterStore<C> {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.cache.get_bytes(key).await?.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<RateLimitCounter>, StoreError> {
        match self.cache.get_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        counter: &RateLimitCounter,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(counter)?;
        self.cache.set_bytes(key, bytes, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.cache.remove_bytes(key).await
    }
}

/// In-memory [`ByteCache`], mainly for tests and as a reference
/// implementation of the cache contract.
///
/// TTLs are honored the same lazy way as [`super::MemoryCounterStore`].
#[derive(Debug, Default)]
pub struct MemoryByteCache {
    entries: DashMap<String, (Vec<u8>, Option<std::time::SystemTime>)>,
}

impl MemoryByteCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ByteCache for MemoryByteCache {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = std::time::SystemTime::now();

        if let Some(entry) = self.entries.get(key) {
            let (bytes, expires_at) = entry.value();
            if !matches!(expires_at, Some(deadline) if *deadline <= now) {
                return Ok(Some(bytes.clone()));
            }
        } else {
            return Ok(None);
        }

        self.entries
            .remove_if(key, |_, (_, expires_at)| {
                matches!(expires_at, Some(deadline) if *deadline <= now)
            });
        Ok(None)
    }

    async fn set_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let expires_at = ttl.map(|ttl| std::time::SystemTime::now() + ttl);
        self.entries.insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn remove_bytes(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
