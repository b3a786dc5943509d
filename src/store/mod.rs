//! Counter store contract and backends.
//!
//! Stores hold time-stamped counters keyed by opaque string tokens from the
//! key builder; a store must never interpret key structure. Entries carry an
//! optional TTL and become inaccessible once it elapses.

mod memory;
mod serialized;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::ratelimit::RateLimitCounter;

pub use memory::MemoryCounterStore;
pub use serialized::{ByteCache, MemoryByteCache, SerializedCounterStore};

/// Failures a counter store can surface.
///
/// The limiter propagates these verbatim; it neither retries nor decides
/// fail-open/fail-closed on the caller's behalf.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O failure talking to the backend
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend did not answer within the caller's deadline
    #[error("store operation timed out")]
    Timeout,

    /// The caller cancelled the operation
    #[error("store operation cancelled")]
    Cancelled,

    /// A stored counter could not be encoded or decoded
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Key-value store of time-stamped counters with expiration support.
///
/// Implementations must be safe to share across tasks. Each operation is a
/// single atomic call; the limiter provides the read-merge-write exclusion
/// around them.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Whether an entry exists (and has not expired) under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Fetch the counter stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<RateLimitCounter>, StoreError>;

    /// Store `counter` under `key`. With a `ttl`, the entry must become
    /// inaccessible once the duration elapses; without one it never expires.
    async fn set(
        &self,
        key: &str,
        counter: &RateLimitCounter,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    /// Remove the entry under `key`, if any.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
