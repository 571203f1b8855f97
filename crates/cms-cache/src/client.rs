//! Cache client seam and the moka-backed client
//!
//! [`CacheClient`] is the narrow key/value surface the CMS needs from a
//! shared cache: byte values, per-entry TTL, delete. [`MokaCacheClient`]
//! implements it in process.

use crate::error::CacheResult;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Key/value cache backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheClient: Send + Sync {
    /// Whether a live entry exists
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Raw value of a live entry
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value for `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Remove an entry; missing keys are not an error
    async fn delete(&self, key: &str) -> CacheResult<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    bytes: Arc<Vec<u8>>,
    ttl: Duration,
}

/// Expire each entry after the TTL it was written with
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process [`CacheClient`] on top of `moka::future::Cache`
#[derive(Clone)]
pub struct MokaCacheClient {
    inner: Cache<String, Entry>,
}

impl MokaCacheClient {
    /// Create client holding at most `max_capacity` entries
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MokaCacheClient {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl std::fmt::Debug for MokaCacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheClient")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[async_trait::async_trait]
impl CacheClient for MokaCacheClient {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.inner.get(key).await.is_some())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self
            .inner
            .get(key)
            .await
            .map(|entry| entry.bytes.as_ref().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let entry = Entry {
            bytes: Arc::new(value),
            ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}
