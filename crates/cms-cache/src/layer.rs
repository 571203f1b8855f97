//! Read-through caching on top of a [`CacheClient`]
//!
//! Two shapes are cached:
//! - Flat lists under a single key (lookup lists)
//! - A map under a single key whose fields each hold a list (published
//!   menus per locale) or a single value (published page per locale)
//!
//! The cache is never a source of truth. Every backend or codec failure is
//! logged and treated as a miss, and an empty cached list is a miss too.

use crate::client::CacheClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

type FieldMap = BTreeMap<String, serde_json::Value>;

/// Read-through cache with a fixed entry TTL
#[derive(Clone)]
pub struct CacheLayer {
    client: Arc<dyn CacheClient>,
    ttl: Duration,
}

impl CacheLayer {
    /// Create layer over `client`, writing entries with `ttl`
    #[must_use]
    pub fn new(client: Arc<dyn CacheClient>, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    /// Entry TTL
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Underlying client
    #[inline]
    #[must_use]
    pub fn client(&self) -> &Arc<dyn CacheClient> {
        &self.client
    }

    /// Serve the list under `key`, loading and caching it on a miss
    ///
    /// # Errors
    /// Only errors from `load` propagate.
    pub async fn read_through<T, E, F, Fut>(&self, key: &str, load: F) -> Result<Vec<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(hit) = self.read::<Vec<T>>(key).await.filter(|list| !list.is_empty()) {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }

        tracing::debug!(key, "cache miss");
        let fresh = load().await?;
        if !fresh.is_empty() {
            self.write(key, &fresh).await;
        }
        Ok(fresh)
    }

    /// Serve the list in `field` of the map under `key`
    ///
    /// On a miss the loaded list is merged into the existing map, leaving
    /// other fields untouched.
    ///
    /// # Errors
    /// Only errors from `load` propagate.
    pub async fn read_through_field<T, E, F, Fut>(
        &self,
        key: &str,
        field: &str,
        load: F,
    ) -> Result<Vec<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let map: FieldMap = self.read(key).await.unwrap_or_default();
        if let Some(hit) = field_hit::<Vec<T>>(&map, key, field).filter(|list| !list.is_empty()) {
            tracing::debug!(key, field, "cache hit");
            return Ok(hit);
        }

        tracing::debug!(key, field, "cache miss");
        let fresh = load().await?;
        if !fresh.is_empty() {
            self.write_field(key, map, field, &fresh).await;
        }
        Ok(fresh)
    }

    /// Serve the single value in `field` of the map under `key`
    ///
    /// A loader returning `None` is passed through and nothing is cached.
    ///
    /// # Errors
    /// Only errors from `load` propagate.
    pub async fn read_through_field_entry<T, E, F, Fut>(
        &self,
        key: &str,
        field: &str,
        load: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let map: FieldMap = self.read(key).await.unwrap_or_default();
        if let Some(hit) = field_hit::<T>(&map, key, field) {
            tracing::debug!(key, field, "cache hit");
            return Ok(Some(hit));
        }

        tracing::debug!(key, field, "cache miss");
        let fresh = load().await?;
        if let Some(value) = &fresh {
            self.write_field(key, map, field, value).await;
        }
        Ok(fresh)
    }

    /// Drop the entry under `key`
    pub async fn invalidate(&self, key: &str) {
        if let Err(err) = self.client.delete(key).await {
            tracing::warn!(key, error = %err, "cache delete failed");
        }
    }

    /// Drop one field of the map under `key`; drops the key once empty
    pub async fn invalidate_field(&self, key: &str, field: &str) {
        let Some(mut map) = self.read::<FieldMap>(key).await else {
            return;
        };
        if map.remove(field).is_none() {
            return;
        }
        if map.is_empty() {
            self.invalidate(key).await;
        } else {
            self.write(key, &map).await;
        }
    }

    async fn read<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        match self.client.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(key, error = %err, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache read failed");
                None
            }
        }
    }

    async fn write<V: Serialize + ?Sized>(&self, key: &str, value: &V) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache encode failed");
                return;
            }
        };
        if let Err(err) = self.client.set(key, bytes, self.ttl).await {
            tracing::warn!(key, error = %err, "cache write failed");
        }
    }

    async fn write_field<V: Serialize>(
        &self,
        key: &str,
        mut map: FieldMap,
        field: &str,
        value: &V,
    ) {
        match serde_json::to_value(value) {
            Ok(value) => {
                map.insert(field.to_string(), value);
                self.write(key, &map).await;
            }
            Err(err) => tracing::warn!(key, field, error = %err, "cache encode failed"),
        }
    }
}

fn field_hit<V: DeserializeOwned>(map: &FieldMap, key: &str, field: &str) -> Option<V> {
    let value = map.get(field)?;
    match serde_json::from_value(value.clone()) {
        Ok(hit) => Some(hit),
        Err(err) => {
            tracing::warn!(key, field, error = %err, "discarding undecodable cache field");
            None
        }
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer").field("ttl", &self.ttl).finish()
    }
}
