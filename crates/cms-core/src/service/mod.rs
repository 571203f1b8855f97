//! CMS service facade
//!
//! [`Cms`] wires the pieces together for every mutation:
//! 1. validate the request
//! 2. run the conflict check against a fresh read (updates only)
//! 3. reconcile inside one store transaction
//! 4. commit, then invalidate the affected cache entries
//!
//! Store and cache are injected; nothing here is process-global.

mod apps;
mod menus;
mod modules;
mod pages;
mod versions;

use crate::config::CmsConfig;
use crate::error::{CmsError, CmsResult};
use cms_cache::{CacheClient, CacheLayer, MokaCacheClient};
use cms_model::LookupEntry;
use cms_store::{EntityRef, MemoryStore, StoreTx, TreeStore};
use std::sync::Arc;

/// CMS service over a tree store and a cache backend
pub struct Cms<S: TreeStore> {
    store: S,
    cache: CacheLayer,
    config: CmsConfig,
}

impl<S: TreeStore> Cms<S> {
    /// Create service from its collaborators
    #[must_use]
    pub fn new(store: S, cache: Arc<dyn CacheClient>, config: CmsConfig) -> Self {
        let cache = CacheLayer::new(cache, config.cache_ttl());
        Self {
            store,
            cache,
            config,
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cache layer
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    async fn begin(&self) -> CmsResult<S::Tx> {
        Ok(self.store.begin().await?)
    }
}

impl Cms<MemoryStore> {
    /// Service on an empty in-memory store with an in-process cache
    #[must_use]
    pub fn in_memory(config: CmsConfig) -> Self {
        let cache = Arc::new(MokaCacheClient::new(config.cache_capacity));
        Self::new(MemoryStore::new(), cache, config)
    }
}

impl<S: TreeStore> std::fmt::Debug for Cms<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cms")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Restore a soft-deleted record
///
/// `live` says whether the record is currently visible; restoring a live
/// record is a caller mistake.
async fn restore_entity<T: StoreTx>(tx: &mut T, entity: EntityRef, live: bool) -> CmsResult<()> {
    if live {
        return Err(CmsError::validation(format!("{entity} is not deleted")));
    }
    if !tx.restore(entity.clone()).await? {
        return Err(CmsError::not_found(&entity));
    }
    Ok(())
}

/// Reject a request naming an app that does not exist
async fn require_app<T: StoreTx>(tx: &mut T, name: &str) -> CmsResult<()> {
    if tx.app(name).await?.is_none() {
        return Err(CmsError::NotFound {
            entity: format!("app '{name}'"),
        });
    }
    Ok(())
}

/// Apply an optional case-insensitive name filter
fn filter_lookup<I>(entries: Vec<LookupEntry<I>>, name: Option<&str>) -> Vec<LookupEntry<I>> {
    match name {
        Some(needle) => entries
            .into_iter()
            .filter(|entry| entry.name_contains(needle))
            .collect(),
        None => entries,
    }
}

/// Whether `name` is free, treating `ignore` (the record's current name) as free
fn name_free<'a>(
    mut taken: impl Iterator<Item = &'a str>,
    name: &str,
    ignore: Option<&str>,
) -> bool {
    ignore == Some(name) || !taken.any(|existing| existing == name)
}
