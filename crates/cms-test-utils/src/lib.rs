//! Testing utilities for the CMS workspace
//!
//! Shared fixtures, snapshot builders and instrumented cache backends.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use cms_cache::{CacheClient, CacheError, CacheResult};
use cms_core::{Cms, CmsConfig};
use cms_model::{
    App, ColumnLayout, CreateVersion, MenuNode, MenuTree, Page, PagePartial, Timestamp,
    UpdateColumn, UpdateMenu, UpdateMenuItem, UpdatePage, UpdatePartial, UpdateRow, Version,
};
use cms_store::MemoryStore;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_APP: &str = "site";

/// Fixed timestamp `secs` seconds after the epoch
pub fn ts(secs: i64) -> Timestamp {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn setup_test_cms() -> Cms<MemoryStore> {
    Cms::in_memory(CmsConfig::new())
}

pub fn setup_cms_with_cache(cache: Arc<dyn CacheClient>) -> Cms<MemoryStore> {
    Cms::new(MemoryStore::new(), cache, CmsConfig::new())
}

/// Register [`TEST_APP`]
pub async fn seed_app(cms: &Cms<MemoryStore>) -> App {
    cms.create_app(TEST_APP).await.unwrap()
}

/// Create an enabled version in [`TEST_APP`], registering the app if needed
pub async fn seed_version(cms: &Cms<MemoryStore>, name: &str) -> Version {
    seed_app(cms).await;
    cms.create_version(&CreateVersion {
        app_name: TEST_APP.to_string(),
        name: name.to_string(),
        enabled_at: Some(ts(1_000)),
    })
    .await
    .unwrap()
}

pub fn column_layout(cols: &str) -> ColumnLayout {
    ColumnLayout {
        cols: cols.to_string(),
        ..ColumnLayout::default()
    }
}

/// Client snapshot of a stored menu, exactly as last read
pub fn menu_snapshot(tree: &MenuTree) -> UpdateMenu {
    UpdateMenu {
        name: tree.menu.name.clone(),
        updated_at: tree.menu.updated_at,
        items: tree.nest().iter().map(node_snapshot).collect(),
    }
}

fn node_snapshot(node: &MenuNode) -> UpdateMenuItem {
    UpdateMenuItem {
        id: Some(node.item.id),
        position: Some(node.position),
        name: node.item.name.clone(),
        icon: node.item.icon.clone(),
        updated_at: Some(node.item.updated_at),
        enabled_at: node.item.enabled_at,
        indexing: node.item.indexing.clone(),
        items: node.items.iter().map(node_snapshot).collect(),
    }
}

/// Client snapshot of a stored page, exactly as last read
pub fn page_snapshot(page: &Page) -> UpdatePage {
    UpdatePage {
        name: page.name.clone(),
        plugin: page.plugin.clone(),
        meta_title: page.meta_title.clone(),
        meta_description: page.meta_description.clone(),
        hashtag: page.hashtag.clone(),
        new_tab_enabled: page.new_tab_enabled,
        url_enabled: page.url_enabled,
        url: page.url.clone(),
        enabled_at: page.enabled_at,
        updated_at: page.updated_at,
        indexing: page.indexing.clone(),
    }
}

/// Client snapshot of a stored partial, exactly as last read
pub fn partial_snapshot(partial: &PagePartial) -> UpdatePartial {
    UpdatePartial {
        name: partial.name.clone(),
        updated_at: partial.updated_at,
        rows: partial
            .rows
            .iter()
            .map(|row| UpdateRow {
                id: Some(row.id),
                position: Some(row.position),
                updated_at: Some(row.updated_at),
                layout: row.layout.clone(),
                columns: row
                    .columns
                    .iter()
                    .map(|column| UpdateColumn {
                        id: Some(column.id),
                        position: Some(column.position),
                        updated_at: Some(column.updated_at),
                        module_id: column.module_id,
                        layout: column.layout.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Find an item anywhere in a nested snapshot by name
pub fn find_item_mut<'a>(
    items: &'a mut [UpdateMenuItem],
    name: &str,
) -> Option<&'a mut UpdateMenuItem> {
    for item in items {
        if item.name == name {
            return Some(item);
        }
        if let Some(found) = find_item_mut(&mut item.items, name) {
            return Some(found);
        }
    }
    None
}

/// Cache operation seen by [`RecordingCache`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    Get(String),
    Set(String),
    Delete(String),
}

/// Working cache that logs every call
#[derive(Debug, Default)]
pub struct RecordingCache {
    entries: DashMap<String, Vec<u8>>,
    ops: Mutex<Vec<CacheOp>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<CacheOp> {
        self.ops.lock().clone()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                CacheOp::Delete(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear_ops(&self) {
        self.ops.lock().clear();
    }
}

#[async_trait]
impl CacheClient for RecordingCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.ops.lock().push(CacheOp::Get(key.to_string()));
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        self.ops.lock().push(CacheOp::Set(key.to_string()));
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.ops.lock().push(CacheOp::Delete(key.to_string()));
        self.entries.remove(key);
        Ok(())
    }
}

/// Cache whose backend is always down
#[derive(Debug, Default)]
pub struct FailingCache {
    calls: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> CacheResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

#[async_trait]
impl CacheClient for FailingCache {
    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        self.fail()
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        self.fail()
    }
}
