//! In-memory transactional store
//!
//! Transactions are serialized on a single `tokio::sync::Mutex`. A
//! transaction owns the lock guard plus a working copy of the tables;
//! commit swaps the copy in, drop discards it. Readers therefore never
//! observe a half-applied reconciliation.

mod tables;

use crate::adapter::{EntityRef, StoreTx, TreeStore};
use crate::draft::{ColumnDraft, MenuItemDraft, ModuleDraft, RowDraft, VersionDraft};
use crate::error::{StoreError, StoreResult};
use cms_model::{
    App, ColumnId, IndexingDirective, IndexingOption, Menu, MenuId, MenuItem, MenuItemId,
    MenuRelation, Module, ModuleId, Page, PageKey, PagePartial, PartialColumn, PartialId,
    PartialRow, RowId, Version, VersionId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tables::Tables;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Record counts, for assertions and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Live menu items
    pub live_items: usize,
    /// Soft-deleted menu items
    pub deleted_items: usize,
    /// Menu relations
    pub relations: usize,
    /// Live partial rows
    pub live_rows: usize,
    /// Live partial columns
    pub live_columns: usize,
}

/// In-memory [`TreeStore`]
///
/// Cloning yields another handle onto the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    write_budget: Option<Arc<AtomicUsize>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write after the first `writes` with [`StoreError::Unavailable`]
    #[must_use]
    pub fn with_write_budget(mut self, writes: usize) -> Self {
        self.write_budget = Some(Arc::new(AtomicUsize::new(writes)));
        self
    }

    /// Count committed records
    pub async fn stats(&self) -> StoreStats {
        let tables = self.tables.lock().await;
        StoreStats {
            live_items: tables
                .items
                .values()
                .filter(|i| i.deleted_at.is_none())
                .count(),
            deleted_items: tables
                .items
                .values()
                .filter(|i| i.deleted_at.is_some())
                .count(),
            relations: tables.relations.len(),
            live_rows: tables.rows.values().filter(|r| r.deleted_at.is_none()).count(),
            live_columns: tables
                .columns
                .values()
                .filter(|c| c.deleted_at.is_none())
                .count(),
        }
    }
}

#[async_trait::async_trait]
impl TreeStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        tracing::trace!("memory transaction started");
        Ok(MemoryTx {
            guard,
            work,
            write_budget: self.write_budget.clone(),
        })
    }
}

/// Open transaction on a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    write_budget: Option<Arc<AtomicUsize>>,
}

impl MemoryTx {
    fn charge(&self) -> StoreResult<()> {
        let Some(budget) = &self.write_budget else {
            return Ok(());
        };
        budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::Unavailable("write budget exhausted".to_string()))
    }
}

#[async_trait::async_trait]
impl StoreTx for MemoryTx {
    async fn soft_delete(&mut self, entity: EntityRef) -> StoreResult<()> {
        self.charge()?;
        self.work.soft_delete(&entity)
    }

    async fn restore(&mut self, entity: EntityRef) -> StoreResult<bool> {
        self.charge()?;
        self.work.restore(&entity)
    }

    async fn is_deleted(&mut self, entity: EntityRef) -> StoreResult<bool> {
        Ok(self.work.is_deleted(&entity))
    }

    async fn app(&mut self, name: &str) -> StoreResult<Option<App>> {
        Ok(self.work.apps.get(name).cloned())
    }

    async fn apps(&mut self) -> StoreResult<Vec<App>> {
        Ok(self.work.apps.values().cloned().collect())
    }

    async fn first_or_create_app(&mut self, name: &str) -> StoreResult<App> {
        self.charge()?;
        Ok(self.work.first_or_create_app(name))
    }

    async fn version(&mut self, id: VersionId) -> StoreResult<Option<Version>> {
        Ok(self.work.live_version(id).cloned())
    }

    async fn versions_of_app(&mut self, app_name: &str) -> StoreResult<Vec<Version>> {
        Ok(self.work.versions_of_app(app_name))
    }

    async fn first_or_create_version(&mut self, draft: VersionDraft) -> StoreResult<Version> {
        self.charge()?;
        self.work.first_or_create_version(draft)
    }

    async fn save_version(&mut self, version: &Version) -> StoreResult<Version> {
        self.charge()?;
        self.work.save_version(version)
    }

    async fn module(&mut self, id: ModuleId) -> StoreResult<Option<Module>> {
        Ok(self.work.live_module(id).cloned())
    }

    async fn modules_of_app(&mut self, app_name: &str) -> StoreResult<Vec<Module>> {
        Ok(self.work.modules_of_app(app_name))
    }

    async fn first_or_create_module(&mut self, draft: ModuleDraft) -> StoreResult<Module> {
        self.charge()?;
        self.work.first_or_create_module(draft)
    }

    async fn save_module(&mut self, module: &Module) -> StoreResult<Module> {
        self.charge()?;
        self.work.save_module(module)
    }

    async fn menu(&mut self, id: MenuId) -> StoreResult<Option<Menu>> {
        Ok(self.work.live_menu(id).cloned())
    }

    async fn menus_of_version(&mut self, version_id: VersionId) -> StoreResult<Vec<Menu>> {
        Ok(self.work.menus_of_version(version_id))
    }

    async fn first_or_create_menu(
        &mut self,
        version_id: VersionId,
        name: &str,
    ) -> StoreResult<Menu> {
        self.charge()?;
        self.work.first_or_create_menu(version_id, name)
    }

    async fn save_menu(&mut self, menu: &Menu) -> StoreResult<Menu> {
        self.charge()?;
        self.work.save_menu(menu)
    }

    async fn menu_item(&mut self, id: MenuItemId) -> StoreResult<Option<MenuItem>> {
        Ok(self.work.live_item(id))
    }

    async fn find_menu_item(&mut self, draft: &MenuItemDraft) -> StoreResult<Option<MenuItem>> {
        Ok(self.work.find_item(draft))
    }

    async fn insert_menu_item(&mut self, draft: MenuItemDraft) -> StoreResult<MenuItem> {
        self.charge()?;
        self.work.insert_item(draft)
    }

    async fn save_menu_item(&mut self, item: &MenuItem) -> StoreResult<MenuItem> {
        self.charge()?;
        self.work.save_item(item)
    }

    async fn indexing_of(&mut self, item: MenuItemId) -> StoreResult<Vec<IndexingDirective>> {
        Ok(self.work.indexing_of(item))
    }

    async fn upsert_indexing(
        &mut self,
        item: MenuItemId,
        directive: &IndexingDirective,
    ) -> StoreResult<()> {
        self.charge()?;
        self.work.upsert_indexing(item, directive)
    }

    async fn delete_indexing(
        &mut self,
        item: MenuItemId,
        option: IndexingOption,
    ) -> StoreResult<()> {
        self.charge()?;
        self.work.delete_indexing(item, option);
        Ok(())
    }

    async fn relations_of_menu(&mut self, menu_id: MenuId) -> StoreResult<Vec<MenuRelation>> {
        Ok(self.work.relations_of_menu(menu_id))
    }

    async fn relations_under(
        &mut self,
        menu_id: MenuId,
        parent: Option<MenuItemId>,
    ) -> StoreResult<Vec<MenuRelation>> {
        let mut relations = self.work.relations_of_menu(menu_id);
        relations.retain(|r| r.parent_id == parent);
        Ok(relations)
    }

    async fn relation_of(
        &mut self,
        menu_id: MenuId,
        child: MenuItemId,
    ) -> StoreResult<Option<MenuRelation>> {
        Ok(self.work.relations.get(&(menu_id, child)).copied())
    }

    async fn first_or_create_relation(
        &mut self,
        relation: MenuRelation,
    ) -> StoreResult<MenuRelation> {
        self.charge()?;
        self.work.first_or_create_relation(relation)
    }

    async fn delete_relation(&mut self, relation: &MenuRelation) -> StoreResult<()> {
        self.charge()?;
        self.work.delete_relation(relation);
        Ok(())
    }

    async fn page(&mut self, key: &PageKey) -> StoreResult<Option<Page>> {
        Ok(self.work.live_page(key))
    }

    async fn pages_of_item(&mut self, item: MenuItemId) -> StoreResult<Vec<Page>> {
        Ok(self.work.pages_of_item(item))
    }

    async fn get_or_create_page(&mut self, key: &PageKey, name: &str) -> StoreResult<Page> {
        self.charge()?;
        self.work.get_or_create_page(key, name)
    }

    async fn save_page(&mut self, page: &Page) -> StoreResult<Page> {
        self.charge()?;
        self.work.save_page(page)
    }

    async fn upsert_page_indexing(
        &mut self,
        key: &PageKey,
        directive: &IndexingDirective,
    ) -> StoreResult<()> {
        self.charge()?;
        self.work.upsert_page_indexing(key, directive)
    }

    async fn delete_page_indexing(
        &mut self,
        key: &PageKey,
        option: IndexingOption,
    ) -> StoreResult<()> {
        self.charge()?;
        self.work.delete_page_indexing(key, option);
        Ok(())
    }

    async fn partial(&mut self, id: PartialId) -> StoreResult<Option<PagePartial>> {
        Ok(self.work.live_partial(id).cloned())
    }

    async fn partials_of_page(&mut self, key: &PageKey) -> StoreResult<Vec<PagePartial>> {
        Ok(self.work.partials_of_page(key))
    }

    async fn first_or_create_partial(
        &mut self,
        key: &PageKey,
        name: &str,
    ) -> StoreResult<PagePartial> {
        self.charge()?;
        self.work.first_or_create_partial(key, name)
    }

    async fn save_partial(&mut self, partial: &PagePartial) -> StoreResult<PagePartial> {
        self.charge()?;
        self.work.save_partial(partial)
    }

    async fn row(&mut self, id: RowId) -> StoreResult<Option<PartialRow>> {
        Ok(self.work.live_row(id).cloned())
    }

    async fn rows_of(&mut self, partial: PartialId) -> StoreResult<Vec<PartialRow>> {
        Ok(self.work.rows_of(partial))
    }

    async fn first_or_create_row(&mut self, draft: RowDraft) -> StoreResult<PartialRow> {
        self.charge()?;
        self.work.first_or_create_row(draft)
    }

    async fn insert_row(&mut self, draft: RowDraft) -> StoreResult<PartialRow> {
        self.charge()?;
        self.work.insert_row(draft)
    }

    async fn save_row(&mut self, row: &PartialRow) -> StoreResult<PartialRow> {
        self.charge()?;
        self.work.save_row(row)
    }

    async fn column(&mut self, id: ColumnId) -> StoreResult<Option<PartialColumn>> {
        Ok(self.work.live_column(id).cloned())
    }

    async fn columns_of(&mut self, row: RowId) -> StoreResult<Vec<PartialColumn>> {
        Ok(self.work.columns_of(row))
    }

    async fn first_or_create_column(&mut self, draft: ColumnDraft) -> StoreResult<PartialColumn> {
        self.charge()?;
        self.work.first_or_create_column(draft)
    }

    async fn insert_column(&mut self, draft: ColumnDraft) -> StoreResult<PartialColumn> {
        self.charge()?;
        self.work.insert_column(draft)
    }

    async fn save_column(&mut self, column: &PartialColumn) -> StoreResult<PartialColumn> {
        self.charge()?;
        self.work.save_column(column)
    }

    async fn commit(mut self) -> StoreResult<()> {
        *self.guard = std::mem::take(&mut self.work);
        tracing::trace!("memory transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    async fn seeded() -> (MemoryStore, Version, Menu) {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let version = tx
            .first_or_create_version(VersionDraft {
                app_name: "site".to_string(),
                name: "v1".to_string(),
                enabled_at: None,
            })
            .await
            .unwrap();
        let menu = tx.first_or_create_menu(version.id, "Main").await.unwrap();
        tx.commit().await.unwrap();
        (store, version, menu)
    }

    fn draft(version: VersionId, name: &str) -> MenuItemDraft {
        MenuItemDraft {
            version_id: version,
            name: name.to_string(),
            icon: None,
            enabled_at: None,
        }
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let (store, version, _) = seeded().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_menu_item(draft(version.id, "Home")).await.unwrap();
        }

        assert_eq!(store.stats().await.live_items, 0);
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let (store, version, _) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let item = tx.insert_menu_item(draft(version.id, "Home")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let loaded = tx.menu_item(item.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Home");
    }

    #[tokio::test]
    async fn relation_enforces_single_placement() {
        let (store, version, menu) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let a = tx.insert_menu_item(draft(version.id, "A")).await.unwrap();
        let b = tx.insert_menu_item(draft(version.id, "B")).await.unwrap();

        let edge = MenuRelation::new(menu.id, None, b.id, 0);
        tx.first_or_create_relation(edge).await.unwrap();
        assert_eq!(tx.first_or_create_relation(edge).await.unwrap(), edge);

        let moved = MenuRelation::new(menu.id, Some(a.id), b.id, 0);
        let err = tx.first_or_create_relation(moved).await.unwrap_err();
        assert!(err.is_constraint());
    }

    #[tokio::test]
    async fn item_soft_delete_cascades_to_subtree() {
        let (store, version, menu) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let root = tx.insert_menu_item(draft(version.id, "Root")).await.unwrap();
        let child = tx.insert_menu_item(draft(version.id, "Child")).await.unwrap();
        let leaf = tx.insert_menu_item(draft(version.id, "Leaf")).await.unwrap();
        for relation in [
            MenuRelation::new(menu.id, None, root.id, 0),
            MenuRelation::new(menu.id, Some(root.id), child.id, 0),
            MenuRelation::new(menu.id, Some(child.id), leaf.id, 0),
        ] {
            tx.first_or_create_relation(relation).await.unwrap();
        }
        tx.upsert_indexing(root.id, &IndexingDirective::new(IndexingOption::NoIndex))
            .await
            .unwrap();

        tx.soft_delete(EntityRef::MenuItem(root.id)).await.unwrap();
        tx.commit().await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.live_items, 0);
        assert_eq!(stats.deleted_items, 3);
        assert_eq!(stats.relations, 0);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.indexing_of(root.id).await.unwrap().is_empty());
        assert!(tx.is_deleted(EntityRef::MenuItem(leaf.id)).await.unwrap());
    }

    #[tokio::test]
    async fn menu_restore_checks_name_collision() {
        let (store, version, menu) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.soft_delete(EntityRef::Menu(menu.id)).await.unwrap();
        tx.first_or_create_menu(version.id, "Main").await.unwrap();

        let err = tx.restore(EntityRef::Menu(menu.id)).await.unwrap_err();
        assert!(err.is_constraint());
        assert!(!tx.restore(EntityRef::Menu(MenuId(99))).await.unwrap());
    }

    #[tokio::test]
    async fn row_soft_delete_cascades_to_columns() {
        let (store, version, _) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let item = tx.insert_menu_item(draft(version.id, "Home")).await.unwrap();
        let key = PageKey::new(item.id, "en");
        tx.get_or_create_page(&key, "Home").await.unwrap();
        let partial = tx.first_or_create_partial(&key, "hero").await.unwrap();
        let row = tx
            .insert_row(RowDraft {
                partial_id: partial.id,
                position: 0,
                layout: cms_model::RowLayout::default(),
            })
            .await
            .unwrap();
        for position in 0..2 {
            tx.insert_column(ColumnDraft {
                row_id: row.id,
                position,
                module_id: None,
                layout: cms_model::ColumnLayout::default(),
            })
            .await
            .unwrap();
        }

        tx.soft_delete(EntityRef::Row(row.id)).await.unwrap();
        tx.commit().await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.live_rows, 0);
        assert_eq!(stats.live_columns, 0);
    }

    #[tokio::test]
    async fn apps_are_get_or_create() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let first = tx.first_or_create_app("site").await.unwrap();
        let again = tx.first_or_create_app("site").await.unwrap();
        tx.first_or_create_app("blog").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, again);
        let mut tx = store.begin().await.unwrap();
        let names: Vec<_> = tx.apps().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["blog", "site"]);
        assert!(tx.app("shop").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn page_indexing_is_scoped_to_its_locale() {
        let (store, version, _) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let item = tx.insert_menu_item(draft(version.id, "Home")).await.unwrap();
        let en = PageKey::new(item.id, "en");
        let de = PageKey::new(item.id, "de");
        tx.get_or_create_page(&en, "Home").await.unwrap();
        tx.get_or_create_page(&de, "Start").await.unwrap();

        tx.upsert_page_indexing(&en, &IndexingDirective::new(IndexingOption::NoIndex))
            .await
            .unwrap();
        let snippet = IndexingDirective::with_value(IndexingOption::MaxSnippet, "50");
        tx.upsert_page_indexing(&en, &snippet).await.unwrap();
        tx.delete_page_indexing(&en, IndexingOption::NoIndex).await.unwrap();

        let page = tx.page(&en).await.unwrap().unwrap();
        assert_eq!(page.indexing, vec![snippet]);
        assert!(tx.page(&de).await.unwrap().unwrap().indexing.is_empty());

        let missing = PageKey::new(item.id, "fr");
        let err = tx
            .upsert_page_indexing(&missing, &IndexingDirective::new(IndexingOption::Index))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
    }

    #[tokio::test]
    async fn write_budget_fails_further_writes() {
        let (store, version, _) = seeded().await;
        let store = store.with_write_budget(1);
        let mut tx = store.begin().await.unwrap();

        tx.insert_menu_item(draft(version.id, "A")).await.unwrap();
        let err = tx.insert_menu_item(draft(version.id, "B")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn save_stamps_updated_at() {
        let (store, version, _) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let before = Utc::now();
        let mut item = tx.insert_menu_item(draft(version.id, "Home")).await.unwrap();
        item.name = "Start".to_string();
        item.updated_at = chrono::DateTime::<Utc>::MIN_UTC;

        let saved = tx.save_menu_item(&item).await.unwrap();
        assert_eq!(saved.name, "Start");
        assert!(saved.updated_at >= before);
    }
}
