//! Tree store adapter contract
//!
//! The reconciliation engine talks to persistence only through these two
//! traits. A [`TreeStore`] hands out transactions; everything, reads
//! included, happens on a [`StoreTx`]. Dropping a transaction without
//! calling [`StoreTx::commit`] rolls it back.
//!
//! Getters return live records only. Soft-deleted records are reachable
//! through [`StoreTx::is_deleted`] and [`StoreTx::restore`].

use crate::draft::{ColumnDraft, MenuItemDraft, ModuleDraft, RowDraft, VersionDraft};
use crate::error::StoreResult;
use cms_model::{
    App, ColumnId, IndexingDirective, IndexingOption, Menu, MenuId, MenuItem, MenuItemId,
    MenuRelation, Module, ModuleId, Page, PageKey, PagePartial, PartialColumn, PartialId,
    PartialRow, RowId, Version, VersionId,
};
use std::fmt;

/// Reference to any soft-deletable record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// Version
    Version(VersionId),
    /// Module
    Module(ModuleId),
    /// Menu
    Menu(MenuId),
    /// Menu item
    MenuItem(MenuItemId),
    /// Page
    Page(PageKey),
    /// Page partial
    Partial(PartialId),
    /// Partial row
    Row(RowId),
    /// Partial column
    Column(ColumnId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(id) => write!(f, "version {id}"),
            Self::Module(id) => write!(f, "module {id}"),
            Self::Menu(id) => write!(f, "menu {id}"),
            Self::MenuItem(id) => write!(f, "menu item {id}"),
            Self::Page(key) => write!(f, "page {}/{}", key.menu_item_id, key.locale),
            Self::Partial(id) => write!(f, "partial {id}"),
            Self::Row(id) => write!(f, "row {id}"),
            Self::Column(id) => write!(f, "column {id}"),
        }
    }
}

/// Transactional tree store
#[async_trait::async_trait]
pub trait TreeStore: Send + Sync + 'static {
    /// Transaction type
    type Tx: StoreTx;

    /// Begin a transaction
    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// One open transaction
///
/// Writes stamp `updated_at` with the store clock; caller-supplied
/// timestamps on saved records are ignored.
#[async_trait::async_trait]
pub trait StoreTx: Send {
    // --- soft delete ---

    /// Soft-delete a record
    ///
    /// Menu items cascade: their relations, indexing and pages go with them
    /// and children reachable only through the item are soft-deleted too.
    /// Rows cascade to their columns.
    async fn soft_delete(&mut self, entity: EntityRef) -> StoreResult<()>;

    /// Clear the soft-delete marker; `false` if the record was not deleted
    async fn restore(&mut self, entity: EntityRef) -> StoreResult<bool>;

    /// Whether the record exists and is soft-deleted
    async fn is_deleted(&mut self, entity: EntityRef) -> StoreResult<bool>;

    // --- apps ---

    /// App by name
    async fn app(&mut self, name: &str) -> StoreResult<Option<App>>;

    /// Every app, ordered by name
    async fn apps(&mut self) -> StoreResult<Vec<App>>;

    /// Return the app named `name`, inserting if absent
    async fn first_or_create_app(&mut self, name: &str) -> StoreResult<App>;

    // --- versions ---

    /// Live version by id
    async fn version(&mut self, id: VersionId) -> StoreResult<Option<Version>>;

    /// Live versions of an app, ordered by id
    async fn versions_of_app(&mut self, app_name: &str) -> StoreResult<Vec<Version>>;

    /// Return the live version with exactly these attributes, inserting if absent
    async fn first_or_create_version(&mut self, draft: VersionDraft) -> StoreResult<Version>;

    /// Persist name, enabled-at and publication fields
    async fn save_version(&mut self, version: &Version) -> StoreResult<Version>;

    // --- modules ---

    /// Live module by id
    async fn module(&mut self, id: ModuleId) -> StoreResult<Option<Module>>;

    /// Live modules of an app, ordered by id
    async fn modules_of_app(&mut self, app_name: &str) -> StoreResult<Vec<Module>>;

    /// Return the live module with exactly these attributes, inserting if absent
    async fn first_or_create_module(&mut self, draft: ModuleDraft) -> StoreResult<Module>;

    /// Persist type, name and settings
    async fn save_module(&mut self, module: &Module) -> StoreResult<Module>;

    // --- menus ---

    /// Live menu by id
    async fn menu(&mut self, id: MenuId) -> StoreResult<Option<Menu>>;

    /// Live menus of a version, ordered by id
    async fn menus_of_version(&mut self, version_id: VersionId) -> StoreResult<Vec<Menu>>;

    /// Return the live menu named `name` in the version, inserting if absent
    async fn first_or_create_menu(&mut self, version_id: VersionId, name: &str)
        -> StoreResult<Menu>;

    /// Persist the menu name and bump `updated_at`
    async fn save_menu(&mut self, menu: &Menu) -> StoreResult<Menu>;

    // --- menu items ---

    /// Live menu item by id, indexing populated
    async fn menu_item(&mut self, id: MenuItemId) -> StoreResult<Option<MenuItem>>;

    /// First live item carrying exactly these attributes
    async fn find_menu_item(&mut self, draft: &MenuItemDraft) -> StoreResult<Option<MenuItem>>;

    /// Insert a new item
    async fn insert_menu_item(&mut self, draft: MenuItemDraft) -> StoreResult<MenuItem>;

    /// Persist name, icon and enabled-at; bumps `updated_at`
    async fn save_menu_item(&mut self, item: &MenuItem) -> StoreResult<MenuItem>;

    // --- indexing ---

    /// Directives of an item, ordered by option
    async fn indexing_of(&mut self, item: MenuItemId) -> StoreResult<Vec<IndexingDirective>>;

    /// Insert or overwrite one directive
    async fn upsert_indexing(
        &mut self,
        item: MenuItemId,
        directive: &IndexingDirective,
    ) -> StoreResult<()>;

    /// Remove one directive
    async fn delete_indexing(&mut self, item: MenuItemId, option: IndexingOption)
        -> StoreResult<()>;

    // --- relations ---

    /// Every edge of a menu, unordered
    async fn relations_of_menu(&mut self, menu_id: MenuId) -> StoreResult<Vec<MenuRelation>>;

    /// Edges directly under `parent` (`None` for top level)
    async fn relations_under(
        &mut self,
        menu_id: MenuId,
        parent: Option<MenuItemId>,
    ) -> StoreResult<Vec<MenuRelation>>;

    /// The edge placing `child` in the menu, if any
    async fn relation_of(
        &mut self,
        menu_id: MenuId,
        child: MenuItemId,
    ) -> StoreResult<Option<MenuRelation>>;

    /// Return the identical edge, inserting if absent
    ///
    /// A child sits under one parent per menu; placing it elsewhere without
    /// deleting the old edge first is a constraint violation.
    async fn first_or_create_relation(&mut self, relation: MenuRelation)
        -> StoreResult<MenuRelation>;

    /// Remove an edge
    async fn delete_relation(&mut self, relation: &MenuRelation) -> StoreResult<()>;

    // --- pages ---

    /// Live page by key, indexing populated
    async fn page(&mut self, key: &PageKey) -> StoreResult<Option<Page>>;

    /// Live pages of a menu item, ordered by locale
    async fn pages_of_item(&mut self, item: MenuItemId) -> StoreResult<Vec<Page>>;

    /// Return the live page, inserting a disabled one named `name` if absent
    async fn get_or_create_page(&mut self, key: &PageKey, name: &str) -> StoreResult<Page>;

    /// Persist name, metadata and enabled-at; indexing is left alone
    async fn save_page(&mut self, page: &Page) -> StoreResult<Page>;

    /// Insert or overwrite one page directive
    async fn upsert_page_indexing(
        &mut self,
        key: &PageKey,
        directive: &IndexingDirective,
    ) -> StoreResult<()>;

    /// Remove one page directive
    async fn delete_page_indexing(&mut self, key: &PageKey, option: IndexingOption)
        -> StoreResult<()>;

    // --- partials ---

    /// Live partial by id, rows not populated
    async fn partial(&mut self, id: PartialId) -> StoreResult<Option<PagePartial>>;

    /// Live partials of a page, rows not populated, ordered by id
    async fn partials_of_page(&mut self, key: &PageKey) -> StoreResult<Vec<PagePartial>>;

    /// Return the live partial named `name` on the page, inserting if absent
    async fn first_or_create_partial(&mut self, key: &PageKey, name: &str)
        -> StoreResult<PagePartial>;

    /// Persist the partial name and bump `updated_at`
    async fn save_partial(&mut self, partial: &PagePartial) -> StoreResult<PagePartial>;

    // --- rows ---

    /// Live row by id, columns not populated
    async fn row(&mut self, id: RowId) -> StoreResult<Option<PartialRow>>;

    /// Live rows of a partial, columns not populated
    async fn rows_of(&mut self, partial: PartialId) -> StoreResult<Vec<PartialRow>>;

    /// Return the live row with exactly these attributes, inserting if absent
    async fn first_or_create_row(&mut self, draft: RowDraft) -> StoreResult<PartialRow>;

    /// Insert a new row
    async fn insert_row(&mut self, draft: RowDraft) -> StoreResult<PartialRow>;

    /// Persist position and layout
    async fn save_row(&mut self, row: &PartialRow) -> StoreResult<PartialRow>;

    // --- columns ---

    /// Live column by id
    async fn column(&mut self, id: ColumnId) -> StoreResult<Option<PartialColumn>>;

    /// Live columns of a row
    async fn columns_of(&mut self, row: RowId) -> StoreResult<Vec<PartialColumn>>;

    /// Return the live column with exactly these attributes, inserting if absent
    async fn first_or_create_column(&mut self, draft: ColumnDraft) -> StoreResult<PartialColumn>;

    /// Insert a new column
    async fn insert_column(&mut self, draft: ColumnDraft) -> StoreResult<PartialColumn>;

    /// Persist row, position, module and layout
    async fn save_column(&mut self, column: &PartialColumn) -> StoreResult<PartialColumn>;

    // --- lifecycle ---

    /// Make every write of this transaction visible atomically
    async fn commit(self) -> StoreResult<()>;
}
