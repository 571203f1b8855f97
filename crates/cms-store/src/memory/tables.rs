//! Table state behind the in-memory store
//!
//! Plain synchronous data structure; the transaction wrapper in the parent
//! module clones it on `begin` and swaps it back on `commit`.

use crate::adapter::EntityRef;
use crate::draft::{ColumnDraft, MenuItemDraft, ModuleDraft, RowDraft, VersionDraft};
use crate::error::{StoreError, StoreResult};
use chrono::Utc;
use cms_model::{
    App, ColumnId, IndexingDirective, IndexingOption, Menu, MenuId, MenuItem, MenuItemId,
    MenuRelation, Module, ModuleId, Page, PageKey, PagePartial, PartialColumn, PartialId,
    PartialRow, RowId, Timestamp, Version, VersionId,
};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Row or column plus its soft-delete marker
#[derive(Debug, Clone)]
pub(crate) struct Tombstoned<T> {
    pub(crate) value: T,
    pub(crate) deleted_at: Option<Timestamp>,
}

impl<T> Tombstoned<T> {
    fn live(value: T) -> Self {
        Self {
            value,
            deleted_at: None,
        }
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    version: u64,
    module: u64,
    menu: u64,
    item: u64,
    partial: u64,
    row: u64,
    column: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Every table of the store
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    seq: Sequences,
    pub(crate) apps: BTreeMap<String, App>,
    pub(crate) versions: BTreeMap<VersionId, Version>,
    pub(crate) modules: BTreeMap<ModuleId, Module>,
    pub(crate) menus: BTreeMap<MenuId, Menu>,
    pub(crate) items: BTreeMap<MenuItemId, MenuItem>,
    pub(crate) indexing: BTreeMap<(MenuItemId, IndexingOption), Option<String>>,
    /// Keyed by (menu, child): one placement per item per menu
    pub(crate) relations: BTreeMap<(MenuId, MenuItemId), MenuRelation>,
    pub(crate) pages: BTreeMap<(MenuItemId, String), Page>,
    pub(crate) page_indexing: BTreeMap<(MenuItemId, String, IndexingOption), Option<String>>,
    pub(crate) partials: BTreeMap<PartialId, PagePartial>,
    pub(crate) rows: BTreeMap<RowId, Tombstoned<PartialRow>>,
    pub(crate) columns: BTreeMap<ColumnId, Tombstoned<PartialColumn>>,
}

fn page_index(key: &PageKey) -> (MenuItemId, String) {
    (key.menu_item_id, key.locale.clone())
}

impl Tables {
    // --- soft delete ---

    pub(crate) fn soft_delete(&mut self, entity: &EntityRef) -> StoreResult<()> {
        let now = Utc::now();
        match entity {
            EntityRef::Version(id) => {
                let version = self.versions.get_mut(id).filter(|v| v.deleted_at.is_none());
                version.ok_or_else(|| StoreError::missing(entity.to_string()))?.deleted_at =
                    Some(now);
            }
            EntityRef::Module(id) => {
                let module = self.modules.get_mut(id).filter(|m| m.deleted_at.is_none());
                module.ok_or_else(|| StoreError::missing(entity.to_string()))?.deleted_at =
                    Some(now);
            }
            EntityRef::Menu(id) => {
                let menu = self.menus.get_mut(id).filter(|m| m.deleted_at.is_none());
                menu.ok_or_else(|| StoreError::missing(entity.to_string()))?.deleted_at = Some(now);
            }
            EntityRef::MenuItem(id) => {
                if self.live_item(*id).is_none() {
                    return Err(StoreError::missing(entity.to_string()));
                }
                self.cascade_item(*id, now);
            }
            EntityRef::Page(key) => {
                let page = self
                    .pages
                    .get_mut(&page_index(key))
                    .filter(|p| p.deleted_at.is_none());
                page.ok_or_else(|| StoreError::missing(entity.to_string()))?.deleted_at = Some(now);
            }
            EntityRef::Partial(id) => {
                let partial = self.partials.get_mut(id).filter(|p| p.deleted_at.is_none());
                partial.ok_or_else(|| StoreError::missing(entity.to_string()))?.deleted_at =
                    Some(now);
            }
            EntityRef::Row(id) => {
                let row = self.rows.get_mut(id).filter(|r| r.is_live());
                row.ok_or_else(|| StoreError::missing(entity.to_string()))?.deleted_at = Some(now);
                for column in self.columns.values_mut() {
                    if column.value.row_id == *id && column.is_live() {
                        column.deleted_at = Some(now);
                    }
                }
            }
            EntityRef::Column(id) => {
                let column = self.columns.get_mut(id).filter(|c| c.is_live());
                column.ok_or_else(|| StoreError::missing(entity.to_string()))?.deleted_at =
                    Some(now);
            }
        }
        Ok(())
    }

    /// Soft-delete an item and everything only it keeps alive
    fn cascade_item(&mut self, root: MenuItemId, now: Timestamp) {
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            match self.items.get_mut(&id) {
                Some(item) if item.deleted_at.is_none() => item.deleted_at = Some(now),
                _ => continue,
            }

            self.indexing.retain(|(item, _), _| *item != id);
            self.relations.retain(|_, r| r.child_id != id);

            let orphaned: Vec<(MenuId, MenuItemId)> = self
                .relations
                .iter()
                .filter(|(_, r)| r.parent_id == Some(id))
                .map(|(key, _)| *key)
                .collect();
            for key in orphaned {
                self.relations.remove(&key);
                let child = key.1;
                if !self.relations.values().any(|r| r.child_id == child) {
                    stack.push(child);
                }
            }

            for page in self.pages.values_mut() {
                if page.key.menu_item_id == id && page.deleted_at.is_none() {
                    page.deleted_at = Some(now);
                    for partial in self.partials.values_mut() {
                        if partial.page == page.key && partial.deleted_at.is_none() {
                            partial.deleted_at = Some(now);
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn restore(&mut self, entity: &EntityRef) -> StoreResult<bool> {
        match entity {
            EntityRef::Version(id) => {
                let Some(version) = self.versions.get(id).filter(|v| v.deleted_at.is_some())
                else {
                    return Ok(false);
                };
                self.ensure_version_name_free(&version.app_name, &version.name, Some(*id))?;
                if let Some(version) = self.versions.get_mut(id) {
                    version.deleted_at = None;
                }
            }
            EntityRef::Module(id) => {
                let Some(module) = self.modules.get(id).filter(|m| m.deleted_at.is_some()) else {
                    return Ok(false);
                };
                self.ensure_module_name_free(&module.app_name, &module.name, Some(*id))?;
                if let Some(module) = self.modules.get_mut(id) {
                    module.deleted_at = None;
                }
            }
            EntityRef::Menu(id) => {
                let Some(menu) = self.menus.get(id).filter(|m| m.deleted_at.is_some()) else {
                    return Ok(false);
                };
                self.ensure_menu_name_free(menu.version_id, &menu.name, Some(*id))?;
                if let Some(menu) = self.menus.get_mut(id) {
                    menu.deleted_at = None;
                }
            }
            EntityRef::MenuItem(id) => {
                let Some(item) = self.items.get_mut(id).filter(|i| i.deleted_at.is_some()) else {
                    return Ok(false);
                };
                item.deleted_at = None;
            }
            EntityRef::Page(key) => {
                let Some(page) = self
                    .pages
                    .get_mut(&page_index(key))
                    .filter(|p| p.deleted_at.is_some())
                else {
                    return Ok(false);
                };
                page.deleted_at = None;
            }
            EntityRef::Partial(id) => {
                let Some(partial) = self.partials.get(id).filter(|p| p.deleted_at.is_some())
                else {
                    return Ok(false);
                };
                self.ensure_partial_name_free(&partial.page, &partial.name, Some(*id))?;
                if let Some(partial) = self.partials.get_mut(id) {
                    partial.deleted_at = None;
                }
            }
            EntityRef::Row(id) => {
                let Some(row) = self.rows.get_mut(id).filter(|r| !r.is_live()) else {
                    return Ok(false);
                };
                row.deleted_at = None;
            }
            EntityRef::Column(id) => {
                let Some(column) = self.columns.get_mut(id).filter(|c| !c.is_live()) else {
                    return Ok(false);
                };
                column.deleted_at = None;
            }
        }
        Ok(true)
    }

    pub(crate) fn is_deleted(&self, entity: &EntityRef) -> bool {
        match entity {
            EntityRef::Version(id) => self.versions.get(id).is_some_and(|v| v.deleted_at.is_some()),
            EntityRef::Module(id) => self.modules.get(id).is_some_and(|m| m.deleted_at.is_some()),
            EntityRef::Menu(id) => self.menus.get(id).is_some_and(|m| m.deleted_at.is_some()),
            EntityRef::MenuItem(id) => self.items.get(id).is_some_and(|i| i.deleted_at.is_some()),
            EntityRef::Page(key) => self
                .pages
                .get(&page_index(key))
                .is_some_and(|p| p.deleted_at.is_some()),
            EntityRef::Partial(id) => self.partials.get(id).is_some_and(|p| p.deleted_at.is_some()),
            EntityRef::Row(id) => self.rows.get(id).is_some_and(|r| !r.is_live()),
            EntityRef::Column(id) => self.columns.get(id).is_some_and(|c| !c.is_live()),
        }
    }

    // --- uniqueness ---

    fn ensure_version_name_free(
        &self,
        app_name: &str,
        name: &str,
        except: Option<VersionId>,
    ) -> StoreResult<()> {
        let taken = self.versions.values().any(|v| {
            v.deleted_at.is_none()
                && Some(v.id) != except
                && v.app_name == app_name
                && v.name == name
        });
        if taken {
            return Err(StoreError::constraint(format!(
                "version '{name}' already exists in app '{app_name}'"
            )));
        }
        Ok(())
    }

    fn ensure_module_name_free(
        &self,
        app_name: &str,
        name: &str,
        except: Option<ModuleId>,
    ) -> StoreResult<()> {
        let taken = self.modules.values().any(|m| {
            m.deleted_at.is_none()
                && Some(m.id) != except
                && m.app_name == app_name
                && m.name == name
        });
        if taken {
            return Err(StoreError::constraint(format!(
                "module '{name}' already exists in app '{app_name}'"
            )));
        }
        Ok(())
    }

    fn ensure_menu_name_free(
        &self,
        version_id: VersionId,
        name: &str,
        except: Option<MenuId>,
    ) -> StoreResult<()> {
        let taken = self.menus.values().any(|m| {
            m.deleted_at.is_none()
                && Some(m.id) != except
                && m.version_id == version_id
                && m.name == name
        });
        if taken {
            return Err(StoreError::constraint(format!(
                "menu '{name}' already exists in version {version_id}"
            )));
        }
        Ok(())
    }

    fn ensure_partial_name_free(
        &self,
        page: &PageKey,
        name: &str,
        except: Option<PartialId>,
    ) -> StoreResult<()> {
        let taken = self.partials.values().any(|p| {
            p.deleted_at.is_none() && Some(p.id) != except && p.page == *page && p.name == name
        });
        if taken {
            return Err(StoreError::constraint(format!(
                "partial '{name}' already exists on page {}/{}",
                page.menu_item_id, page.locale
            )));
        }
        Ok(())
    }

    // --- apps ---

    pub(crate) fn first_or_create_app(&mut self, name: &str) -> App {
        self.apps
            .entry(name.to_string())
            .or_insert_with(|| App {
                name: name.to_string(),
                created_at: Utc::now(),
            })
            .clone()
    }

    // --- versions ---

    pub(crate) fn live_version(&self, id: VersionId) -> Option<&Version> {
        self.versions.get(&id).filter(|v| v.deleted_at.is_none())
    }

    pub(crate) fn versions_of_app(&self, app_name: &str) -> Vec<Version> {
        self.versions
            .values()
            .filter(|v| v.deleted_at.is_none() && v.app_name == app_name)
            .cloned()
            .collect()
    }

    pub(crate) fn first_or_create_version(&mut self, draft: VersionDraft) -> StoreResult<Version> {
        let existing = self.versions.values().find(|v| {
            v.deleted_at.is_none()
                && v.app_name == draft.app_name
                && v.name == draft.name
                && v.enabled_at == draft.enabled_at
        });
        if let Some(version) = existing {
            return Ok(version.clone());
        }

        self.ensure_version_name_free(&draft.app_name, &draft.name, None)?;
        let version = Version {
            id: VersionId(next(&mut self.seq.version)),
            app_name: draft.app_name,
            name: draft.name,
            enabled_at: draft.enabled_at,
            published_at: None,
            publish_id: Uuid::new_v4(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        self.versions.insert(version.id, version.clone());
        Ok(version)
    }

    pub(crate) fn save_version(&mut self, version: &Version) -> StoreResult<Version> {
        let app_name = self
            .live_version(version.id)
            .map(|v| v.app_name.clone())
            .ok_or_else(|| StoreError::missing(EntityRef::Version(version.id).to_string()))?;
        self.ensure_version_name_free(&app_name, &version.name, Some(version.id))?;

        let stored = self
            .versions
            .get_mut(&version.id)
            .ok_or_else(|| StoreError::missing(EntityRef::Version(version.id).to_string()))?;
        stored.name.clone_from(&version.name);
        stored.enabled_at = version.enabled_at;
        stored.published_at = version.published_at;
        stored.publish_id = version.publish_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    // --- modules ---

    pub(crate) fn live_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id).filter(|m| m.deleted_at.is_none())
    }

    pub(crate) fn modules_of_app(&self, app_name: &str) -> Vec<Module> {
        self.modules
            .values()
            .filter(|m| m.deleted_at.is_none() && m.app_name == app_name)
            .cloned()
            .collect()
    }

    pub(crate) fn first_or_create_module(&mut self, draft: ModuleDraft) -> StoreResult<Module> {
        let existing = self.modules.values().find(|m| {
            m.deleted_at.is_none()
                && m.app_name == draft.app_name
                && m.module_type == draft.module_type
                && m.name == draft.name
                && m.settings == draft.settings
        });
        if let Some(module) = existing {
            return Ok(module.clone());
        }

        self.ensure_module_name_free(&draft.app_name, &draft.name, None)?;
        let module = Module {
            id: ModuleId(next(&mut self.seq.module)),
            app_name: draft.app_name,
            module_type: draft.module_type,
            name: draft.name,
            settings: draft.settings,
            updated_at: Utc::now(),
            deleted_at: None,
        };
        self.modules.insert(module.id, module.clone());
        Ok(module)
    }

    pub(crate) fn save_module(&mut self, module: &Module) -> StoreResult<Module> {
        let app_name = self
            .live_module(module.id)
            .map(|m| m.app_name.clone())
            .ok_or_else(|| StoreError::missing(EntityRef::Module(module.id).to_string()))?;
        self.ensure_module_name_free(&app_name, &module.name, Some(module.id))?;

        let stored = self
            .modules
            .get_mut(&module.id)
            .ok_or_else(|| StoreError::missing(EntityRef::Module(module.id).to_string()))?;
        stored.module_type.clone_from(&module.module_type);
        stored.name.clone_from(&module.name);
        stored.settings = module.settings.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    // --- menus ---

    pub(crate) fn live_menu(&self, id: MenuId) -> Option<&Menu> {
        self.menus.get(&id).filter(|m| m.deleted_at.is_none())
    }

    pub(crate) fn menus_of_version(&self, version_id: VersionId) -> Vec<Menu> {
        self.menus
            .values()
            .filter(|m| m.deleted_at.is_none() && m.version_id == version_id)
            .cloned()
            .collect()
    }

    pub(crate) fn first_or_create_menu(
        &mut self,
        version_id: VersionId,
        name: &str,
    ) -> StoreResult<Menu> {
        if self.live_version(version_id).is_none() {
            return Err(StoreError::missing(EntityRef::Version(version_id).to_string()));
        }
        let existing = self
            .menus
            .values()
            .find(|m| m.deleted_at.is_none() && m.version_id == version_id && m.name == name);
        if let Some(menu) = existing {
            return Ok(menu.clone());
        }

        let now = Utc::now();
        let menu = Menu {
            id: MenuId(next(&mut self.seq.menu)),
            version_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.menus.insert(menu.id, menu.clone());
        Ok(menu)
    }

    pub(crate) fn save_menu(&mut self, menu: &Menu) -> StoreResult<Menu> {
        let version_id = self
            .live_menu(menu.id)
            .map(|m| m.version_id)
            .ok_or_else(|| StoreError::missing(EntityRef::Menu(menu.id).to_string()))?;
        self.ensure_menu_name_free(version_id, &menu.name, Some(menu.id))?;

        let stored = self
            .menus
            .get_mut(&menu.id)
            .ok_or_else(|| StoreError::missing(EntityRef::Menu(menu.id).to_string()))?;
        stored.name.clone_from(&menu.name);
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    // --- menu items ---

    pub(crate) fn live_item(&self, id: MenuItemId) -> Option<MenuItem> {
        let mut item = self
            .items
            .get(&id)
            .filter(|i| i.deleted_at.is_none())?
            .clone();
        item.indexing = self.indexing_of(id);
        Some(item)
    }

    pub(crate) fn find_item(&self, draft: &MenuItemDraft) -> Option<MenuItem> {
        let id = self
            .items
            .values()
            .find(|i| i.deleted_at.is_none() && draft.matches(i))?
            .id;
        self.live_item(id)
    }

    pub(crate) fn insert_item(&mut self, draft: MenuItemDraft) -> StoreResult<MenuItem> {
        if self.live_version(draft.version_id).is_none() {
            return Err(StoreError::missing(
                EntityRef::Version(draft.version_id).to_string(),
            ));
        }
        let item = MenuItem {
            id: MenuItemId(next(&mut self.seq.item)),
            version_id: draft.version_id,
            name: draft.name,
            icon: draft.icon,
            enabled_at: draft.enabled_at,
            indexing: Vec::new(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    pub(crate) fn save_item(&mut self, item: &MenuItem) -> StoreResult<MenuItem> {
        let stored = self
            .items
            .get_mut(&item.id)
            .filter(|i| i.deleted_at.is_none())
            .ok_or_else(|| StoreError::missing(EntityRef::MenuItem(item.id).to_string()))?;
        stored.name.clone_from(&item.name);
        stored.icon.clone_from(&item.icon);
        stored.enabled_at = item.enabled_at;
        stored.updated_at = Utc::now();
        self.live_item(item.id)
            .ok_or_else(|| StoreError::missing(EntityRef::MenuItem(item.id).to_string()))
    }

    // --- indexing ---

    pub(crate) fn indexing_of(&self, item: MenuItemId) -> Vec<IndexingDirective> {
        self.indexing
            .range((item, IndexingOption::ALL[0])..)
            .take_while(|((owner, _), _)| *owner == item)
            .map(|((_, option), value)| IndexingDirective {
                option: *option,
                value: value.clone(),
            })
            .collect()
    }

    pub(crate) fn upsert_indexing(
        &mut self,
        item: MenuItemId,
        directive: &IndexingDirective,
    ) -> StoreResult<()> {
        if !self.items.get(&item).is_some_and(|i| i.deleted_at.is_none()) {
            return Err(StoreError::missing(EntityRef::MenuItem(item).to_string()));
        }
        self.indexing
            .insert((item, directive.option), directive.value.clone());
        Ok(())
    }

    pub(crate) fn delete_indexing(&mut self, item: MenuItemId, option: IndexingOption) {
        self.indexing.remove(&(item, option));
    }

    // --- relations ---

    pub(crate) fn relations_of_menu(&self, menu_id: MenuId) -> Vec<MenuRelation> {
        self.relations
            .values()
            .filter(|r| r.menu_id == menu_id)
            .copied()
            .collect()
    }

    pub(crate) fn first_or_create_relation(
        &mut self,
        relation: MenuRelation,
    ) -> StoreResult<MenuRelation> {
        if self.live_menu(relation.menu_id).is_none() {
            return Err(StoreError::missing(EntityRef::Menu(relation.menu_id).to_string()));
        }
        if relation.parent_id == Some(relation.child_id) {
            return Err(StoreError::constraint(format!(
                "menu item {} cannot be its own parent",
                relation.child_id
            )));
        }
        let endpoints = relation.parent_id.into_iter().chain([relation.child_id]);
        for id in endpoints {
            if !self.items.get(&id).is_some_and(|i| i.deleted_at.is_none()) {
                return Err(StoreError::missing(EntityRef::MenuItem(id).to_string()));
            }
        }

        let key = (relation.menu_id, relation.child_id);
        match self.relations.get(&key) {
            Some(existing) if *existing == relation => Ok(*existing),
            Some(existing) => Err(StoreError::constraint(format!(
                "menu item {} already placed in menu {} at position {}",
                existing.child_id, existing.menu_id, existing.position
            ))),
            None => {
                self.relations.insert(key, relation);
                Ok(relation)
            }
        }
    }

    pub(crate) fn delete_relation(&mut self, relation: &MenuRelation) {
        let key = (relation.menu_id, relation.child_id);
        if self.relations.get(&key) == Some(relation) {
            self.relations.remove(&key);
        }
    }

    // --- pages ---

    pub(crate) fn live_page(&self, key: &PageKey) -> Option<Page> {
        let mut page = self
            .pages
            .get(&page_index(key))
            .filter(|p| p.deleted_at.is_none())?
            .clone();
        page.indexing = self.page_indexing_of(key);
        Some(page)
    }

    fn page_indexing_of(&self, key: &PageKey) -> Vec<IndexingDirective> {
        self.page_indexing
            .range((key.menu_item_id, key.locale.clone(), IndexingOption::ALL[0])..)
            .take_while(|((item, locale, _), _)| {
                *item == key.menu_item_id && *locale == key.locale
            })
            .map(|((_, _, option), value)| IndexingDirective {
                option: *option,
                value: value.clone(),
            })
            .collect()
    }

    pub(crate) fn upsert_page_indexing(
        &mut self,
        key: &PageKey,
        directive: &IndexingDirective,
    ) -> StoreResult<()> {
        if self.live_page(key).is_none() {
            return Err(StoreError::missing(EntityRef::Page(key.clone()).to_string()));
        }
        self.page_indexing.insert(
            (key.menu_item_id, key.locale.clone(), directive.option),
            directive.value.clone(),
        );
        Ok(())
    }

    pub(crate) fn delete_page_indexing(&mut self, key: &PageKey, option: IndexingOption) {
        self.page_indexing
            .remove(&(key.menu_item_id, key.locale.clone(), option));
    }

    pub(crate) fn pages_of_item(&self, item: MenuItemId) -> Vec<Page> {
        self.pages
            .values()
            .filter(|p| p.key.menu_item_id == item)
            .filter_map(|p| self.live_page(&p.key))
            .collect()
    }

    pub(crate) fn get_or_create_page(&mut self, key: &PageKey, name: &str) -> StoreResult<Page> {
        if self
            .pages
            .get(&page_index(key))
            .is_some_and(|page| page.deleted_at.is_some())
        {
            return Err(StoreError::constraint(format!(
                "page {}/{} is deleted",
                key.menu_item_id, key.locale
            )));
        }
        if let Some(page) = self.live_page(key) {
            return Ok(page);
        }
        if !self
            .items
            .get(&key.menu_item_id)
            .is_some_and(|i| i.deleted_at.is_none())
        {
            return Err(StoreError::missing(
                EntityRef::MenuItem(key.menu_item_id).to_string(),
            ));
        }

        let page = Page::new(key.clone(), name, Utc::now());
        self.pages.insert(page_index(key), page.clone());
        Ok(page)
    }

    pub(crate) fn save_page(&mut self, page: &Page) -> StoreResult<Page> {
        let stored = self
            .pages
            .get_mut(&page_index(&page.key))
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| StoreError::missing(EntityRef::Page(page.key.clone()).to_string()))?;
        stored.name.clone_from(&page.name);
        stored.plugin.clone_from(&page.plugin);
        stored.meta_title.clone_from(&page.meta_title);
        stored.meta_description.clone_from(&page.meta_description);
        stored.hashtag.clone_from(&page.hashtag);
        stored.new_tab_enabled = page.new_tab_enabled;
        stored.url_enabled = page.url_enabled;
        stored.url.clone_from(&page.url);
        stored.enabled_at = page.enabled_at;
        stored.updated_at = Utc::now();
        self.live_page(&page.key)
            .ok_or_else(|| StoreError::missing(EntityRef::Page(page.key.clone()).to_string()))
    }

    // --- partials ---

    pub(crate) fn live_partial(&self, id: PartialId) -> Option<&PagePartial> {
        self.partials.get(&id).filter(|p| p.deleted_at.is_none())
    }

    pub(crate) fn partials_of_page(&self, key: &PageKey) -> Vec<PagePartial> {
        self.partials
            .values()
            .filter(|p| p.deleted_at.is_none() && p.page == *key)
            .cloned()
            .collect()
    }

    pub(crate) fn first_or_create_partial(
        &mut self,
        key: &PageKey,
        name: &str,
    ) -> StoreResult<PagePartial> {
        if self.live_page(key).is_none() {
            return Err(StoreError::missing(EntityRef::Page(key.clone()).to_string()));
        }
        let existing = self
            .partials
            .values()
            .find(|p| p.deleted_at.is_none() && p.page == *key && p.name == name);
        if let Some(partial) = existing {
            return Ok(partial.clone());
        }

        let partial = PagePartial {
            id: PartialId(next(&mut self.seq.partial)),
            page: key.clone(),
            name: name.to_string(),
            updated_at: Utc::now(),
            deleted_at: None,
            rows: Vec::new(),
        };
        self.partials.insert(partial.id, partial.clone());
        Ok(partial)
    }

    pub(crate) fn save_partial(&mut self, partial: &PagePartial) -> StoreResult<PagePartial> {
        let page = self
            .live_partial(partial.id)
            .map(|p| p.page.clone())
            .ok_or_else(|| StoreError::missing(EntityRef::Partial(partial.id).to_string()))?;
        self.ensure_partial_name_free(&page, &partial.name, Some(partial.id))?;

        let stored = self
            .partials
            .get_mut(&partial.id)
            .ok_or_else(|| StoreError::missing(EntityRef::Partial(partial.id).to_string()))?;
        stored.name.clone_from(&partial.name);
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    // --- rows ---

    pub(crate) fn live_row(&self, id: RowId) -> Option<&PartialRow> {
        self.rows
            .get(&id)
            .filter(|r| r.is_live())
            .map(|r| &r.value)
    }

    pub(crate) fn rows_of(&self, partial: PartialId) -> Vec<PartialRow> {
        self.rows
            .values()
            .filter(|r| r.is_live() && r.value.partial_id == partial)
            .map(|r| r.value.clone())
            .collect()
    }

    pub(crate) fn first_or_create_row(&mut self, draft: RowDraft) -> StoreResult<PartialRow> {
        let existing = self
            .rows
            .values()
            .find(|r| r.is_live() && draft.matches(&r.value));
        if let Some(row) = existing {
            return Ok(row.value.clone());
        }
        self.insert_row(draft)
    }

    pub(crate) fn insert_row(&mut self, draft: RowDraft) -> StoreResult<PartialRow> {
        if self.live_partial(draft.partial_id).is_none() {
            return Err(StoreError::missing(
                EntityRef::Partial(draft.partial_id).to_string(),
            ));
        }
        let row = PartialRow {
            id: RowId(next(&mut self.seq.row)),
            partial_id: draft.partial_id,
            position: draft.position,
            layout: draft.layout,
            updated_at: Utc::now(),
            columns: Vec::new(),
        };
        self.rows.insert(row.id, Tombstoned::live(row.clone()));
        Ok(row)
    }

    pub(crate) fn save_row(&mut self, row: &PartialRow) -> StoreResult<PartialRow> {
        let stored = self
            .rows
            .get_mut(&row.id)
            .filter(|r| r.is_live())
            .ok_or_else(|| StoreError::missing(EntityRef::Row(row.id).to_string()))?;
        stored.value.position = row.position;
        stored.value.layout = row.layout.clone();
        stored.value.updated_at = Utc::now();
        Ok(stored.value.clone())
    }

    // --- columns ---

    pub(crate) fn live_column(&self, id: ColumnId) -> Option<&PartialColumn> {
        self.columns
            .get(&id)
            .filter(|c| c.is_live())
            .map(|c| &c.value)
    }

    pub(crate) fn columns_of(&self, row: RowId) -> Vec<PartialColumn> {
        self.columns
            .values()
            .filter(|c| c.is_live() && c.value.row_id == row)
            .map(|c| c.value.clone())
            .collect()
    }

    pub(crate) fn first_or_create_column(
        &mut self,
        draft: ColumnDraft,
    ) -> StoreResult<PartialColumn> {
        let existing = self
            .columns
            .values()
            .find(|c| c.is_live() && draft.matches(&c.value));
        if let Some(column) = existing {
            return Ok(column.value.clone());
        }
        self.insert_column(draft)
    }

    pub(crate) fn insert_column(&mut self, draft: ColumnDraft) -> StoreResult<PartialColumn> {
        if self.live_row(draft.row_id).is_none() {
            return Err(StoreError::missing(EntityRef::Row(draft.row_id).to_string()));
        }
        let column = PartialColumn {
            id: ColumnId(next(&mut self.seq.column)),
            row_id: draft.row_id,
            position: draft.position,
            module_id: draft.module_id,
            layout: draft.layout,
            updated_at: Utc::now(),
        };
        self.columns
            .insert(column.id, Tombstoned::live(column.clone()));
        Ok(column)
    }

    pub(crate) fn save_column(&mut self, column: &PartialColumn) -> StoreResult<PartialColumn> {
        if self.live_row(column.row_id).is_none() {
            return Err(StoreError::missing(EntityRef::Row(column.row_id).to_string()));
        }
        let stored = self
            .columns
            .get_mut(&column.id)
            .filter(|c| c.is_live())
            .ok_or_else(|| StoreError::missing(EntityRef::Column(column.id).to_string()))?;
        stored.value.row_id = column.row_id;
        stored.value.position = column.position;
        stored.value.module_id = column.module_id;
        stored.value.layout = column.layout.clone();
        stored.value.updated_at = Utc::now();
        Ok(stored.value.clone())
    }
}
