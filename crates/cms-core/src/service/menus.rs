//! Menu operations

use super::{filter_lookup, name_free, restore_entity, Cms};
use crate::error::{CmsError, CmsResult};
use crate::{loader, reconcile, sync, validate};
use cms_cache::keys;
use cms_model::{
    CreateMenu, LookupEntry, MenuId, MenuItemId, MenuTree, PageKey, RelationView, UpdateMenu,
    VersionId,
};
use cms_store::{EntityRef, StoreTx, TreeStore};
use std::collections::HashSet;

impl<S: TreeStore> Cms<S> {
    /// Whether a menu name is free within a version
    pub async fn menu_name_available(
        &self,
        version_id: VersionId,
        name: &str,
        ignore: Option<&str>,
    ) -> CmsResult<bool> {
        let mut tx = self.begin().await?;
        let menus = tx.menus_of_version(version_id).await?;
        Ok(name_free(menus.iter().map(|m| m.name.as_str()), name, ignore))
    }

    /// Create a menu with its whole item tree
    ///
    /// # Errors
    /// - `Validation` for blank names or nesting past the depth limit
    /// - `NotFound` if the version does not exist
    /// - `NameCollision` if the version already has a menu of that name
    pub async fn create_menu(&self, request: &CreateMenu) -> CmsResult<MenuTree> {
        validate::create_menu(request, self.config.max_tree_depth)?;

        let mut tx = self.begin().await?;
        if tx.version(request.version_id).await?.is_none() {
            return Err(CmsError::not_found(&EntityRef::Version(request.version_id)));
        }
        let menus = tx.menus_of_version(request.version_id).await?;
        if !name_free(menus.iter().map(|m| m.name.as_str()), &request.name, None) {
            return Err(CmsError::NameCollision(format!(
                "menu '{}' already exists in version {}",
                request.name, request.version_id
            )));
        }

        let menu = tx
            .first_or_create_menu(request.version_id, &request.name)
            .await?;
        let edges = reconcile::menu::create_items(&mut tx, &menu, &request.items).await?;

        let mut tree = MenuTree::new(menu);
        for relation in edges {
            if let Some(child) = tx.menu_item(relation.child_id).await? {
                tree.relations.push(RelationView { relation, child });
            }
        }
        tx.commit().await?;

        tracing::info!(menu_id = %tree.menu.id, edges = tree.relations.len(), "created menu");
        self.invalidate_menus(tree.menu.version_id).await;
        Ok(tree)
    }

    /// Reconcile a menu against a full client snapshot
    ///
    /// # Errors
    /// - `Validation` for blank names, duplicate ids or excessive nesting
    /// - `NotFound` for an unknown menu or item id
    /// - `OutOfSync` if the menu or any submitted item is stale
    /// - `NameCollision` if the new name is taken
    pub async fn update_menu(&self, id: MenuId, request: &UpdateMenu) -> CmsResult<MenuTree> {
        validate::update_menu(request, self.config.max_tree_depth)?;

        let stored = self.get_menu(id).await?;
        sync::check_menu(&stored, request)?;

        let mut tx = self.begin().await?;
        let mut menu = tx
            .menu(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Menu(id)))?;
        if request.name != menu.name {
            let menus = tx.menus_of_version(menu.version_id).await?;
            if !name_free(menus.iter().map(|m| m.name.as_str()), &request.name, None) {
                return Err(CmsError::NameCollision(format!(
                    "menu '{}' already exists in version {}",
                    request.name, menu.version_id
                )));
            }
        }
        menu.name.clone_from(&request.name);
        let menu = tx.save_menu(&menu).await?;

        let outcome = reconcile::menu::update_items(&mut tx, &menu, &request.items).await?;
        let tree = loader::menu_tree(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(
            menu_id = %id,
            reused = outcome.reused.len(),
            removed = outcome.removed.len(),
            "updated menu"
        );
        self.invalidate_menus(menu.version_id).await;
        for item in outcome.reused.iter().chain(&outcome.removed) {
            self.cache.invalidate(&keys::pages_by_menu_item(item)).await;
        }
        Ok(tree)
    }

    /// Fetch a live menu with its ordered edges
    pub async fn get_menu(&self, id: MenuId) -> CmsResult<MenuTree> {
        let mut tx = self.begin().await?;
        loader::menu_tree(&mut tx, id).await
    }

    /// Soft-delete a menu
    pub async fn delete_menu(&self, id: MenuId) -> CmsResult<()> {
        let mut tx = self.begin().await?;
        let menu = tx
            .menu(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Menu(id)))?;
        tx.soft_delete(EntityRef::Menu(id)).await?;
        tx.commit().await?;

        tracing::info!(menu_id = %id, "deleted menu");
        self.invalidate_menus(menu.version_id).await;
        Ok(())
    }

    /// Restore a soft-deleted menu
    ///
    /// # Errors
    /// `Validation` if the menu is not deleted, `NameCollision` if its name
    /// has been reused meanwhile.
    pub async fn restore_menu(&self, id: MenuId) -> CmsResult<MenuTree> {
        let mut tx = self.begin().await?;
        let live = tx.menu(id).await?.is_some();
        restore_entity(&mut tx, EntityRef::Menu(id), live).await?;
        let tree = loader::menu_tree(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(menu_id = %id, "restored menu");
        self.invalidate_menus(tree.menu.version_id).await;
        Ok(tree)
    }

    /// Id/name list of a version's menus, served from cache
    pub async fn menu_lookup(
        &self,
        version_id: VersionId,
        name: Option<&str>,
    ) -> CmsResult<Vec<LookupEntry<MenuId>>> {
        let entries = self
            .cache
            .read_through(&keys::menus_lookup(version_id), || async {
                let mut tx = self.begin().await?;
                let menus = tx.menus_of_version(version_id).await?;
                Ok::<_, CmsError>(
                    menus
                        .into_iter()
                        .map(|menu| LookupEntry::new(menu.id, menu.name))
                        .collect(),
                )
            })
            .await?;
        Ok(filter_lookup(entries, name))
    }

    /// Menus of a version as published in one locale, served from cache
    ///
    /// Keeps only edges whose item is enabled and has an enabled page in
    /// `locale`, and whose ancestors are all kept as well.
    ///
    /// # Errors
    /// `Validation` if the version is not the published one.
    pub async fn published_menus(
        &self,
        version_id: VersionId,
        locale: &str,
    ) -> CmsResult<Vec<MenuTree>> {
        validate::locale(locale)?;
        if self.get_version(version_id).await?.published_at.is_none() {
            return Err(CmsError::validation(format!(
                "version {version_id} is not published"
            )));
        }
        self.cache
            .read_through_field(&keys::version_locales(version_id), locale, || async {
                let mut tx = self.begin().await?;
                let mut trees = Vec::new();
                for menu in tx.menus_of_version(version_id).await? {
                    let mut tree = loader::menu_tree(&mut tx, menu.id).await?;
                    let mut visible = Vec::with_capacity(tree.relations.len());
                    for view in tree.relations {
                        if view.child.is_enabled()
                            && has_enabled_page(&mut tx, view.child.id, locale).await?
                        {
                            visible.push(view);
                        }
                    }
                    tree.relations = reachable(visible);
                    trees.push(tree);
                }
                Ok::<_, CmsError>(trees)
            })
            .await
    }

    async fn invalidate_menus(&self, version_id: VersionId) {
        self.cache.invalidate(&keys::menus_lookup(version_id)).await;
        self.cache.invalidate(&keys::version_locales(version_id)).await;
    }
}

async fn has_enabled_page<T: StoreTx>(
    tx: &mut T,
    item: MenuItemId,
    locale: &str,
) -> CmsResult<bool> {
    let page = tx.page(&PageKey::new(item, locale)).await?;
    Ok(page.is_some_and(|page| page.enabled_at.is_some()))
}

/// Keep only edges connected to the root through kept edges
fn reachable(relations: Vec<RelationView>) -> Vec<RelationView> {
    let mut kept = HashSet::new();
    let mut frontier = vec![None];
    while let Some(parent) = frontier.pop() {
        for view in relations.iter().filter(|v| v.relation.parent_id == parent) {
            if kept.insert(view.relation.child_id) {
                frontier.push(Some(view.relation.child_id));
            }
        }
    }
    relations
        .into_iter()
        .filter(|view| kept.contains(&view.relation.child_id))
        .collect()
}
