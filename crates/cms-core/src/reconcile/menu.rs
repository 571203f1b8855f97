//! Menu item tree reconciliation
//!
//! Both walks are iterative depth-first traversals driven by an explicit
//! stack, visiting siblings in submitted order.

use super::indexing::{self, IndexingOwner};
use super::sibling_position;
use crate::error::{CmsError, CmsResult};
use cms_model::{
    sort_relations, CreateMenuItem, Menu, MenuItem, MenuItemDraft, MenuItemId, MenuRelation,
    UpdateMenuItem,
};
use cms_store::{EntityRef, StoreTx};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Build a tree of new items under `menu`
///
/// Items, indexing directives and edges are all get-or-create, so an
/// identical resubmission writes nothing new. Returns every edge of the
/// built subtree in canonical order.
pub async fn create_items<T: StoreTx>(
    tx: &mut T,
    menu: &Menu,
    items: &[CreateMenuItem],
) -> CmsResult<Vec<MenuRelation>> {
    let mut edges = Vec::new();
    let mut stack: Vec<(Option<MenuItemId>, usize, &CreateMenuItem)> = items
        .iter()
        .enumerate()
        .rev()
        .map(|(index, item)| (None, index, item))
        .collect();

    while let Some((parent, index, descriptor)) = stack.pop() {
        let draft = MenuItemDraft {
            version_id: menu.version_id,
            name: descriptor.name.clone(),
            icon: descriptor.icon.clone(),
            enabled_at: descriptor.enabled_at,
        };
        let item = match tx.find_menu_item(&draft).await? {
            Some(item) => item,
            None => tx.insert_menu_item(draft).await?,
        };

        for directive in &descriptor.indexing {
            if !item.indexing.contains(directive) {
                tx.upsert_indexing(item.id, directive).await?;
            }
        }

        let position = sibling_position(descriptor.position, index);
        let edge = tx
            .first_or_create_relation(MenuRelation::new(menu.id, parent, item.id, position))
            .await?;
        tracing::debug!(menu_id = %menu.id, item_id = %item.id, position, "placed menu item");
        edges.push(edge);

        stack.extend(
            descriptor
                .items
                .iter()
                .enumerate()
                .rev()
                .map(|(index, child)| (Some(item.id), index, child)),
        );
    }

    sort_relations(&mut edges);
    Ok(edges)
}

/// Outcome of an update walk
#[derive(Debug, Default)]
pub struct UpdateOutcome {
    /// Existing items whose identity was reused
    pub reused: BTreeSet<MenuItemId>,
    /// Items removed from the tree and soft-deleted
    pub removed: BTreeSet<MenuItemId>,
}

/// Make the stored tree of `menu` match the desired snapshot
///
/// Removals are swept only after the whole snapshot has been placed, so
/// an item moved under a different parent is never mistaken for a removal
/// of its old parent's child list.
pub async fn update_items<T: StoreTx>(
    tx: &mut T,
    menu: &Menu,
    items: &[UpdateMenuItem],
) -> CmsResult<UpdateOutcome> {
    let mut outcome = UpdateOutcome::default();
    // parent -> children placed under it by this snapshot
    let mut placed: HashMap<Option<MenuItemId>, HashSet<MenuItemId>> = HashMap::new();
    let mut parents = vec![None];
    placed.insert(None, HashSet::new());

    let mut stack: Vec<(Option<MenuItemId>, usize, &UpdateMenuItem)> = items
        .iter()
        .enumerate()
        .rev()
        .map(|(index, item)| (None, index, item))
        .collect();

    while let Some((parent, index, descriptor)) = stack.pop() {
        let item = upsert_item(tx, menu, descriptor).await?;
        if descriptor.id.is_some() {
            outcome.reused.insert(item.id);
        }

        let desired = MenuRelation::new(
            menu.id,
            parent,
            item.id,
            sibling_position(descriptor.position, index),
        );
        if let Some(existing) = tx.relation_of(menu.id, item.id).await? {
            if existing != desired {
                tx.delete_relation(&existing).await?;
            }
        }
        tx.first_or_create_relation(desired).await?;

        placed.entry(parent).or_default().insert(item.id);
        placed.entry(Some(item.id)).or_default();
        parents.push(Some(item.id));

        stack.extend(
            descriptor
                .items
                .iter()
                .enumerate()
                .rev()
                .map(|(index, child)| (Some(item.id), index, child)),
        );
    }

    for parent in parents {
        let keep = placed.get(&parent);
        for relation in tx.relations_under(menu.id, parent).await? {
            if keep.is_some_and(|keep| keep.contains(&relation.child_id)) {
                continue;
            }
            tx.delete_relation(&relation).await?;
            tx.soft_delete(EntityRef::MenuItem(relation.child_id)).await?;
            tracing::debug!(menu_id = %menu.id, item_id = %relation.child_id, "removed menu item");
            outcome.removed.insert(relation.child_id);
        }
    }

    Ok(outcome)
}

/// Overwrite an existing item or insert a new one, then reconcile indexing
async fn upsert_item<T: StoreTx>(
    tx: &mut T,
    menu: &Menu,
    descriptor: &UpdateMenuItem,
) -> CmsResult<MenuItem> {
    let (item, stored_indexing) = match descriptor.id {
        Some(id) => {
            let mut stored = tx
                .menu_item(id)
                .await?
                .filter(|item| item.version_id == menu.version_id)
                .ok_or_else(|| CmsError::not_found(&EntityRef::MenuItem(id)))?;
            let indexing = std::mem::take(&mut stored.indexing);
            stored.name.clone_from(&descriptor.name);
            stored.icon.clone_from(&descriptor.icon);
            stored.enabled_at = descriptor.enabled_at;
            (tx.save_menu_item(&stored).await?, indexing)
        }
        None => {
            let draft = MenuItemDraft {
                version_id: menu.version_id,
                name: descriptor.name.clone(),
                icon: descriptor.icon.clone(),
                enabled_at: descriptor.enabled_at,
            };
            (tx.insert_menu_item(draft).await?, Vec::new())
        }
    };

    indexing::replace(
        tx,
        IndexingOwner::MenuItem(item.id),
        &stored_indexing,
        &descriptor.indexing,
    )
    .await?;
    Ok(item)
}
