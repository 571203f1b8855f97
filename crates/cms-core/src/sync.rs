//! Optimistic concurrency check
//!
//! A snapshot is stale when any node it carries, at any depth, claims an
//! `updated_at` strictly older than the stored one. Nodes without an id or
//! without a timestamp are new and exempt. Timestamps are compared at whole
//! seconds, the precision clients round-trip.
//!
//! The check runs before the write transaction opens.

use crate::error::{CmsError, CmsResult};
use cms_model::{
    MenuItemId, MenuTree, PagePartial, Timestamp, UpdateMenu, UpdateMenuItem, UpdatePartial,
};
use cms_store::EntityRef;
use std::collections::HashMap;
use std::hash::Hash;

/// Whole-second staleness test
#[inline]
#[must_use]
pub fn is_stale(submitted: Timestamp, stored: Timestamp) -> bool {
    submitted.timestamp() < stored.timestamp()
}

/// Reject a flat record (version, module, page) submitted with a stale stamp
pub fn check_record(
    entity: &EntityRef,
    submitted: Timestamp,
    stored: Timestamp,
) -> CmsResult<()> {
    if is_stale(submitted, stored) {
        tracing::warn!(%entity, %stored, %submitted, "rejecting stale snapshot");
        return Err(CmsError::OutOfSync {
            entity: entity.to_string(),
            stored,
            submitted,
        });
    }
    Ok(())
}

/// Compare one submitted node against the stored stamps
fn check_node<I: Eq + Hash + Copy>(
    stored: &HashMap<I, Timestamp>,
    id: Option<I>,
    submitted: Option<Timestamp>,
    entity: impl Fn(I) -> EntityRef,
) -> CmsResult<()> {
    let (Some(id), Some(submitted)) = (id, submitted) else {
        return Ok(());
    };
    match stored.get(&id) {
        Some(stored) => check_record(&entity(id), submitted, *stored),
        None => Ok(()),
    }
}

/// Every (id, `updated_at`) pair of a menu snapshot, pre-order
#[must_use]
pub fn flatten_menu_items(
    items: &[UpdateMenuItem],
) -> Vec<(Option<MenuItemId>, Option<Timestamp>)> {
    let mut flat = Vec::new();
    let mut stack: Vec<&UpdateMenuItem> = items.iter().rev().collect();
    while let Some(item) = stack.pop() {
        flat.push((item.id, item.updated_at));
        stack.extend(item.items.iter().rev());
    }
    flat
}

/// Reject a menu update whose root or any item is stale
pub fn check_menu(stored: &MenuTree, update: &UpdateMenu) -> CmsResult<()> {
    check_record(
        &EntityRef::Menu(stored.menu.id),
        update.updated_at,
        stored.menu.updated_at,
    )?;

    let stamps = stored.item_stamps();
    for (id, submitted) in flatten_menu_items(&update.items) {
        check_node(&stamps, id, submitted, EntityRef::MenuItem)?;
    }
    Ok(())
}

/// Reject a partial update whose root, any row or any column is stale
pub fn check_partial(stored: &PagePartial, update: &UpdatePartial) -> CmsResult<()> {
    check_record(
        &EntityRef::Partial(stored.id),
        update.updated_at,
        stored.updated_at,
    )?;

    let rows = stored.row_stamps();
    let columns = stored.column_stamps();
    for row in &update.rows {
        check_node(&rows, row.id, row.updated_at, EntityRef::Row)?;
        for column in &row.columns {
            check_node(&columns, column.id, column.updated_at, EntityRef::Column)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use cms_model::{Menu, MenuId, MenuItem, MenuRelation, RelationView, VersionId};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn stored_tree() -> MenuTree {
        let item = |id: u64, updated: i64| MenuItem {
            id: MenuItemId(id),
            version_id: VersionId(1),
            name: format!("item {id}"),
            icon: None,
            enabled_at: None,
            indexing: Vec::new(),
            updated_at: at(updated),
            deleted_at: None,
        };
        MenuTree {
            menu: Menu {
                id: MenuId(1),
                version_id: VersionId(1),
                name: "Main".to_string(),
                created_at: at(0),
                updated_at: at(10),
                deleted_at: None,
            },
            relations: vec![
                RelationView {
                    relation: MenuRelation::new(MenuId(1), None, MenuItemId(1), 0),
                    child: item(1, 10),
                },
                RelationView {
                    relation: MenuRelation::new(MenuId(1), Some(MenuItemId(1)), MenuItemId(2), 0),
                    child: item(2, 10),
                },
                RelationView {
                    relation: MenuRelation::new(MenuId(1), Some(MenuItemId(2)), MenuItemId(3), 0),
                    child: item(3, 20),
                },
            ],
        }
    }

    fn snapshot(leaf_seen: i64) -> UpdateMenu {
        UpdateMenu {
            name: "Main".to_string(),
            updated_at: at(10),
            items: vec![UpdateMenuItem::existing(MenuItemId(1), "item 1", at(10)).with_items(vec![
                UpdateMenuItem::existing(MenuItemId(2), "item 2", at(10)).with_items(vec![
                    UpdateMenuItem::existing(MenuItemId(3), "item 3", at(leaf_seen)),
                ]),
            ])],
        }
    }

    #[test]
    fn fresh_snapshot_passes() {
        assert!(check_menu(&stored_tree(), &snapshot(20)).is_ok());
    }

    #[test]
    fn stale_leaf_three_levels_down_is_rejected() {
        let err = check_menu(&stored_tree(), &snapshot(19)).unwrap_err();
        match err {
            CmsError::OutOfSync { entity, .. } => assert_eq!(entity, "menu item 3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stale_root_is_rejected_before_children() {
        let mut update = snapshot(20);
        update.updated_at = at(9);
        let err = check_menu(&stored_tree(), &update).unwrap_err();
        assert!(err.to_string().starts_with("menu 1"));
    }

    #[test]
    fn sub_second_differences_are_ignored() {
        let stored = at(10) + Duration::milliseconds(900);
        assert!(!is_stale(at(10), stored));
        assert!(is_stale(at(9), stored));
    }

    #[test]
    fn flat_record_check_names_the_record() {
        let entity = EntityRef::Module(cms_model::ModuleId(4));
        assert!(check_record(&entity, at(10), at(10)).is_ok());
        assert!(check_record(&entity, at(11), at(10)).is_ok());

        let err = check_record(&entity, at(9), at(10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("module 4 is out of sync: stored {}, submitted {}", at(10), at(9))
        );
    }

    #[test]
    fn new_and_unstamped_nodes_are_exempt() {
        let mut update = snapshot(20);
        update.items.push(UpdateMenuItem::new("brand new"));
        update.items.push(UpdateMenuItem {
            updated_at: None,
            ..UpdateMenuItem::existing(MenuItemId(3), "item 3", at(0))
        });
        assert!(check_menu(&stored_tree(), &update).is_ok());
    }

    #[test]
    fn flatten_visits_every_depth_in_pre_order() {
        let ids: Vec<_> = flatten_menu_items(&snapshot(20).items)
            .into_iter()
            .filter_map(|(id, _)| id.map(MenuItemId::get))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
