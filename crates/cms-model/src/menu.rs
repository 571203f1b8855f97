//! Menu tree
//!
//! A [`Menu`] is the root of an unbounded-depth tree of [`MenuItem`]s. The
//! shape of the tree lives in [`MenuRelation`] edges, independent of item
//! content, so an item can be moved by rewriting a single edge.

use crate::ids::{MenuId, MenuItemId, VersionId};
use crate::indexing::IndexingDirective;
use crate::ordering::{sort_relations, Edge};
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Menu (tree root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    /// Menu ID
    pub id: MenuId,
    /// Owning version
    pub version_id: VersionId,
    /// Name, unique within the version
    pub name: String,
    /// Creation time
    pub created_at: Timestamp,
    /// Last write time, set by the store
    pub updated_at: Timestamp,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<Timestamp>,
}

/// Menu item (tree node)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Item ID
    pub id: MenuItemId,
    /// Owning version
    pub version_id: VersionId,
    /// Display name
    pub name: String,
    /// Optional icon
    pub icon: Option<String>,
    /// Enabled-at time, `None` while disabled
    pub enabled_at: Option<Timestamp>,
    /// Indexing directives, ordered by option
    pub indexing: Vec<IndexingDirective>,
    /// Last write time, set by the store
    pub updated_at: Timestamp,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<Timestamp>,
}

impl MenuItem {
    /// Whether the item is currently enabled
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled_at.is_some()
    }

    /// Mutable attributes of this item
    #[must_use]
    pub fn draft(&self) -> MenuItemDraft {
        MenuItemDraft {
            version_id: self.version_id,
            name: self.name.clone(),
            icon: self.icon.clone(),
            enabled_at: self.enabled_at,
        }
    }
}

/// Attribute set of a menu item without identity
///
/// Used for inserts and for exact-attribute matching on the create path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuItemDraft {
    /// Owning version
    pub version_id: VersionId,
    /// Display name
    pub name: String,
    /// Optional icon
    pub icon: Option<String>,
    /// Enabled-at time
    pub enabled_at: Option<Timestamp>,
}

impl MenuItemDraft {
    /// Whether a stored item carries exactly these attributes
    #[must_use]
    pub fn matches(&self, item: &MenuItem) -> bool {
        item.version_id == self.version_id
            && item.name == self.name
            && item.icon == self.icon
            && item.enabled_at == self.enabled_at
    }
}

/// Persisted parent → child edge of one menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRelation {
    /// Menu the edge belongs to
    pub menu_id: MenuId,
    /// Parent item, `None` for top-level items
    pub parent_id: Option<MenuItemId>,
    /// Child item
    pub child_id: MenuItemId,
    /// Display position among siblings
    pub position: u32,
}

impl MenuRelation {
    /// Create new relation
    #[inline]
    #[must_use]
    pub fn new(
        menu_id: MenuId,
        parent_id: Option<MenuItemId>,
        child_id: MenuItemId,
        position: u32,
    ) -> Self {
        Self {
            menu_id,
            parent_id,
            child_id,
            position,
        }
    }
}

impl Edge for MenuRelation {
    type NodeId = MenuItemId;

    fn parent(&self) -> Option<MenuItemId> {
        self.parent_id
    }

    fn child(&self) -> MenuItemId {
        self.child_id
    }

    fn position(&self) -> u32 {
        self.position
    }
}

/// Relation with its child item populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationView {
    /// The edge
    #[serde(flatten)]
    pub relation: MenuRelation,
    /// The child item
    pub child: MenuItem,
}

impl Edge for RelationView {
    type NodeId = MenuItemId;

    fn parent(&self) -> Option<MenuItemId> {
        self.relation.parent_id
    }

    fn child(&self) -> MenuItemId {
        self.relation.child_id
    }

    fn position(&self) -> u32 {
        self.relation.position
    }
}

/// Menu with its flat, canonically ordered edge collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuTree {
    /// Tree root
    pub menu: Menu,
    /// Edges with populated children
    pub relations: Vec<RelationView>,
}

impl MenuTree {
    /// Create tree with no edges
    #[inline]
    #[must_use]
    pub fn new(menu: Menu) -> Self {
        Self {
            menu,
            relations: Vec::new(),
        }
    }

    /// Put relations into canonical order
    pub fn sort_relations(&mut self) {
        sort_relations(&mut self.relations);
    }

    /// Ordered children of `parent` (`None` for top level)
    pub fn children_of(
        &self,
        parent: Option<MenuItemId>,
    ) -> impl Iterator<Item = &RelationView> + '_ {
        let mut children: Vec<_> = self
            .relations
            .iter()
            .filter(|r| r.relation.parent_id == parent)
            .collect();
        children.sort_by(|a, b| crate::ordering::compare_edges(*a, *b));
        children.into_iter()
    }

    /// Names of the ordered top-level items
    #[must_use]
    pub fn root_names(&self) -> Vec<&str> {
        self.children_of(None).map(|r| r.child.name.as_str()).collect()
    }

    /// Stored `updated_at` of every item in the tree
    #[must_use]
    pub fn item_stamps(&self) -> HashMap<MenuItemId, Timestamp> {
        self.relations
            .iter()
            .map(|r| (r.relation.child_id, r.child.updated_at))
            .collect()
    }

    /// Assemble the nested view
    ///
    /// Walks the edges from the roots down with an explicit stack; an item
    /// reachable twice (which the store forbids) is emitted only once.
    #[must_use]
    pub fn nest(&self) -> Vec<MenuNode> {
        let mut visited = HashSet::new();
        // preorder list of (parent slot, childless node)
        let mut flat: Vec<(Option<usize>, MenuNode)> = Vec::new();
        let mut stack: Vec<(Option<usize>, &RelationView)> = Vec::new();
        let roots: Vec<&RelationView> = self.children_of(None).collect();
        stack.extend(roots.into_iter().rev().map(|view| (None, view)));

        while let Some((parent, view)) = stack.pop() {
            if !visited.insert(view.relation.child_id) {
                continue;
            }
            let slot = flat.len();
            flat.push((
                parent,
                MenuNode {
                    item: view.child.clone(),
                    position: view.relation.position,
                    items: Vec::new(),
                },
            ));
            let children: Vec<&RelationView> =
                self.children_of(Some(view.relation.child_id)).collect();
            stack.extend(children.into_iter().rev().map(|child| (Some(slot), child)));
        }

        // every descendant follows its parent, so folding from the back
        // completes each node before it is attached
        let mut nested = Vec::new();
        while let Some((parent, mut node)) = flat.pop() {
            node.items.reverse();
            match parent {
                Some(slot) => flat[slot].1.items.push(node),
                None => nested.push(node),
            }
        }
        nested.reverse();
        nested
    }
}

/// Nested menu node for API-facing output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    /// The item
    #[serde(flatten)]
    pub item: MenuItem,
    /// Position among siblings
    pub position: u32,
    /// Ordered children
    pub items: Vec<MenuNode>,
}
