//! Request descriptors
//!
//! Client-submitted snapshots. Create descriptors carry no identity; update
//! descriptors optionally carry the id and `updated_at` the client last saw.
//! Field-level decoding happens upstream, these types only fix the shape.

use crate::ids::{ColumnId, MenuItemId, ModuleId, RowId, VersionId};
use crate::indexing::IndexingDirective;
use crate::partial::{ColumnLayout, RowLayout};
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Create a menu with its full item tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenu {
    /// Owning version
    pub version_id: VersionId,
    /// Menu name
    pub name: String,
    /// Top-level items in submitted order
    #[serde(default)]
    pub items: Vec<CreateMenuItem>,
}

/// New menu item (no identity yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItem {
    /// Explicit position; defaults to the index among siblings
    #[serde(default)]
    pub position: Option<u32>,
    /// Display name
    pub name: String,
    /// Optional icon
    #[serde(default)]
    pub icon: Option<String>,
    /// Enabled-at time
    #[serde(default)]
    pub enabled_at: Option<Timestamp>,
    /// Indexing directives
    #[serde(default)]
    pub indexing: Vec<IndexingDirective>,
    /// Child items
    #[serde(default)]
    pub items: Vec<CreateMenuItem>,
}

impl CreateMenuItem {
    /// Item with a name and nothing else
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            position: None,
            name: name.into(),
            icon: None,
            enabled_at: None,
            indexing: Vec::new(),
            items: Vec::new(),
        }
    }

    /// With explicit position
    #[inline]
    #[must_use]
    pub fn at(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// With icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// With enabled-at time
    #[inline]
    #[must_use]
    pub fn enabled(mut self, at: Timestamp) -> Self {
        self.enabled_at = Some(at);
        self
    }

    /// With indexing directives
    #[inline]
    #[must_use]
    pub fn with_indexing(mut self, indexing: Vec<IndexingDirective>) -> Self {
        self.indexing = indexing;
        self
    }

    /// With child items
    #[inline]
    #[must_use]
    pub fn with_items(mut self, items: Vec<CreateMenuItem>) -> Self {
        self.items = items;
        self
    }
}

/// Full snapshot of a menu for update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenu {
    /// Menu name
    pub name: String,
    /// Menu `updated_at` the client last saw
    pub updated_at: Timestamp,
    /// Top-level items in submitted order
    #[serde(default)]
    pub items: Vec<UpdateMenuItem>,
}

/// Desired menu item; `id` absent means a brand new item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItem {
    /// Existing item id
    #[serde(default)]
    pub id: Option<MenuItemId>,
    /// Explicit position; defaults to the index among siblings
    #[serde(default)]
    pub position: Option<u32>,
    /// Display name
    pub name: String,
    /// Optional icon
    #[serde(default)]
    pub icon: Option<String>,
    /// Item `updated_at` the client last saw
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Enabled-at time
    #[serde(default)]
    pub enabled_at: Option<Timestamp>,
    /// Indexing directives (replaces the stored set)
    #[serde(default)]
    pub indexing: Vec<IndexingDirective>,
    /// Child items
    #[serde(default)]
    pub items: Vec<UpdateMenuItem>,
}

impl UpdateMenuItem {
    /// New item (no id)
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            position: None,
            name: name.into(),
            icon: None,
            updated_at: None,
            enabled_at: None,
            indexing: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Existing item as last seen by the client
    #[must_use]
    pub fn existing(id: MenuItemId, name: impl Into<String>, updated_at: Timestamp) -> Self {
        Self {
            id: Some(id),
            updated_at: Some(updated_at),
            ..Self::new(name)
        }
    }

    /// With explicit position
    #[inline]
    #[must_use]
    pub fn at(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// With icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// With indexing directives
    #[inline]
    #[must_use]
    pub fn with_indexing(mut self, indexing: Vec<IndexingDirective>) -> Self {
        self.indexing = indexing;
        self
    }

    /// With child items
    #[inline]
    #[must_use]
    pub fn with_items(mut self, items: Vec<UpdateMenuItem>) -> Self {
        self.items = items;
        self
    }
}

/// Create a partial, optionally with rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartial {
    /// Partial name
    pub name: String,
    /// Rows in submitted order
    #[serde(default)]
    pub rows: Vec<CreateRow>,
}

/// New row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRow {
    /// Explicit position; defaults to the index
    #[serde(default)]
    pub position: Option<u32>,
    /// Layout attributes
    #[serde(flatten)]
    pub layout: RowLayout,
    /// Columns in submitted order
    #[serde(default)]
    pub columns: Vec<CreateColumn>,
}

/// New column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumn {
    /// Explicit position; defaults to the index
    #[serde(default)]
    pub position: Option<u32>,
    /// Referenced module
    #[serde(default)]
    pub module_id: Option<ModuleId>,
    /// Layout attributes
    #[serde(flatten)]
    pub layout: ColumnLayout,
}

/// Full snapshot of a partial for update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartial {
    /// Partial name
    pub name: String,
    /// Partial `updated_at` the client last saw
    pub updated_at: Timestamp,
    /// Rows in submitted order
    #[serde(default)]
    pub rows: Vec<UpdateRow>,
}

/// Desired row; `id` absent means a brand new row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRow {
    /// Existing row id
    #[serde(default)]
    pub id: Option<RowId>,
    /// Explicit position; defaults to the index
    #[serde(default)]
    pub position: Option<u32>,
    /// Row `updated_at` the client last saw
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Layout attributes
    #[serde(flatten)]
    pub layout: RowLayout,
    /// Columns in submitted order
    #[serde(default)]
    pub columns: Vec<UpdateColumn>,
}

/// Desired column; `id` absent means a brand new column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColumn {
    /// Existing column id
    #[serde(default)]
    pub id: Option<ColumnId>,
    /// Explicit position; defaults to the index
    #[serde(default)]
    pub position: Option<u32>,
    /// Column `updated_at` the client last saw
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Referenced module
    #[serde(default)]
    pub module_id: Option<ModuleId>,
    /// Layout attributes
    #[serde(flatten)]
    pub layout: ColumnLayout,
}

/// Update a page's own attributes
///
/// Every field is a full overwrite; `indexing` replaces the stored set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePage {
    /// Page name
    pub name: String,
    /// Rendering plugin
    #[serde(default)]
    pub plugin: Option<String>,
    /// HTML title
    #[serde(default)]
    pub meta_title: Option<String>,
    /// HTML meta description
    #[serde(default)]
    pub meta_description: Option<String>,
    /// In-page anchor
    #[serde(default)]
    pub hashtag: Option<String>,
    /// Open the page in a new tab
    #[serde(default)]
    pub new_tab_enabled: bool,
    /// Link to `url` instead of rendering partials
    #[serde(default)]
    pub url_enabled: bool,
    /// External link target
    #[serde(default)]
    pub url: Option<String>,
    /// Enabled-at time
    #[serde(default)]
    pub enabled_at: Option<Timestamp>,
    /// Page `updated_at` the client last saw
    pub updated_at: Timestamp,
    /// Robots directives
    #[serde(default)]
    pub indexing: Vec<IndexingDirective>,
}

impl UpdatePage {
    /// Disabled page without metadata, as last seen at `updated_at`
    #[must_use]
    pub fn new(name: impl Into<String>, updated_at: Timestamp) -> Self {
        Self {
            name: name.into(),
            plugin: None,
            meta_title: None,
            meta_description: None,
            hashtag: None,
            new_tab_enabled: false,
            url_enabled: false,
            url: None,
            enabled_at: None,
            updated_at,
            indexing: Vec::new(),
        }
    }

    /// With enabled-at time
    #[inline]
    #[must_use]
    pub fn enabled(mut self, at: Timestamp) -> Self {
        self.enabled_at = Some(at);
        self
    }

    /// With HTML title and description
    #[inline]
    #[must_use]
    pub fn with_meta(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.meta_title = Some(title.into());
        self.meta_description = Some(description.into());
        self
    }

    /// With indexing directives
    #[inline]
    #[must_use]
    pub fn with_indexing(mut self, indexing: Vec<IndexingDirective>) -> Self {
        self.indexing = indexing;
        self
    }
}

/// Create a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersion {
    /// Owning app
    pub app_name: String,
    /// Version name
    pub name: String,
    /// Enabled-at time
    #[serde(default)]
    pub enabled_at: Option<Timestamp>,
}

/// Update a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVersion {
    /// Version name
    pub name: String,
    /// Enabled-at time (full overwrite)
    #[serde(default)]
    pub enabled_at: Option<Timestamp>,
    /// Version `updated_at` the client last saw
    pub updated_at: Timestamp,
}

/// Create a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModule {
    /// Owning app
    pub app_name: String,
    /// Module type name
    pub module_type: String,
    /// Module name
    pub name: String,
    /// Opaque settings blob
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// Update a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModule {
    /// Module type name
    pub module_type: String,
    /// Module name
    pub name: String,
    /// Opaque settings blob
    #[serde(default)]
    pub settings: serde_json::Value,
    /// Module `updated_at` the client last saw
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::IndexingOption;

    #[test]
    fn create_menu_decodes_nested_items() {
        let json = r#"{
            "versionId": 1,
            "name": "Main",
            "items": [
                {"name": "Home", "position": 0, "indexing": [{"option": "index"}],
                 "items": [{"name": "News"}]}
            ]
        }"#;
        let menu: CreateMenu = serde_json::from_str(json).unwrap();

        assert_eq!(menu.items.len(), 1);
        assert_eq!(menu.items[0].position, Some(0));
        assert_eq!(
            menu.items[0].indexing,
            vec![IndexingDirective::new(IndexingOption::Index)]
        );
        assert_eq!(menu.items[0].items[0].name, "News");
        assert_eq!(menu.items[0].items[0].position, None);
    }

    #[test]
    fn update_item_without_id_is_new() {
        let item: UpdateMenuItem = serde_json::from_str(r#"{"name":"About","position":0}"#).unwrap();

        assert!(item.id.is_none());
        assert!(item.updated_at.is_none());
        assert!(item.items.is_empty());
    }

    #[test]
    fn update_page_requires_updated_at() {
        let missing = serde_json::from_str::<UpdatePage>(r#"{"name":"Home"}"#);
        assert!(missing.is_err());

        let page: UpdatePage = serde_json::from_str(
            r#"{"name":"Home","updatedAt":"2024-01-01T00:00:00Z","urlEnabled":true,
                "indexing":[{"option":"noindex"}]}"#,
        )
        .unwrap();
        assert!(page.url_enabled);
        assert_eq!(page.indexing, vec![IndexingDirective::new(IndexingOption::NoIndex)]);
    }

    #[test]
    fn update_column_flattens_layout() {
        let column: UpdateColumn =
            serde_json::from_str(r#"{"id":4,"position":1,"cols":"6","md":4}"#).unwrap();

        assert_eq!(column.id, Some(ColumnId(4)));
        assert_eq!(column.layout.cols, "6");
        assert_eq!(column.layout.md, Some(4));
    }
}
