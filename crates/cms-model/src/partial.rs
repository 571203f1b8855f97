//! Page partial tree
//!
//! A [`PagePartial`] belongs to a page (menu item × locale) and holds exactly
//! two levels below it: rows, each with columns. The layout attributes on
//! rows and columns are opaque pass-through data.

use crate::ids::{ColumnId, MenuItemId, ModuleId, PartialId, RowId};
use crate::indexing::IndexingDirective;
use crate::ordering::Positioned;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page identity (menu item × locale)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageKey {
    /// Menu item the page hangs off
    pub menu_item_id: MenuItemId,
    /// Locale code
    pub locale: String,
}

impl PageKey {
    /// Create new page key
    #[inline]
    #[must_use]
    pub fn new(menu_item_id: MenuItemId, locale: impl Into<String>) -> Self {
        Self {
            menu_item_id,
            locale: locale.into(),
        }
    }
}

/// Localised page of a menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page identity
    #[serde(flatten)]
    pub key: PageKey,
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
    /// Robots directives, ordered by option
    #[serde(default)]
    pub indexing: Vec<IndexingDirective>,
    /// Enabled-at time, `None` while disabled
    pub enabled_at: Option<Timestamp>,
    /// Last write time
    pub updated_at: Timestamp,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<Timestamp>,
}

impl Page {
    /// Disabled page with no metadata
    #[must_use]
    pub fn new(key: PageKey, name: impl Into<String>, updated_at: Timestamp) -> Self {
        Self {
            key,
            name: name.into(),
            plugin: None,
            meta_title: None,
            meta_description: None,
            hashtag: None,
            new_tab_enabled: false,
            url_enabled: false,
            url: None,
            indexing: Vec::new(),
            enabled_at: None,
            updated_at,
            deleted_at: None,
        }
    }

    /// Whether the page has an enabled-at time
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled_at.is_some()
    }
}

/// Public view of an enabled page with its partials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPage {
    /// Page identity
    #[serde(flatten)]
    pub key: PageKey,
    /// Page name
    pub name: String,
    /// Rendering plugin
    pub plugin: Option<String>,
    /// HTML title
    pub meta_title: Option<String>,
    /// HTML meta description
    pub meta_description: Option<String>,
    /// Robots directives
    pub indexing: Vec<IndexingDirective>,
    /// Live partials, ordered by id, rows and columns ordered by position
    pub partials: Vec<PagePartial>,
}

impl PublishedPage {
    /// Assemble from a stored page and its loaded partials
    #[must_use]
    pub fn new(page: Page, partials: Vec<PagePartial>) -> Self {
        Self {
            key: page.key,
            name: page.name,
            plugin: page.plugin,
            meta_title: page.meta_title,
            meta_description: page.meta_description,
            indexing: page.indexing,
            partials,
        }
    }
}

/// Row layout attributes
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowLayout {
    pub no_gutters: bool,
    pub dense: bool,
    pub hashtag: Option<String>,
    pub align: Option<String>,
    pub align_xxl: Option<String>,
    pub align_xl: Option<String>,
    pub align_lg: Option<String>,
    pub align_md: Option<String>,
    pub align_sm: Option<String>,
    pub align_content: Option<String>,
    pub align_content_xxl: Option<String>,
    pub align_content_xl: Option<String>,
    pub align_content_lg: Option<String>,
    pub align_content_md: Option<String>,
    pub align_content_sm: Option<String>,
    pub justify: Option<String>,
    pub justify_xxl: Option<String>,
    pub justify_xl: Option<String>,
    pub justify_lg: Option<String>,
    pub justify_md: Option<String>,
    pub justify_sm: Option<String>,
}

/// Column layout attributes
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnLayout {
    pub cols: String,
    pub xxl: Option<i16>,
    pub xl: Option<i16>,
    pub lg: Option<i16>,
    pub md: Option<i16>,
    pub sm: Option<i16>,
    pub xs: Option<i16>,
    pub offset: Option<i16>,
    pub offset_xxl: Option<i16>,
    pub offset_xl: Option<i16>,
    pub offset_lg: Option<i16>,
    pub offset_md: Option<i16>,
    pub offset_sm: Option<i16>,
    pub order: Option<i16>,
    pub order_xxl: Option<i16>,
    pub order_xl: Option<i16>,
    pub order_lg: Option<i16>,
    pub order_md: Option<i16>,
    pub order_sm: Option<i16>,
    pub align_self: Option<String>,
    pub content: Option<String>,
}

/// Partial column (leaf)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialColumn {
    /// Column ID
    pub id: ColumnId,
    /// Owning row
    pub row_id: RowId,
    /// Position within the row
    pub position: u32,
    /// Referenced module
    pub module_id: Option<ModuleId>,
    /// Layout attributes
    #[serde(flatten)]
    pub layout: ColumnLayout,
    /// Last write time
    pub updated_at: Timestamp,
}

impl Positioned for PartialColumn {
    type Key = ColumnId;

    fn position(&self) -> u32 {
        self.position
    }

    fn key(&self) -> ColumnId {
        self.id
    }
}

/// Partial row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRow {
    /// Row ID
    pub id: RowId,
    /// Owning partial
    pub partial_id: PartialId,
    /// Position within the partial
    pub position: u32,
    /// Layout attributes
    #[serde(flatten)]
    pub layout: RowLayout,
    /// Last write time
    pub updated_at: Timestamp,
    /// Ordered columns
    pub columns: Vec<PartialColumn>,
}

impl Positioned for PartialRow {
    type Key = RowId;

    fn position(&self) -> u32 {
        self.position
    }

    fn key(&self) -> RowId {
        self.id
    }
}

/// Page partial (tree root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePartial {
    /// Partial ID
    pub id: PartialId,
    /// Owning page
    #[serde(flatten)]
    pub page: PageKey,
    /// Name, unique within the page
    pub name: String,
    /// Last write time
    pub updated_at: Timestamp,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<Timestamp>,
    /// Ordered rows
    pub rows: Vec<PartialRow>,
}

impl PagePartial {
    /// Stored `updated_at` of every row
    #[must_use]
    pub fn row_stamps(&self) -> HashMap<RowId, Timestamp> {
        self.rows.iter().map(|r| (r.id, r.updated_at)).collect()
    }

    /// Stored `updated_at` of every column, across all rows
    #[must_use]
    pub fn column_stamps(&self) -> HashMap<ColumnId, Timestamp> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .map(|c| (c.id, c.updated_at))
            .collect()
    }

    /// Locate a column anywhere in the partial
    #[must_use]
    pub fn find_column(&self, id: ColumnId) -> Option<&PartialColumn> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .find(|c| c.id == id)
    }
}
