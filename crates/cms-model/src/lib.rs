//! CMS Model
//!
//! Plain data types shared by every layer of the CMS:
//! - Entity identifiers ([`MenuId`], [`MenuItemId`], [`RowId`], ...)
//! - The menu tree (menus, items, parent/child relations)
//! - Pages with their metadata, and the page-partial tree (partials, rows,
//!   columns)
//! - Request descriptors submitted by clients
//! - Deterministic relation ordering ([`ordering`])
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_model::{sort_relations, MenuRelation};
//!
//! let mut relations = load_relations();
//! sort_relations(&mut relations);
//! // roots first, then grouped by parent, each group by position
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod error;
pub mod ids;
pub mod indexing;
pub mod menu;
pub mod ordering;
pub mod partial;
pub mod request;
pub mod version;

// Re-exports for convenience
pub use error::ModelError;
pub use ids::{ColumnId, MenuId, MenuItemId, ModuleId, PartialId, RowId, VersionId};
pub use indexing::{IndexingDirective, IndexingOption};
pub use menu::{Menu, MenuItem, MenuItemDraft, MenuNode, MenuRelation, MenuTree, RelationView};
pub use ordering::{sort_by_position, sort_relations, Edge, Positioned};
pub use partial::{
    ColumnLayout, Page, PageKey, PagePartial, PartialColumn, PartialRow, PublishedPage,
    RowLayout,
};
pub use request::{
    CreateColumn, CreateMenu, CreateMenuItem, CreateModule, CreatePartial, CreateRow,
    CreateVersion, UpdateColumn, UpdateMenu, UpdateMenuItem, UpdateModule, UpdatePage,
    UpdatePartial, UpdateRow, UpdateVersion,
};
pub use version::{App, LookupEntry, Module, Version};

/// Timestamp type used for every `updated_at` / `enabled_at` field
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
