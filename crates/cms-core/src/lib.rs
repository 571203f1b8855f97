//! CMS Core
//!
//! Hierarchical content reconciliation over a transactional store:
//! - Menu item trees of unbounded depth, reconciled from full client snapshots
//! - Page partials (rows of columns), reconciled the same way
//! - Optimistic-concurrency checks on `updated_at` stamps
//! - Read-through caching with post-commit invalidation
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_core::{Cms, CmsConfig};
//! use cms_model::{CreateMenu, CreateMenuItem};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cms = Cms::in_memory(CmsConfig::new());
//! let tree = cms
//!     .create_menu(&CreateMenu {
//!         version_id,
//!         name: "Main".into(),
//!         items: vec![CreateMenuItem::new("Home").with_items(vec![CreateMenuItem::new("News")])],
//!     })
//!     .await?;
//!
//! println!("{} edges", tree.relations.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod loader;
pub mod reconcile;
pub mod service;
pub mod sync;
pub mod validate;

// Re-exports for convenience
pub use config::CmsConfig;
pub use error::{CmsError, CmsResult};
pub use reconcile::menu::UpdateOutcome;
pub use service::Cms;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with CMS Core
    pub use crate::{Cms, CmsConfig, CmsError, CmsResult};
    pub use cms_model::{
        CreateMenu, CreateMenuItem, CreatePartial, CreateRow, CreateColumn, MenuTree, PageKey,
        PagePartial, PublishedPage, UpdateMenu, UpdateMenuItem, UpdatePage, UpdatePartial,
        UpdateRow, UpdateColumn,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
