//! CMS Store
//!
//! Persistence seam for the CMS trees:
//! - [`TreeStore`] / [`StoreTx`]: transactional adapter contract
//! - [`MemoryStore`]: in-memory implementation used by tests and the CLI
//! - Drafts: attribute sets used for inserts and exact-attribute lookups
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_store::{MemoryStore, StoreTx, TreeStore};
//!
//! let store = MemoryStore::new();
//! let mut tx = store.begin().await?;
//! let menu = tx.first_or_create_menu(version_id, "Main").await?;
//! tx.commit().await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod adapter;
pub mod draft;
pub mod error;
pub mod memory;

pub use adapter::{EntityRef, StoreTx, TreeStore};
pub use draft::{ColumnDraft, MenuItemDraft, ModuleDraft, RowDraft, VersionDraft};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, MemoryTx, StoreStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
