//! CMS Cache
//!
//! Read-through caching for lookup lists and published menus:
//! - [`CacheClient`]: key/value backend seam with per-entry TTL
//! - [`MokaCacheClient`]: in-process backend on `moka`
//! - [`CacheLayer`]: read-through, field-level invalidation, failure tolerance
//! - [`keys`]: the key scheme
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_cache::{keys, CacheLayer, MokaCacheClient};
//!
//! let layer = CacheLayer::new(Arc::new(MokaCacheClient::default()), ttl);
//! let menus = layer
//!     .read_through(&keys::menus_lookup(version_id), || load_menus(version_id))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod error;
pub mod keys;
pub mod layer;

pub use client::{CacheClient, MokaCacheClient};
pub use error::{CacheError, CacheResult};
pub use layer::CacheLayer;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
