//! Reconciliation engine
//!
//! Turns a client snapshot into store writes inside one open transaction:
//! - [`menu`]: unbounded-depth menu item trees
//! - [`partial`]: two-level row/column trees
//! - [`indexing`]: robots directive sets of items and pages
//!
//! Create paths match existing nodes by exact attributes, so re-running a
//! create is idempotent. Update paths match by the id the client sends and
//! nothing else; an id-less node is always inserted.

pub mod indexing;
pub mod menu;
pub mod partial;

/// Explicit position, or the index among submitted siblings
#[inline]
pub(crate) fn sibling_position(explicit: Option<u32>, index: usize) -> u32 {
    explicit.unwrap_or_else(|| u32::try_from(index).unwrap_or(u32::MAX))
}
