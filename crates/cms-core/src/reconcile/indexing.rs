//! Robots directive sets
//!
//! Menu items and pages carry the same directive vocabulary. An update
//! replaces the stored set: new or changed directives are upserted and
//! options no longer submitted are removed.

use crate::error::CmsResult;
use cms_model::{IndexingDirective, MenuItemId, PageKey};
use cms_store::StoreTx;

/// Record a directive set hangs off
#[derive(Debug, Clone, Copy)]
pub enum IndexingOwner<'a> {
    /// Menu item directives
    MenuItem(MenuItemId),
    /// Page directives (menu item × locale)
    Page(&'a PageKey),
}

/// Replace the stored directive set with the desired one
pub async fn replace<T: StoreTx>(
    tx: &mut T,
    owner: IndexingOwner<'_>,
    stored: &[IndexingDirective],
    desired: &[IndexingDirective],
) -> CmsResult<()> {
    for directive in desired {
        if stored.contains(directive) {
            continue;
        }
        match owner {
            IndexingOwner::MenuItem(id) => tx.upsert_indexing(id, directive).await?,
            IndexingOwner::Page(key) => tx.upsert_page_indexing(key, directive).await?,
        }
    }
    for directive in stored {
        if desired.iter().any(|d| d.option == directive.option) {
            continue;
        }
        match owner {
            IndexingOwner::MenuItem(id) => tx.delete_indexing(id, directive.option).await?,
            IndexingOwner::Page(key) => tx.delete_page_indexing(key, directive.option).await?,
        }
    }
    Ok(())
}
