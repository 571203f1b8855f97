//! Tree assembly from store primitives

use crate::error::{CmsError, CmsResult};
use cms_model::{sort_by_position, MenuId, MenuTree, PagePartial, PartialId, RelationView};
use cms_store::{EntityRef, StoreTx};

/// Load a live menu with its populated, canonically ordered edges
///
/// Edges whose child is no longer live are skipped.
pub async fn menu_tree<T: StoreTx>(tx: &mut T, id: MenuId) -> CmsResult<MenuTree> {
    let menu = tx
        .menu(id)
        .await?
        .ok_or_else(|| CmsError::not_found(&EntityRef::Menu(id)))?;

    let mut tree = MenuTree::new(menu);
    for relation in tx.relations_of_menu(id).await? {
        if let Some(child) = tx.menu_item(relation.child_id).await? {
            tree.relations.push(RelationView { relation, child });
        }
    }
    tree.sort_relations();
    Ok(tree)
}

/// Load a live partial with rows and columns ordered by position
pub async fn partial<T: StoreTx>(tx: &mut T, id: PartialId) -> CmsResult<PagePartial> {
    let mut partial = tx
        .partial(id)
        .await?
        .ok_or_else(|| CmsError::not_found(&EntityRef::Partial(id)))?;

    let mut rows = tx.rows_of(id).await?;
    for row in &mut rows {
        let mut columns = tx.columns_of(row.id).await?;
        sort_by_position(&mut columns);
        row.columns = columns;
    }
    sort_by_position(&mut rows);
    partial.rows = rows;
    Ok(partial)
}
