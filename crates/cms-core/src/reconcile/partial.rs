//! Row/column tree reconciliation for page partials

use super::sibling_position;
use crate::error::{CmsError, CmsResult};
use cms_model::{
    ColumnId, CreateRow, ModuleId, PagePartial, PartialColumn, PartialRow, RowId, UpdateRow,
};
use cms_store::{ColumnDraft, EntityRef, RowDraft, StoreTx};
use std::collections::{HashMap, HashSet};

async fn ensure_module<T: StoreTx>(tx: &mut T, module: Option<ModuleId>) -> CmsResult<()> {
    if let Some(id) = module {
        if tx.module(id).await?.is_none() {
            return Err(CmsError::not_found(&EntityRef::Module(id)));
        }
    }
    Ok(())
}

/// Get-or-create every row and column of a new partial
pub async fn create_rows<T: StoreTx>(
    tx: &mut T,
    partial: &PagePartial,
    rows: &[CreateRow],
) -> CmsResult<()> {
    for (row_index, descriptor) in rows.iter().enumerate() {
        let row = tx
            .first_or_create_row(RowDraft {
                partial_id: partial.id,
                position: sibling_position(descriptor.position, row_index),
                layout: descriptor.layout.clone(),
            })
            .await?;

        for (column_index, column) in descriptor.columns.iter().enumerate() {
            ensure_module(tx, column.module_id).await?;
            tx.first_or_create_column(ColumnDraft {
                row_id: row.id,
                position: sibling_position(column.position, column_index),
                module_id: column.module_id,
                layout: column.layout.clone(),
            })
            .await?;
        }
    }
    Ok(())
}

/// Make the stored rows of `partial` match the desired snapshot
///
/// `partial` must be loaded with its rows and columns. Rows are matched by
/// id within the partial; columns by id anywhere in the partial, so a
/// column can move between rows and keep its identity.
pub async fn update_rows<T: StoreTx>(
    tx: &mut T,
    partial: &PagePartial,
    rows: &[UpdateRow],
) -> CmsResult<()> {
    let stored_rows: HashMap<RowId, &PartialRow> =
        partial.rows.iter().map(|row| (row.id, row)).collect();
    let stored_columns: HashMap<ColumnId, &PartialColumn> = partial
        .rows
        .iter()
        .flat_map(|row| row.columns.iter())
        .map(|column| (column.id, column))
        .collect();

    let mut kept_rows = HashSet::new();
    let mut kept_columns = HashSet::new();

    for (row_index, descriptor) in rows.iter().enumerate() {
        let position = sibling_position(descriptor.position, row_index);
        let row = match descriptor.id {
            Some(id) => {
                let mut row = stored_rows
                    .get(&id)
                    .map(|row| (*row).clone())
                    .ok_or_else(|| CmsError::not_found(&EntityRef::Row(id)))?;
                row.position = position;
                row.layout = descriptor.layout.clone();
                tx.save_row(&row).await?
            }
            None => {
                tx.insert_row(RowDraft {
                    partial_id: partial.id,
                    position,
                    layout: descriptor.layout.clone(),
                })
                .await?
            }
        };
        kept_rows.insert(row.id);

        for (column_index, column) in descriptor.columns.iter().enumerate() {
            ensure_module(tx, column.module_id).await?;
            let position = sibling_position(column.position, column_index);
            let saved = match column.id {
                Some(id) => {
                    let mut stored = stored_columns
                        .get(&id)
                        .map(|column| (*column).clone())
                        .ok_or_else(|| CmsError::not_found(&EntityRef::Column(id)))?;
                    stored.row_id = row.id;
                    stored.position = position;
                    stored.module_id = column.module_id;
                    stored.layout = column.layout.clone();
                    tx.save_column(&stored).await?
                }
                None => {
                    tx.insert_column(ColumnDraft {
                        row_id: row.id,
                        position,
                        module_id: column.module_id,
                        layout: column.layout.clone(),
                    })
                    .await?
                }
            };
            kept_columns.insert(saved.id);
        }
    }

    // columns first; a dropped row cascades to whatever is left under it
    for id in stored_columns.keys() {
        if !kept_columns.contains(id) {
            tx.soft_delete(EntityRef::Column(*id)).await?;
        }
    }
    for id in stored_rows.keys() {
        if !kept_rows.contains(id) {
            tx.soft_delete(EntityRef::Row(*id)).await?;
        }
    }

    tracing::debug!(
        partial_id = %partial.id,
        rows = kept_rows.len(),
        columns = kept_columns.len(),
        "reconciled partial rows"
    );
    Ok(())
}
