//! Descriptor validation
//!
//! Runs before any store access. Menu walks are iterative so arbitrarily
//! deep client input cannot exhaust the stack; anything nested deeper than
//! the configured limit is rejected.

use crate::error::{CmsError, CmsResult};
use cms_model::{
    CreateMenu, CreateMenuItem, CreatePartial, UpdateMenu, UpdateMenuItem, UpdatePage,
    UpdatePartial,
};
use std::collections::HashSet;

/// Non-empty after trimming
pub fn name(field: &str, value: &str) -> CmsResult<()> {
    if value.trim().is_empty() {
        return Err(CmsError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Non-empty locale code
pub fn locale(value: &str) -> CmsResult<()> {
    name("locale", value)
}

fn too_deep(max_depth: usize) -> CmsError {
    CmsError::validation(format!("menu nesting exceeds {max_depth} levels"))
}

/// Create snapshot: names and depth
pub fn create_menu(request: &CreateMenu, max_depth: usize) -> CmsResult<()> {
    name("menu name", &request.name)?;

    let mut stack: Vec<(&CreateMenuItem, usize)> =
        request.items.iter().map(|item| (item, 1)).collect();
    while let Some((item, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(too_deep(max_depth));
        }
        name("menu item name", &item.name)?;
        stack.extend(item.items.iter().map(|child| (child, depth + 1)));
    }
    Ok(())
}

/// Update snapshot: names, depth and unique ids
pub fn update_menu(request: &UpdateMenu, max_depth: usize) -> CmsResult<()> {
    name("menu name", &request.name)?;

    let mut seen = HashSet::new();
    let mut stack: Vec<(&UpdateMenuItem, usize)> =
        request.items.iter().map(|item| (item, 1)).collect();
    while let Some((item, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(too_deep(max_depth));
        }
        name("menu item name", &item.name)?;
        if let Some(id) = item.id {
            if !seen.insert(id) {
                return Err(CmsError::validation(format!(
                    "menu item {id} appears more than once"
                )));
            }
        }
        stack.extend(item.items.iter().map(|child| (child, depth + 1)));
    }
    Ok(())
}

/// Page update: name and one directive per robots option
pub fn update_page(request: &UpdatePage) -> CmsResult<()> {
    name("page name", &request.name)?;

    let mut options = HashSet::new();
    for directive in &request.indexing {
        if !options.insert(directive.option) {
            return Err(CmsError::validation(format!(
                "indexing option {} appears more than once",
                directive.option
            )));
        }
    }
    Ok(())
}

/// Create partial: name only
pub fn create_partial(request: &CreatePartial) -> CmsResult<()> {
    name("partial name", &request.name)
}

/// Update partial: name and unique row/column ids
pub fn update_partial(request: &UpdatePartial) -> CmsResult<()> {
    name("partial name", &request.name)?;

    let mut rows = HashSet::new();
    let mut columns = HashSet::new();
    for row in &request.rows {
        if let Some(id) = row.id {
            if !rows.insert(id) {
                return Err(CmsError::validation(format!("row {id} appears more than once")));
            }
        }
        for column in &row.columns {
            if let Some(id) = column.id {
                if !columns.insert(id) {
                    return Err(CmsError::validation(format!(
                        "column {id} appears more than once"
                    )));
                }
            }
        }
    }
    Ok(())
}
