//! Attribute sets for inserts and exact-attribute matching

use cms_model::{
    ColumnLayout, ModuleId, PartialColumn, PartialId, PartialRow, RowId, RowLayout, Timestamp,
};

pub use cms_model::MenuItemDraft;

/// Row attributes without identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDraft {
    /// Owning partial
    pub partial_id: PartialId,
    /// Position within the partial
    pub position: u32,
    /// Layout attributes
    pub layout: RowLayout,
}

impl RowDraft {
    /// Whether a stored row carries exactly these attributes
    #[must_use]
    pub fn matches(&self, row: &PartialRow) -> bool {
        row.partial_id == self.partial_id
            && row.position == self.position
            && row.layout == self.layout
    }
}

/// Column attributes without identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDraft {
    /// Owning row
    pub row_id: RowId,
    /// Position within the row
    pub position: u32,
    /// Referenced module
    pub module_id: Option<ModuleId>,
    /// Layout attributes
    pub layout: ColumnLayout,
}

impl ColumnDraft {
    /// Whether a stored column carries exactly these attributes
    #[must_use]
    pub fn matches(&self, column: &PartialColumn) -> bool {
        column.row_id == self.row_id
            && column.position == self.position
            && column.module_id == self.module_id
            && column.layout == self.layout
    }
}

/// Version attributes without identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDraft {
    /// Owning app
    pub app_name: String,
    /// Version name
    pub name: String,
    /// Enabled-at time
    pub enabled_at: Option<Timestamp>,
}

/// Module attributes without identity
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDraft {
    /// Owning app
    pub app_name: String,
    /// Module type name
    pub module_type: String,
    /// Module name
    pub name: String,
    /// Opaque settings blob
    pub settings: serde_json::Value,
}
