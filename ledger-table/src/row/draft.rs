use crate::schema::ColumnSchema;
use crate::validation::{ValidationError, validate_cell};

use super::RowId;

/// Whether a row is showing committed values or being edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowMode {
    #[default]
    Viewing,
    Editing,
}

/// Working copy of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellDraft {
    pub value: String,
    pub is_invalid: bool,
    /// Validation message for the stored value. Set iff `is_invalid`.
    pub error_message: Option<String>,
    /// Why the last keystroke was refused. The stored value is unaffected;
    /// cleared by the next accepted input.
    pub rejected: Option<String>,
    pub is_required: bool,
    pub max_length: Option<usize>,
}

impl CellDraft {
    /// Build a cell for `column`, validated.
    pub fn new(column: &ColumnSchema, value: impl Into<String>) -> Self {
        let mut cell = Self {
            value: value.into(),
            is_invalid: false,
            error_message: None,
            rejected: None,
            is_required: column.required,
            max_length: column.max_length,
        };
        cell.revalidate(column);
        cell
    }

    /// Re-read the column rules and re-check the stored value.
    pub fn revalidate(&mut self, column: &ColumnSchema) {
        self.is_required = column.required;
        self.max_length = column.max_length;
        match validate_cell(column, &self.value) {
            Ok(()) => self.clear_error(),
            Err(err) => self.set_error(&err),
        }
    }

    pub fn set_error(&mut self, err: &ValidationError) {
        self.is_invalid = true;
        self.error_message = Some(err.to_string());
    }

    pub fn clear_error(&mut self) {
        self.is_invalid = false;
        self.error_message = None;
    }
}

/// Locally owned, possibly unsaved working copy of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDraft {
    pub row_id: RowId,
    pub mode: RowMode,
    pub cells: Vec<CellDraft>,
    pub is_new: bool,
    /// An edit session has begun (set on entering edit mode, before any
    /// keystroke).
    pub is_dirty: bool,
    /// At least one value was actually modified during the session.
    pub(crate) changed: bool,
}

impl RowDraft {
    pub fn values(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.value.clone()).collect()
    }

    pub fn value(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(|c| c.value.as_str())
    }

    pub fn has_changes(&self) -> bool {
        self.changed
    }

    pub fn is_editing(&self) -> bool {
        self.mode == RowMode::Editing
    }

    pub fn has_invalid_cells(&self) -> bool {
        self.cells.iter().any(|c| c.is_invalid)
    }
}
