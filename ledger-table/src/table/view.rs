//! Render-ready snapshot of the table.

use crate::row::{CellDraft, RowId, RowMode};
use crate::schema::ColumnSchema;

use super::CellFocus;

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub row_id: RowId,
    pub mode: RowMode,
    pub is_new: bool,
    pub is_dirty: bool,
    /// The trailing data-entry row.
    pub is_entry: bool,
    pub cells: Vec<CellDraft>,
}

/// What the body of the table shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    /// Data rows in parent order, followed by the entry row.
    Rows(Vec<RowView>),
    /// The parent supplied a malformed row list.
    Diagnostic(String),
}

/// Everything a renderer needs to draw the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub columns: Vec<ColumnSchema>,
    pub body: TableBody,
    pub focus: Option<CellFocus>,
    pub suggestions: Option<SuggestionView>,
}

impl TableView {
    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            TableBody::Rows(rows) => rows,
            TableBody::Diagnostic(_) => &[],
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match &self.body {
            TableBody::Diagnostic(text) => Some(text),
            TableBody::Rows(_) => None,
        }
    }
}

/// The open suggestion list, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionView {
    pub target: CellFocus,
    pub items: Vec<String>,
    pub highlight: usize,
}
