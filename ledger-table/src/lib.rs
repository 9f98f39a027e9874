//! Headless editable table for invoice line items.
//!
//! The table keeps one [`RowReconciler`](row::RowReconciler) per row supplied by
//! the parent, plus a trailing synthetic row used for data entry. Drafts are
//! edited locally and committed upward as events; the parent persists them and
//! supplies fresh [`RowSnapshot`](row::RowSnapshot)s.

pub mod config;
pub mod geometry;
pub mod keys;
pub mod pointer;
pub mod row;
pub mod schema;
pub mod suggest;
pub mod table;
pub mod validation;

pub use config::TableConfig;
pub use geometry::Rect;
pub use keys::{Key, KeyCombo, Modifiers};
pub use pointer::{ClickRouting, PointerHub, PointerSubscription};
pub use row::{CellDraft, IdAllocator, RowDraft, RowId, RowMode, RowReconciler, RowSnapshot};
pub use schema::{ColumnSchema, DataKind, TextAlign};
pub use suggest::SuggestionList;
pub use table::{
    CellFocus, EditableTable, EventResult, MalformedRows, RowCommit, RowView, TableBody,
    TableEvent, TableId, TableListener, TableView,
};
pub use validation::{FieldError, ValidationError, ValidationResult};

pub mod prelude {
    pub use crate::keys::{Key, KeyCombo, Modifiers};
    pub use crate::row::{RowId, RowMode, RowSnapshot};
    pub use crate::schema::{ColumnSchema, DataKind, TextAlign};
    pub use crate::table::{EditableTable, TableEvent, TableListener};
    pub use crate::TableConfig;
}
