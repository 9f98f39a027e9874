//! Events the table emits for its parent.
//!
//! Every event is a fire-and-forget notification: the table expects no
//! return value and does no error handling on the parent's behalf.

use crate::row::{RowCommit, RowId};

use super::CellFocus;

/// A notification queued for the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A cell's raw value changed while editing.
    CellChanged {
        row_id: RowId,
        column: usize,
        value: String,
    },
    /// A row passed validation and should be persisted.
    RowCommitted(RowCommit),
    /// The user asked for a row to be removed.
    RowDeleted { row_id: RowId },
    /// Keyboard focus moved (or was cleared).
    FocusMoved(Option<CellFocus>),
}

/// Callbacks implemented by the table's parent.
///
/// The parent owns persistence: after handling a commit or delete it should
/// re-supply the row list with [`EditableTable::set_rows`](super::EditableTable::set_rows).
pub trait TableListener {
    fn on_row_committed(&mut self, row: &RowCommit);

    fn on_row_deleted(&mut self, row_id: RowId);

    fn on_cell_changed(&mut self, row_id: RowId, column: usize, value: &str);

    fn on_focus_moved(&mut self, _focus: Option<CellFocus>) {}
}

impl TableEvent {
    /// Deliver this event to a listener.
    pub fn dispatch<L: TableListener + ?Sized>(&self, listener: &mut L) {
        match self {
            Self::CellChanged {
                row_id,
                column,
                value,
            } => listener.on_cell_changed(*row_id, *column, value),
            Self::RowCommitted(row) => listener.on_row_committed(row),
            Self::RowDeleted { row_id } => listener.on_row_deleted(*row_id),
            Self::FocusMoved(focus) => listener.on_focus_moved(*focus),
        }
    }
}

/// Result of handling an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was ignored, try other handlers.
    Ignored,
    /// Event was consumed, stop propagation.
    Consumed,
}

impl EventResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Consumed)
    }
}
