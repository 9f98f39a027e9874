use crate::row::RowId;

/// The cell holding keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellFocus {
    pub row: RowId,
    pub column: usize,
}

impl CellFocus {
    pub const fn new(row: RowId, column: usize) -> Self {
        Self { row, column }
    }
}
