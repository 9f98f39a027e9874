use std::sync::Arc;

use log::{debug, trace};

use crate::geometry::Rect;
use crate::pointer::{PointerHub, PointerSubscription};
use crate::schema::ColumnSchema;
use crate::validation::{FieldError, ValidationError, ValidationResult, check_input, validate_cell};

use super::{CellDraft, IdAllocator, RowDraft, RowId, RowMode, RowSnapshot};

/// A committed row, handed to the parent for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCommit {
    pub row_id: RowId,
    pub is_new: bool,
    pub cells: Vec<String>,
}

/// A raw value change in one cell, for live recalculation in the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub row_id: RowId,
    pub column: usize,
    pub value: String,
}

/// What happened when a commit was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The row was not being edited.
    NotEditing,
    /// Edit mode was entered but no value changed.
    Unchanged,
    /// Validation failed; the row stays in edit mode.
    Invalid(ValidationResult),
    Committed(RowCommit),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// The row left edit mode or never was in it.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

/// What happened when the parent re-supplied a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The row is being edited; the draft was left alone.
    Ignored,
    /// Every cell already matched.
    Unchanged,
    Replaced,
}

/// Reconciles one row's draft against the snapshots its parent supplies.
///
/// The draft is only ever mutated through user input, or by a refresh while
/// the row is in [`RowMode::Viewing`]. Edits in progress are never clobbered
/// by an external refresh.
#[derive(Debug)]
pub struct RowReconciler {
    snapshot: RowSnapshot,
    columns: Arc<[ColumnSchema]>,
    draft: RowDraft,
    /// The trailing data-entry row owned by the table.
    synthetic: bool,
    subscription: Option<PointerSubscription<RowId>>,
}

impl RowReconciler {
    /// Create a reconciler for a parent-supplied row.
    pub fn from_snapshot(
        snapshot: RowSnapshot,
        columns: Arc<[ColumnSchema]>,
        ids: &IdAllocator,
    ) -> Self {
        // Non-positive parent ids are replaced with a table-owned one.
        let row_id = match snapshot.persisted_id() {
            Some(id) => id,
            None => ids.next_id(),
        };
        let is_new = snapshot.is_new;
        let mode = if is_new {
            RowMode::Editing
        } else {
            RowMode::Viewing
        };
        let cells = derive_cells(&snapshot, &columns);
        debug!("row {row_id}: mounted in {mode:?}");
        Self {
            snapshot,
            columns,
            draft: RowDraft {
                row_id,
                mode,
                cells,
                is_new,
                is_dirty: false,
                changed: false,
            },
            synthetic: false,
            subscription: None,
        }
    }

    /// Create the synthetic data-entry row.
    pub fn blank(columns: Arc<[ColumnSchema]>, ids: &IdAllocator) -> Self {
        let snapshot = RowSnapshot {
            id: None,
            cells: Vec::new(),
            is_new: true,
        };
        let mut row = Self::from_snapshot(snapshot, columns, ids);
        row.synthetic = true;
        row
    }

    /// Register this row with a pointer hub for click-outside detection.
    ///
    /// The subscription is released when the reconciler is dropped.
    pub fn attach(&mut self, hub: &PointerHub<RowId>) {
        self.subscription = Some(hub.subscribe(self.draft.row_id));
    }

    /// Record where the row was rendered.
    pub fn set_area(&self, area: Rect) {
        if let Some(sub) = &self.subscription {
            sub.set_bounds(area);
        }
    }

    pub fn area(&self) -> Option<Rect> {
        self.subscription.as_ref().and_then(|s| s.bounds())
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    pub fn row_id(&self) -> RowId {
        self.draft.row_id
    }

    pub fn mode(&self) -> RowMode {
        self.draft.mode
    }

    pub fn draft(&self) -> &RowDraft {
        &self.draft
    }

    pub fn snapshot(&self) -> &RowSnapshot {
        &self.snapshot
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Index of the first column the user may type into.
    pub fn first_editable_column(&self) -> Option<usize> {
        self.columns.iter().position(ColumnSchema::is_editable)
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// The user interacted with a cell. Opens an edit session.
    ///
    /// Returns true if the row switched from viewing to editing.
    pub fn begin_edit(&mut self) -> bool {
        self.draft.is_dirty = true;
        if self.draft.mode == RowMode::Editing {
            return false;
        }
        self.draft.mode = RowMode::Editing;
        self.draft.changed = false;
        debug!("row {}: Viewing -> Editing", self.draft.row_id);
        true
    }

    /// Replace a cell's value with typed input.
    ///
    /// Input that would exceed the column's max length (or is not numeric
    /// for a number column) is rejected and the stored value is kept. On
    /// success the cell is revalidated and the change is returned for the
    /// parent. `Ok(None)` means nothing changed.
    pub fn input(
        &mut self,
        column: usize,
        value: impl Into<String>,
    ) -> Result<Option<CellChange>, ValidationError> {
        let columns = Arc::clone(&self.columns);
        let Some(schema) = columns.get(column) else {
            return Ok(None);
        };
        let value = value.into();

        // A refused keystroke does not open an edit session.
        if let Err(err) = check_input(schema, &value) {
            trace!("row {}: rejected input for column {column}: {err}", self.draft.row_id);
            if let Some(cell) = self.draft.cells.get_mut(column) {
                cell.rejected = Some(err.to_string());
                self.draft.is_dirty = true;
            }
            return Err(err);
        }

        self.begin_edit();
        let Some(cell) = self.draft.cells.get_mut(column) else {
            return Ok(None);
        };
        cell.rejected = None;
        if cell.value == value {
            return Ok(None);
        }
        cell.value.clone_from(&value);
        cell.revalidate(schema);
        self.draft.changed = true;

        Ok(Some(CellChange {
            row_id: self.draft.row_id,
            column,
            value,
        }))
    }

    /// Validate and hand the draft to the parent.
    pub fn commit(&mut self) -> CommitOutcome {
        if self.draft.mode != RowMode::Editing {
            return CommitOutcome::NotEditing;
        }

        if !self.draft.changed {
            self.draft.is_dirty = false;
            if !self.draft.is_new {
                self.draft.mode = RowMode::Viewing;
                debug!("row {}: nothing changed, back to Viewing", self.draft.row_id);
            }
            return CommitOutcome::Unchanged;
        }

        let result = self.validate();
        if result.is_invalid() {
            debug!(
                "row {}: commit rejected, {} invalid cell(s)",
                self.draft.row_id,
                result.errors().len()
            );
            return CommitOutcome::Invalid(result);
        }

        self.draft.mode = RowMode::Viewing;
        self.draft.is_dirty = false;
        self.draft.changed = false;
        debug!("row {}: committed", self.draft.row_id);

        CommitOutcome::Committed(RowCommit {
            row_id: self.draft.row_id,
            is_new: self.draft.is_new,
            cells: self.draft.values(),
        })
    }

    /// Focus left the row's boundary; attempts an implicit commit.
    pub fn click_outside(&mut self) -> CommitOutcome {
        trace!("row {}: click outside", self.draft.row_id);
        self.commit()
    }

    /// Discard the draft and start over from the current snapshot.
    pub fn cancel(&mut self) {
        self.draft.cells = derive_cells(&self.snapshot, &self.columns);
        self.draft.mode = RowMode::Editing;
        self.draft.is_dirty = false;
        self.draft.changed = false;
        debug!("row {}: edits cancelled", self.draft.row_id);
    }

    /// Merge a snapshot the parent re-supplied for this row.
    pub fn refresh(&mut self, snapshot: RowSnapshot) -> RefreshOutcome {
        self.snapshot = snapshot;

        if self.draft.mode == RowMode::Editing {
            trace!("row {}: refresh ignored while editing", self.draft.row_id);
            return RefreshOutcome::Ignored;
        }

        let cells = derive_cells(&self.snapshot, &self.columns);
        let differs = cells.len() != self.draft.cells.len()
            || cells
                .iter()
                .zip(&self.draft.cells)
                .any(|(new, old)| new.value != old.value);
        if !differs {
            return RefreshOutcome::Unchanged;
        }

        self.draft.cells = cells;
        self.draft.is_new = self.snapshot.is_new;
        debug!("row {}: refreshed from parent", self.draft.row_id);
        RefreshOutcome::Replaced
    }

    /// Re-apply a (possibly mutated) column schema.
    pub fn apply_schema(&mut self, columns: Arc<[ColumnSchema]>) {
        let structural = columns.len() != self.columns.len();
        self.columns = columns;

        if structural && self.draft.mode == RowMode::Viewing {
            self.draft.cells = derive_cells(&self.snapshot, &self.columns);
            return;
        }

        if structural {
            self.draft.cells.truncate(self.columns.len());
            let start = self.draft.cells.len();
            for column in &self.columns[start..] {
                self.draft
                    .cells
                    .push(CellDraft::new(column, column.initial_value()));
            }
        }
        for (cell, column) in self.draft.cells.iter_mut().zip(self.columns.iter()) {
            cell.revalidate(column);
        }
    }

    /// Validate every cell, marking the invalid ones.
    pub fn validate(&mut self) -> ValidationResult {
        let mut errors = Vec::new();
        for (index, (cell, column)) in self
            .draft
            .cells
            .iter_mut()
            .zip(self.columns.iter())
            .enumerate()
        {
            match validate_cell(column, &cell.value) {
                Ok(()) => cell.clear_error(),
                Err(err) => {
                    cell.set_error(&err);
                    errors.push(FieldError { column: index, error: err });
                }
            }
        }
        ValidationResult::from_errors(errors)
    }

    /// Request deletion. The row stays until the parent drops its snapshot.
    pub fn delete(&self) -> RowId {
        debug!("row {}: delete requested", self.draft.row_id);
        self.draft.row_id
    }
}

/// Derive validated cells from a snapshot, one per column.
fn derive_cells(snapshot: &RowSnapshot, columns: &[ColumnSchema]) -> Vec<CellDraft> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let value = snapshot
                .cell(index)
                .map(str::to_string)
                .unwrap_or_else(|| column.initial_value());
            CellDraft::new(column, value)
        })
        .collect()
}
