use std::sync::Arc;

use ledger_table::row::{CommitOutcome, RefreshOutcome};
use ledger_table::{
    ColumnSchema, IdAllocator, RowId, RowMode, RowReconciler, RowSnapshot, ValidationError,
};

fn invoice_columns() -> Arc<[ColumnSchema]> {
    Arc::from(vec![
        ColumnSchema::text("Desc").required().max_length(20),
        ColumnSchema::number("Price").required(),
    ])
}

fn existing_row(ids: &IdAllocator) -> RowReconciler {
    RowReconciler::from_snapshot(
        RowSnapshot::saved(5, ["Tyre rotation", "40"]),
        invoice_columns(),
        ids,
    )
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn test_draft_matches_snapshot_and_schema() {
    let ids = IdAllocator::new();
    let columns: Arc<[ColumnSchema]> = Arc::from(vec![
        ColumnSchema::text("A"),
        ColumnSchema::text("B").default_value("b"),
        ColumnSchema::text("C"),
    ]);
    let snapshot = RowSnapshot {
        id: Some(9),
        cells: vec![Some("a".into()), None],
        is_new: false,
    };
    let row = RowReconciler::from_snapshot(snapshot, columns, &ids);

    assert_eq!(row.draft().cells.len(), 3);
    assert_eq!(row.draft().values(), vec!["a", "b", ""]);
    assert_eq!(row.mode(), RowMode::Viewing);
}

#[test]
fn test_non_positive_parent_id_gets_table_owned_id() {
    let ids = IdAllocator::new();
    let entry = RowReconciler::blank(invoice_columns(), &ids);
    let pending = RowReconciler::from_snapshot(
        RowSnapshot::saved(-1, ["Pending brake job", "120"]),
        invoice_columns(),
        &ids,
    );
    assert_ne!(pending.row_id(), entry.row_id());
    assert!(!pending.row_id().is_persisted());
    assert_eq!(pending.draft().value(0), Some("Pending brake job"));
}

#[test]
fn test_extra_snapshot_cells_are_ignored() {
    let ids = IdAllocator::new();
    let row = RowReconciler::from_snapshot(
        RowSnapshot::saved(1, ["Brakes", "120", "surplus"]),
        invoice_columns(),
        &ids,
    );
    assert_eq!(row.draft().values(), vec!["Brakes", "120"]);
}

#[test]
fn test_flagged_new_row_starts_editing() {
    let ids = IdAllocator::new();
    let row = RowReconciler::from_snapshot(
        RowSnapshot::unsaved(["", ""]).flagged_new(),
        invoice_columns(),
        &ids,
    );
    assert_eq!(row.mode(), RowMode::Editing);
    assert_eq!(row.row_id(), RowId(-1));
    assert!(row.draft().is_new);
}

#[test]
fn test_required_empty_cell_is_marked_invalid() {
    let ids = IdAllocator::new();
    let row = RowReconciler::blank(invoice_columns(), &ids);
    let cell = &row.draft().cells[0];
    assert!(cell.is_invalid);
    assert!(cell.is_required);
    assert_eq!(cell.error_message.as_deref(), Some("Desc is required"));
}

// ============================================================================
// Editing and commit
// ============================================================================

#[test]
fn test_click_then_commit_without_changes_emits_nothing() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);

    assert!(row.begin_edit());
    assert_eq!(row.mode(), RowMode::Editing);
    assert!(row.draft().is_dirty);
    assert!(!row.draft().has_changes());

    assert_eq!(row.commit(), CommitOutcome::Unchanged);
    assert_eq!(row.mode(), RowMode::Viewing);
    assert!(!row.draft().is_dirty);
}

#[test]
fn test_commit_when_viewing_is_noop() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    assert_eq!(row.commit(), CommitOutcome::NotEditing);
    assert_eq!(row.click_outside(), CommitOutcome::NotEditing);
}

#[test]
fn test_commit_with_empty_required_cell_stays_editing() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    row.input(0, "").unwrap();

    let outcome = row.commit();
    let CommitOutcome::Invalid(result) = outcome else {
        panic!("expected invalid commit, got {outcome:?}");
    };
    assert_eq!(result.first_invalid_column(), Some(0));
    assert_eq!(row.mode(), RowMode::Editing);
    let cell = &row.draft().cells[0];
    assert!(cell.is_invalid);
    assert!(cell.error_message.as_deref().is_some_and(|m| !m.is_empty()));
}

#[test]
fn test_valid_commit_returns_to_viewing() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    let change = row.input(1, "45").unwrap().unwrap();
    assert_eq!(change.row_id, RowId(5));
    assert_eq!(change.value, "45");

    let CommitOutcome::Committed(commit) = row.commit() else {
        panic!("expected commit");
    };
    assert_eq!(commit.row_id, RowId(5));
    assert!(!commit.is_new);
    assert_eq!(commit.cells, vec!["Tyre rotation", "45"]);
    assert_eq!(row.mode(), RowMode::Viewing);
    assert!(!row.draft().is_dirty);
}

#[test]
fn test_too_long_input_is_rejected_not_truncated() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    let err = row.input(0, "A very long description indeed").unwrap_err();
    assert_eq!(
        err,
        ValidationError::TooLong {
            column: "Desc".into(),
            max: 20
        }
    );
    assert_eq!(row.draft().value(0), Some("Tyre rotation"));
    let cell = &row.draft().cells[0];
    assert!(cell.rejected.is_some());
    assert!(!cell.is_invalid);
    assert_eq!(cell.error_message, None);
    assert!(!row.draft().has_changes());
    assert_eq!(row.mode(), RowMode::Viewing);
}

#[test]
fn test_accepted_input_clears_rejection() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    assert!(row.input(1, "4o").is_err());
    assert!(row.draft().cells[1].rejected.is_some());

    row.input(1, "45").unwrap();
    let cell = &row.draft().cells[1];
    assert_eq!(cell.rejected, None);
    assert_eq!(cell.value, "45");
    assert_eq!(row.mode(), RowMode::Editing);
}

#[test]
fn test_non_numeric_input_is_rejected() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    assert!(row.input(1, "4o").is_err());
    assert_eq!(row.draft().value(1), Some("40"));
}

#[test]
fn test_read_only_column_refuses_input() {
    let ids = IdAllocator::new();
    let columns: Arc<[ColumnSchema]> = Arc::from(vec![ColumnSchema::text("Code").read_only()]);
    let mut row = RowReconciler::from_snapshot(RowSnapshot::saved(1, ["X1"]), columns, &ids);
    assert!(matches!(
        row.input(0, "X2"),
        Err(ValidationError::ReadOnly { .. })
    ));
    assert_eq!(row.first_editable_column(), None);
}

#[test]
fn test_cancel_rederives_from_snapshot() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    row.input(0, "Alignment").unwrap();
    row.cancel();

    assert_eq!(row.draft().values(), vec!["Tyre rotation", "40"]);
    assert_eq!(row.mode(), RowMode::Editing);
    assert!(!row.draft().has_changes());
}

// ============================================================================
// External refresh
// ============================================================================

#[test]
fn test_refresh_ignored_while_editing() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    row.input(1, "50").unwrap();
    let before = row.draft().clone();

    let outcome = row.refresh(RowSnapshot::saved(5, ["Tyre rotation", "42"]));
    assert_eq!(outcome, RefreshOutcome::Ignored);
    assert_eq!(row.draft(), &before);

    // The snapshot is still recorded: cancelling picks it up.
    row.cancel();
    assert_eq!(row.draft().value(1), Some("42"));
}

#[test]
fn test_identical_refresh_does_not_touch_draft() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    let before = row.draft().clone();

    let outcome = row.refresh(RowSnapshot::saved(5, ["Tyre rotation", "40"]));
    assert_eq!(outcome, RefreshOutcome::Unchanged);
    assert_eq!(row.draft(), &before);
}

#[test]
fn test_changed_refresh_replaces_cells_when_viewing() {
    let ids = IdAllocator::new();
    let mut row = existing_row(&ids);
    let outcome = row.refresh(RowSnapshot::saved(5, ["Tyre rotation", "42.50"]));
    assert_eq!(outcome, RefreshOutcome::Replaced);
    assert_eq!(row.draft().value(1), Some("42.50"));
}

// ============================================================================
// Schema propagation
// ============================================================================

#[test]
fn test_schema_rules_reach_existing_cells() {
    let ids = IdAllocator::new();
    let mut row = RowReconciler::from_snapshot(
        RowSnapshot::saved(2, ["", "10"]),
        Arc::from(vec![ColumnSchema::text("Desc"), ColumnSchema::number("Price")]),
        &ids,
    );
    assert!(!row.draft().cells[0].is_invalid);

    row.apply_schema(invoice_columns());
    let cell = &row.draft().cells[0];
    assert!(cell.is_required);
    assert!(cell.is_invalid);
    assert_eq!(cell.max_length, Some(20));
}
