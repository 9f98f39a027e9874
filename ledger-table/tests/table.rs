use ledger_table::row::CommitOutcome;
use ledger_table::{
    CellFocus, ColumnSchema, EditableTable, EventResult, IdAllocator, Key, KeyCombo, PointerHub,
    Rect, RowCommit, RowId, RowMode, RowSnapshot, TableConfig, TableEvent, TableListener,
};
use serde_json::json;

fn columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::text("Desc").required(),
        ColumnSchema::number("Price").required(),
    ]
}

fn type_text(table: &EditableTable, text: &str) {
    for c in text.chars() {
        assert_eq!(table.handle_key(KeyCombo::char(c)), EventResult::Consumed);
    }
}

fn commits(events: &[TableEvent]) -> Vec<RowCommit> {
    events
        .iter()
        .filter_map(|e| match e {
            TableEvent::RowCommitted(row) => Some(row.clone()),
            _ => None,
        })
        .collect()
}

#[derive(Default)]
struct Recorder {
    committed: Vec<RowCommit>,
    deleted: Vec<RowId>,
    changes: Vec<(RowId, usize, String)>,
}

impl TableListener for Recorder {
    fn on_row_committed(&mut self, row: &RowCommit) {
        self.committed.push(row.clone());
    }

    fn on_row_deleted(&mut self, row_id: RowId) {
        self.deleted.push(row_id);
    }

    fn on_cell_changed(&mut self, row_id: RowId, column: usize, value: &str) {
        self.changes.push((row_id, column, value.to_string()));
    }
}

// ============================================================================
// Entry row
// ============================================================================

#[test]
fn test_new_row_entry_by_keyboard() {
    let table = EditableTable::new(columns());
    table.set_rows(Vec::new());
    let entry = table.entry_id();
    assert!(entry.get() < 0);

    let draft = table.draft(entry).unwrap();
    assert_eq!(draft.values(), vec!["", ""]);
    assert_eq!(draft.mode, RowMode::Editing);

    table.handle_key(KeyCombo::key(Key::Tab));
    assert_eq!(table.focus(), Some(CellFocus::new(entry, 0)));
    type_text(&table, "Oil change");
    table.handle_key(KeyCombo::key(Key::Tab));
    type_text(&table, "89.5");
    table.handle_key(KeyCombo::key(Key::Enter));

    let events = table.drain_events();
    assert_eq!(
        commits(&events),
        vec![RowCommit {
            row_id: entry,
            is_new: true,
            cells: vec!["Oil change".into(), "89.5".into()],
        }]
    );

    let fresh = table.entry_id();
    assert_ne!(fresh, entry);
    assert!(fresh.get() < 0);
    assert_eq!(table.draft(fresh).unwrap().values(), vec!["", ""]);
    assert_eq!(table.mode(fresh), Some(RowMode::Editing));
    assert_eq!(table.focus(), Some(CellFocus::new(fresh, 0)));
}

#[test]
fn test_entry_row_commit_rejected_while_invalid() {
    let table = EditableTable::new(columns());
    let entry = table.entry_id();
    table.input(entry, 0, "Oil change").unwrap();

    assert!(matches!(table.commit(entry), CommitOutcome::Invalid(_)));
    assert_eq!(table.entry_id(), entry);
    let draft = table.draft(entry).unwrap();
    assert!(draft.cells[1].is_invalid);
    assert!(commits(&table.drain_events()).is_empty());
}

#[test]
fn test_deleting_entry_row_clears_it() {
    let table = EditableTable::new(columns());
    let entry = table.entry_id();
    table.input(entry, 0, "Wipers").unwrap();
    assert!(!table.delete(entry));
    assert_eq!(table.draft(entry).unwrap().value(0), Some(""));
}

// ============================================================================
// Existing rows
// ============================================================================

#[test]
fn test_commit_key_without_changes_is_noop() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
    table.drain_events();

    table.set_focus(Some(CellFocus::new(RowId(5), 0)));
    let draft = table.draft(RowId(5)).unwrap();
    assert_eq!(draft.mode, RowMode::Editing);
    assert!(draft.is_dirty);

    table.handle_key(KeyCombo::key(Key::Enter));
    assert!(commits(&table.drain_events()).is_empty());
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Viewing));
}

#[test]
fn test_commit_advances_focus_to_next_row() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
        RowSnapshot::saved(2, ["Tyre rotation", "40"]),
    ]);
    table.set_focus(Some(CellFocus::new(RowId(1), 1)));
    table.handle_key(KeyCombo::key(Key::Backspace));
    type_text(&table, "9");
    table.handle_key(KeyCombo::key(Key::Enter));

    let events = table.drain_events();
    assert_eq!(commits(&events)[0].cells, vec!["Oil change", "89.9"]);
    assert_eq!(table.focus(), Some(CellFocus::new(RowId(2), 0)));
    assert_eq!(table.mode(RowId(1)), Some(RowMode::Viewing));
    assert_eq!(table.mode(RowId(2)), Some(RowMode::Editing));
}

#[test]
fn test_stay_on_commit_config() {
    let table = EditableTable::with_config(columns(), TableConfig::new().stay_on_commit());
    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
        RowSnapshot::saved(2, ["Tyre rotation", "40"]),
    ]);
    table.set_focus(Some(CellFocus::new(RowId(1), 0)));
    type_text(&table, "s");
    table.handle_key(KeyCombo::key(Key::Enter));
    assert_eq!(table.focus(), Some(CellFocus::new(RowId(1), 0)));
}

#[test]
fn test_rejected_keystroke_keeps_committed_row_viewing() {
    let table = EditableTable::with_config(columns(), TableConfig::new().stay_on_commit());
    table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
    table.set_focus(Some(CellFocus::new(RowId(5), 1)));
    type_text(&table, "5");
    table.handle_key(KeyCombo::key(Key::Enter));
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Viewing));

    type_text(&table, "x");
    let draft = table.draft(RowId(5)).unwrap();
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Viewing));
    assert_eq!(draft.value(1), Some("405"));
    assert!(draft.cells[1].rejected.is_some());
    assert!(!draft.cells[1].is_invalid);
}

#[test]
fn test_escape_cancels_edits() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
    table.set_focus(Some(CellFocus::new(RowId(5), 1)));
    type_text(&table, "0");
    assert_eq!(table.draft(RowId(5)).unwrap().value(1), Some("400"));

    table.handle_key(KeyCombo::key(Key::Escape));
    assert_eq!(table.draft(RowId(5)).unwrap().value(1), Some("40"));
}

#[test]
fn test_moving_to_another_row_commits_implicitly() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
        RowSnapshot::saved(2, ["Tyre rotation", "40"]),
    ]);
    table.set_focus(Some(CellFocus::new(RowId(1), 0)));
    type_text(&table, "!");
    table.handle_key(KeyCombo::key(Key::Down));

    let committed = commits(&table.drain_events());
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].row_id, RowId(1));
    assert_eq!(table.focus(), Some(CellFocus::new(RowId(2), 0)));
}

#[test]
fn test_shift_enter_inserts_line_break_in_multiline() {
    let table = EditableTable::new(vec![ColumnSchema::multiline("Notes")]);
    let entry = table.entry_id();
    table.set_focus(Some(CellFocus::new(entry, 0)));
    type_text(&table, "a");
    table.handle_key(KeyCombo::key(Key::Enter).shift());
    type_text(&table, "b");
    assert_eq!(table.draft(entry).unwrap().value(0), Some("a\nb"));
}

#[test]
fn test_delete_request_keeps_row_until_parent_drops_it() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
    table.set_focus(Some(CellFocus::new(RowId(5), 0)));
    table.handle_key(KeyCombo::char('d').ctrl());

    let mut recorder = Recorder::default();
    table.dispatch(&mut recorder);
    assert_eq!(recorder.deleted, vec![RowId(5)]);
    assert!(table.draft(RowId(5)).is_some());

    table.set_rows(Vec::new());
    assert!(table.draft(RowId(5)).is_none());
    assert_eq!(table.row_ids(), vec![table.entry_id()]);
    assert_eq!(table.focus(), None);
}

#[test]
fn test_listener_receives_live_changes() {
    let table = EditableTable::new(columns());
    let entry = table.entry_id();
    table.input(entry, 1, "12").unwrap();
    table.input(entry, 1, "12").unwrap();

    let mut recorder = Recorder::default();
    assert_eq!(table.dispatch(&mut recorder), 1);
    assert_eq!(recorder.changes, vec![(entry, 1, "12".to_string())]);
    assert!(recorder.committed.is_empty());
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_row_identity_survives_rerender() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
        RowSnapshot::saved(2, ["Tyre rotation", "40"]),
    ]);
    table.input(RowId(2), 0, "Tyre swap").unwrap();

    // Unrelated parent refresh, rows reordered.
    table.set_rows(vec![
        RowSnapshot::saved(2, ["Tyre rotation", "40"]),
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
    ]);
    assert_eq!(table.row_ids()[..2], [RowId(2), RowId(1)]);
    assert_eq!(table.draft(RowId(2)).unwrap().value(0), Some("Tyre swap"));
}

#[test]
fn test_refresh_updates_viewing_rows_only() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
        RowSnapshot::saved(2, ["Tyre rotation", "40"]),
    ]);
    table.begin_edit(RowId(1));
    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "99"]),
        RowSnapshot::saved(2, ["Tyre rotation", "45"]),
    ]);
    assert_eq!(table.draft(RowId(1)).unwrap().value(1), Some("89.5"));
    assert_eq!(table.draft(RowId(2)).unwrap().value(1), Some("45"));
}

#[test]
fn test_idless_rows_keyed_by_position() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::unsaved(["Draft line", "1"])]);
    let first = table.row_ids()[0];
    assert!(first.get() < 0);

    table.set_rows(vec![RowSnapshot::unsaved(["Draft line", "2"])]);
    assert_eq!(table.row_ids()[0], first);
    assert_eq!(table.draft(first).unwrap().value(1), Some("2"));
}

#[test]
fn test_negative_parent_id_does_not_shadow_entry_row() {
    let table = EditableTable::new(columns());
    let entry = table.entry_id();
    table.set_rows(vec![RowSnapshot::saved(-1, ["Pending brake job", "120"])]);

    let ids = table.row_ids();
    assert_eq!(ids.len(), 2);
    let pending = ids[0];
    assert_ne!(pending, entry);
    assert!(!pending.is_persisted());
    assert_eq!(table.draft(pending).unwrap().value(0), Some("Pending brake job"));
    assert_eq!(table.draft(entry).unwrap().value(0), Some(""));

    table.input(pending, 1, "125").unwrap();
    assert!(table.commit(pending).is_committed());
    let committed = commits(&table.drain_events());
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].row_id, pending);
    assert_eq!(committed[0].cells, vec!["Pending brake job", "125"]);

    table.set_rows(vec![RowSnapshot::saved(-1, ["Pending brake job", "125"])]);
    assert_eq!(table.row_ids()[0], pending);
    assert_eq!(table.entry_id(), entry);
}

#[test]
fn test_removed_rows_release_pointer_subscriptions() {
    let hub = PointerHub::new();
    let table = EditableTable::new(columns()).with_pointer_hub(hub.clone(), IdAllocator::new());
    assert_eq!(hub.listener_count(), 1);

    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
        RowSnapshot::saved(2, ["Tyre rotation", "40"]),
    ]);
    assert_eq!(hub.listener_count(), 3);

    table.set_rows(vec![RowSnapshot::saved(2, ["Tyre rotation", "40"])]);
    assert_eq!(hub.listener_count(), 2);

    drop(table);
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn test_schema_change_reaches_drafts() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(1, ["Oil change", "89.5"])]);

    let mut changed = columns();
    changed[0] = ColumnSchema::text("Desc").max_length(4);
    table.set_columns(changed);

    let cell = table.draft(RowId(1)).unwrap().cells[0].clone();
    assert!(!cell.is_required);
    assert_eq!(cell.max_length, Some(4));
    assert!(cell.is_invalid);
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_malformed_payload_renders_diagnostic() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(1, ["Oil change", "89.5"])]);

    table.set_rows_value(&json!({"rows": "nope"}));
    let view = table.view();
    assert!(view.rows().is_empty());
    assert!(view.diagnostic().is_some_and(|d| d.contains("expected an array")));
    assert!(table.row_ids().is_empty());

    table.set_rows_value(&json!([{"id": 1, "cells": ["Oil change", 89.5]}]));
    let view = table.view();
    assert!(view.diagnostic().is_none());
    assert_eq!(view.rows().len(), 2);
    assert_eq!(view.rows()[0].cells[1].value, "89.5");
    assert!(view.rows()[1].is_entry);
}

#[test]
fn test_view_changes_only_with_table_state() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(1, ["Oil change", "89.5"])]);
    let before = table.view();
    assert_eq!(before, table.view());
    assert_eq!(before.columns, columns());

    table.input(RowId(1), 1, "90").unwrap();
    assert_ne!(before, table.view());
}

#[test]
fn test_duplicate_ids_are_malformed() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
        RowSnapshot::saved(1, ["Oil change", "89.5"]),
    ]);
    assert!(table.diagnostic().is_some());
    assert!(table.view().rows().is_empty());
}

// ============================================================================
// Pointer
// ============================================================================

#[test]
fn test_click_outside_commits_editing_row() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
    let entry = table.entry_id();
    table.set_row_area(RowId(5), Rect::new(0, 1, 24, 1));
    table.set_row_area(entry, Rect::new(0, 2, 24, 1));

    assert_eq!(table.handle_click(13, 1), EventResult::Consumed);
    assert_eq!(table.focus(), Some(CellFocus::new(RowId(5), 1)));
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Editing));
    table.input(RowId(5), 1, "45").unwrap();

    assert_eq!(table.handle_click(60, 20), EventResult::Ignored);
    let committed = commits(&table.drain_events());
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].cells, vec!["Tyre rotation", "45"]);
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Viewing));
    assert_eq!(table.focus(), None);
    // The untouched entry row stays ready for input.
    assert_eq!(table.mode(entry), Some(RowMode::Editing));
}

#[test]
fn test_clicking_focused_cell_of_committed_row_reopens_it() {
    let table = EditableTable::with_config(columns(), TableConfig::new().stay_on_commit());
    table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
    table.set_row_area(RowId(5), Rect::new(0, 0, 24, 1));

    table.handle_click(1, 0);
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Editing));
    type_text(&table, "s");
    table.handle_key(KeyCombo::key(Key::Enter));
    assert_eq!(commits(&table.drain_events()).len(), 1);
    assert_eq!(table.focus(), Some(CellFocus::new(RowId(5), 0)));
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Viewing));

    assert_eq!(table.handle_click(1, 0), EventResult::Consumed);
    assert_eq!(table.focus(), Some(CellFocus::new(RowId(5), 0)));
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Editing));
}

#[test]
fn test_click_outside_with_invalid_row_keeps_editing() {
    let table = EditableTable::new(columns());
    table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
    table.set_row_area(RowId(5), Rect::new(0, 1, 24, 1));
    table.handle_click(1, 1);
    table.input(RowId(5), 0, "").unwrap();

    table.handle_click(60, 20);
    assert_eq!(table.mode(RowId(5)), Some(RowMode::Editing));
    assert!(table.draft(RowId(5)).unwrap().cells[0].is_invalid);
}
