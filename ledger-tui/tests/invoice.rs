use ledger_table::row::CommitOutcome;
use ledger_table::{CellFocus, Key, KeyCombo, RowId, RowMode, ValidationError};
use ledger_tui::invoice::{MAX_NUMBER_LENGTH, NOTES, QTY, SERVICE, UNIT_PRICE};
use ledger_tui::settings::{InvoiceSettings, SettingsProvider, next_invoice_number};
use ledger_tui::{InvoiceEditor, Totals};
use rust_decimal::Decimal;

fn editor() -> InvoiceEditor {
    InvoiceEditor::new(InvoiceSettings::default(), 1)
}

fn type_text(editor: &InvoiceEditor, text: &str) {
    for c in text.chars() {
        editor.table().handle_key(KeyCombo::char(c));
    }
}

fn add_line(editor: &mut InvoiceEditor, service: &str, qty: &str, price: &str) -> RowId {
    let entry = editor.table().entry_id();
    editor.table().input(entry, SERVICE, service).unwrap();
    editor.table().input(entry, QTY, qty).unwrap();
    editor.table().input(entry, UNIT_PRICE, price).unwrap();
    assert!(editor.table().commit(entry).is_committed());
    editor.pump();
    let id = editor.store().lines().last().unwrap().id;
    RowId(id)
}

fn dec(text: &str) -> Decimal {
    text.parse().unwrap()
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_new_line_from_keyboard_is_stored() {
    let mut editor = editor();
    let table = editor.table().clone();

    table.handle_key(KeyCombo::key(Key::Tab));
    type_text(&editor, "Oil change");
    table.handle_key(KeyCombo::key(Key::Tab));
    table.handle_key(KeyCombo::key(Key::Tab));
    type_text(&editor, "89.5");
    table.handle_key(KeyCombo::key(Key::Enter));
    editor.pump();

    let lines = editor.store().lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].id, 1);
    assert_eq!(lines[0].service, "Oil change");
    assert_eq!(lines[0].qty, "1");
    assert_eq!(lines[0].unit_price, "89.5");

    let ids = table.row_ids();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], RowId(1));
    assert_eq!(table.mode(RowId(1)), Some(RowMode::Viewing));
    assert_eq!(ids[1], table.entry_id());
    assert_eq!(table.focus(), Some(CellFocus::new(table.entry_id(), SERVICE)));
    assert_eq!(editor.status(), Some("Saved line 1"));
}

#[test]
fn test_invalid_line_never_reaches_store() {
    let mut editor = editor();
    let entry = editor.table().entry_id();
    editor.table().input(entry, SERVICE, "Tyre fitting").unwrap();

    assert!(matches!(
        editor.table().commit(entry),
        CommitOutcome::Invalid(_)
    ));
    editor.pump();
    assert!(editor.store().lines().is_empty());
    assert_eq!(editor.table().entry_id(), entry);
}

#[test]
fn test_editing_a_line_updates_store() {
    let mut editor = editor();
    let id = add_line(&mut editor, "Oil change", "1", "89.5");

    editor.table().input(id, UNIT_PRICE, "95").unwrap();
    editor.table().input(id, NOTES, "Synthetic\n5W-30").unwrap();
    assert!(editor.table().commit(id).is_committed());
    editor.pump();

    let line = editor.store().get(id.get()).unwrap();
    assert_eq!(line.unit_price, "95");
    assert_eq!(line.notes, "Synthetic\n5W-30");
    assert_eq!(editor.store().lines().len(), 1);
    assert_eq!(editor.table().mode(id), Some(RowMode::Viewing));
}

#[test]
fn test_delete_removes_line_and_row() {
    let mut editor = editor();
    let first = add_line(&mut editor, "Oil change", "1", "89.5");
    let second = add_line(&mut editor, "Wiper blades", "2", "15");

    editor.table().set_focus(Some(CellFocus::new(first, SERVICE)));
    editor.table().handle_key(KeyCombo::char('d').ctrl());
    editor.pump();

    assert!(editor.store().get(first.get()).is_none());
    assert_eq!(
        editor.table().row_ids(),
        vec![second, editor.table().entry_id()]
    );
    assert_eq!(editor.table().focus(), None);
}

// ============================================================================
// Totals
// ============================================================================

#[test]
fn test_totals_follow_committed_lines() {
    let mut editor = editor();
    add_line(&mut editor, "Oil change", "1", "89.5");
    add_line(&mut editor, "Wiper blades", "2", "15");

    assert_eq!(
        editor.totals(),
        Totals {
            subtotal: dec("119.50"),
            tax: dec("25.10"),
            total: dec("144.60"),
        }
    );
    assert_eq!(editor.money(editor.totals().total), "€144.60");
}

#[test]
fn test_totals_preview_uncommitted_changes() {
    let mut editor = editor();
    let id = add_line(&mut editor, "Oil change", "1", "89.5");

    editor.table().input(id, QTY, "2").unwrap();
    let entry = editor.table().entry_id();
    editor.table().input(entry, UNIT_PRICE, "10").unwrap();
    editor.pump();
    // 2 x 89.5 + 1 x 10
    assert_eq!(editor.totals().subtotal, dec("189.00"));

    editor.table().cancel(id);
    editor.table().cancel(entry);
    editor.pump();
    assert_eq!(editor.totals().subtotal, dec("89.50"));
}

#[test]
fn test_unparsable_values_are_ignored_in_preview() {
    let mut editor = editor();
    add_line(&mut editor, "Oil change", "1", "89.5");

    let entry = editor.table().entry_id();
    editor.table().input(entry, UNIT_PRICE, "-").unwrap();
    editor.pump();
    assert_eq!(editor.totals().subtotal, dec("89.50"));
}

#[test]
fn test_oversized_amounts_are_refused_and_totals_stay_finite() {
    let mut editor = editor();
    let entry = editor.table().entry_id();
    let huge = "9".repeat(28);

    assert!(matches!(
        editor.table().input(entry, UNIT_PRICE, huge.as_str()),
        Err(ValidationError::TooLong { max, .. }) if max == MAX_NUMBER_LENGTH
    ));
    editor.pump();
    assert_eq!(editor.totals().subtotal, Decimal::ZERO);

    let widest = "9".repeat(MAX_NUMBER_LENGTH);
    add_line(&mut editor, "Fleet contract", &widest, &widest);
    add_line(&mut editor, "Fleet contract", &widest, &widest);
    let totals = editor.totals();
    assert!(totals.subtotal > Decimal::ZERO);
    assert_eq!(totals.total, totals.subtotal + totals.tax);
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_editor_uses_loaded_settings() {
    let provider = SettingsProvider::in_memory();
    let settings = InvoiceSettings {
        company_name: "Corner Garage".into(),
        currency_symbol: "$".into(),
        tax_rate: Decimal::new(10, 0),
    };
    settings.save(&provider).await.unwrap();
    let number = next_invoice_number(&provider).await.unwrap();

    let mut editor = InvoiceEditor::new(InvoiceSettings::load(&provider).await.unwrap(), number);
    add_line(&mut editor, "Diagnostics", "1", "50");

    assert_eq!(editor.number(), 1);
    assert_eq!(editor.settings().company_name, "Corner Garage");
    assert_eq!(editor.money(editor.totals().tax), "$5.00");
}
