//! The invoice services editor: parent of the line-item table.
//!
//! Owns the persisted service lines, turns table commits and delete requests
//! into store mutations, re-supplies row snapshots afterwards, and keeps a
//! live totals preview from cell changes that have not been committed yet.

use std::collections::HashMap;

use ledger_table::{
    ColumnSchema, EditableTable, RowCommit, RowId, RowSnapshot, TableListener,
};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::settings::InvoiceSettings;

pub const SERVICE: usize = 0;
pub const QTY: usize = 1;
pub const UNIT_PRICE: usize = 2;
pub const NOTES: usize = 3;

/// Services offered as suggestions in the Service column.
pub const CATALOGUE: &[&str] = &[
    "Oil change",
    "Oil filter",
    "Air filter",
    "Cabin filter",
    "Brake pads (front)",
    "Brake pads (rear)",
    "Brake fluid flush",
    "Coolant flush",
    "Tyre rotation",
    "Tyre fitting",
    "Wheel alignment",
    "Battery replacement",
    "Spark plugs",
    "Timing belt",
    "Wiper blades",
    "Diagnostics",
    "MOT inspection",
    "Air conditioning recharge",
];

/// Longest quantity or price a cell accepts.
pub const MAX_NUMBER_LENGTH: usize = 12;

/// Column layout of the services table.
pub fn columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::text("Service")
            .required()
            .max_length(60)
            .width(28)
            .suggestions(CATALOGUE.iter().copied()),
        ColumnSchema::number("Qty")
            .required()
            .max_length(MAX_NUMBER_LENGTH)
            .default_value("1")
            .width(6),
        ColumnSchema::number("Unit price")
            .required()
            .max_length(MAX_NUMBER_LENGTH)
            .width(12),
        ColumnSchema::multiline("Notes").max_length(200).width(30),
    ]
}

/// Quantity times unit price. `None` if either does not parse.
pub fn line_amount(qty: &str, unit_price: &str) -> Option<Decimal> {
    let qty: Decimal = qty.trim().parse().ok()?;
    let price: Decimal = unit_price.trim().parse().ok()?;
    qty.checked_mul(price)
}

fn cell(cells: &[String], index: usize) -> String {
    cells.get(index).cloned().unwrap_or_default()
}

// -----------------------------------------------------------------------------
// Store
// -----------------------------------------------------------------------------

/// A persisted invoice line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLine {
    pub id: i64,
    pub service: String,
    pub qty: String,
    pub unit_price: String,
    pub notes: String,
}

impl ServiceLine {
    fn from_cells(id: i64, cells: &[String]) -> Self {
        Self {
            id,
            service: cell(cells, SERVICE),
            qty: cell(cells, QTY),
            unit_price: cell(cells, UNIT_PRICE),
            notes: cell(cells, NOTES),
        }
    }

    pub fn amount(&self) -> Option<Decimal> {
        line_amount(&self.qty, &self.unit_price)
    }

    pub fn snapshot(&self) -> RowSnapshot {
        RowSnapshot::saved(
            self.id,
            [
                self.service.as_str(),
                self.qty.as_str(),
                self.unit_price.as_str(),
                self.notes.as_str(),
            ],
        )
    }
}

/// In-process persistence for service lines. Ids are positive and never
/// reused.
#[derive(Debug, Default)]
pub struct LineStore {
    last_id: i64,
    lines: Vec<ServiceLine>,
}

impl LineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cells: &[String]) -> i64 {
        self.last_id += 1;
        self.lines.push(ServiceLine::from_cells(self.last_id, cells));
        self.last_id
    }

    /// Returns false if no line has this id.
    pub fn update(&mut self, id: i64, cells: &[String]) -> bool {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                *line = ServiceLine::from_cells(id, cells);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        self.lines.len() != before
    }

    pub fn get(&self, id: i64) -> Option<&ServiceLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn lines(&self) -> &[ServiceLine] {
        &self.lines
    }

    pub fn snapshots(&self) -> Vec<RowSnapshot> {
        self.lines.iter().map(ServiceLine::snapshot).collect()
    }
}

// -----------------------------------------------------------------------------
// Totals
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Sum line amounts and apply `tax_rate` (percent), rounded to cents.
    ///
    /// Arithmetic saturates at the decimal range instead of overflowing.
    pub fn compute(amounts: impl IntoIterator<Item = Decimal>, tax_rate: Decimal) -> Self {
        let subtotal = amounts
            .into_iter()
            .fold(Decimal::ZERO, |sum, amount| sum.saturating_add(amount))
            .round_dp(2);
        let tax = subtotal
            .saturating_mul(tax_rate)
            .checked_div(Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        Self {
            subtotal,
            tax,
            total: subtotal.saturating_add(tax),
        }
    }
}

// -----------------------------------------------------------------------------
// Editor
// -----------------------------------------------------------------------------

pub struct InvoiceEditor {
    number: u32,
    settings: InvoiceSettings,
    table: EditableTable,
    store: LineStore,
    /// Uncommitted cell values per row, fed by cell-change events.
    pending: HashMap<RowId, Vec<String>>,
    totals: Totals,
    rows_changed: bool,
    status: Option<String>,
}

impl InvoiceEditor {
    pub fn new(settings: InvoiceSettings, number: u32) -> Self {
        let table = EditableTable::new(columns());
        table.set_rows(Vec::new());
        Self {
            number,
            settings,
            table,
            store: LineStore::new(),
            pending: HashMap::new(),
            totals: Totals::default(),
            rows_changed: false,
            status: None,
        }
    }

    pub fn table(&self) -> &EditableTable {
        &self.table
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    pub fn settings(&self) -> &InvoiceSettings {
        &self.settings
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Format an amount with the configured currency symbol.
    pub fn money(&self, amount: Decimal) -> String {
        format!("{}{:.2}", self.settings.currency_symbol, amount)
    }

    /// Deliver table events, re-supply rows if the store changed, and
    /// refresh the totals preview. Returns the number of events handled.
    pub fn pump(&mut self) -> usize {
        let table = self.table.clone();
        let handled = table.dispatch(self);
        if self.rows_changed {
            self.rows_changed = false;
            table.set_rows(self.store.snapshots());
        }
        self.prune_pending();
        self.recompute_totals();
        handled
    }

    /// Forget previews of rows that were committed, cancelled or removed.
    fn prune_pending(&mut self) {
        let table = &self.table;
        self.pending
            .retain(|id, _| table.draft(*id).is_some_and(|d| d.has_changes()));
    }

    fn recompute_totals(&mut self) {
        let persisted = self.store.lines().iter().map(|line| {
            match self.pending.get(&RowId(line.id)) {
                Some(cells) => line_amount(&cell(cells, QTY), &cell(cells, UNIT_PRICE)),
                None => line.amount(),
            }
        });
        let unsaved = self
            .pending
            .iter()
            .filter(|(id, _)| !id.is_persisted())
            .map(|(_, cells)| line_amount(&cell(cells, QTY), &cell(cells, UNIT_PRICE)));

        self.totals = Totals::compute(persisted.chain(unsaved).flatten(), self.settings.tax_rate);
    }
}

impl TableListener for InvoiceEditor {
    fn on_row_committed(&mut self, row: &RowCommit) {
        let id = if row.is_new || !row.row_id.is_persisted() {
            let id = self.store.insert(&row.cells);
            info!("line {id} added (was row {})", row.row_id);
            id
        } else if self.store.update(row.row_id.get(), &row.cells) {
            debug!("line {} updated", row.row_id);
            row.row_id.get()
        } else {
            warn!("commit for unknown line {}, storing as new", row.row_id);
            self.store.insert(&row.cells)
        };
        self.pending.remove(&row.row_id);
        self.rows_changed = true;
        self.status = Some(format!("Saved line {id}"));
    }

    fn on_row_deleted(&mut self, row_id: RowId) {
        if self.store.remove(row_id.get()) {
            info!("line {row_id} deleted");
            self.status = Some(format!("Deleted line {row_id}"));
        }
        self.pending.remove(&row_id);
        self.rows_changed = true;
    }

    fn on_cell_changed(&mut self, row_id: RowId, column: usize, value: &str) {
        let cells = self.pending.entry(row_id).or_insert_with(|| {
            self.table
                .draft(row_id)
                .map(|d| d.values())
                .unwrap_or_default()
        });
        if let Some(slot) = cells.get_mut(column) {
            *slot = value.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_needs_both_numbers() {
        assert_eq!(line_amount("2", "19.99"), Some(Decimal::new(3998, 2)));
        assert_eq!(line_amount(" 1 ", "5"), Some(Decimal::new(5, 0)));
        assert_eq!(line_amount("", "5"), None);
        assert_eq!(line_amount("two", "5"), None);
    }

    #[test]
    fn totals_round_to_cents() {
        let totals = Totals::compute(
            [Decimal::new(3998, 2), Decimal::new(1005, 2)],
            Decimal::new(21, 0),
        );
        assert_eq!(totals.subtotal, Decimal::new(5003, 2));
        assert_eq!(totals.tax, Decimal::new(1051, 2));
        assert_eq!(totals.total, Decimal::new(6054, 2));
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let totals = Totals::compute([Decimal::MAX, Decimal::ONE], Decimal::new(21, 0));
        assert_eq!(totals.subtotal, Decimal::MAX);
        assert!(totals.tax > Decimal::ZERO);
        assert_eq!(totals.total, Decimal::MAX);
    }

    #[test]
    fn store_ids_are_never_reused() {
        let mut store = LineStore::new();
        let cells = vec!["Oil change".to_string(), "1".into(), "89.5".into(), String::new()];
        let first = store.insert(&cells);
        assert!(store.remove(first));
        let second = store.insert(&cells);
        assert!(second > first);
        assert!(!store.update(first, &cells));
    }

    #[test]
    fn catalogue_feeds_service_suggestions() {
        let columns = columns();
        assert_eq!(columns[SERVICE].suggestions.len(), CATALOGUE.len());
        assert_eq!(columns[QTY].default_value.as_deref(), Some("1"));
    }
}
