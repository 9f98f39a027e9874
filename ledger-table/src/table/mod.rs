//! Editable table controller.
//!
//! Composes one [`RowReconciler`] per parent-supplied row plus a trailing
//! synthetic entry row, and routes keyboard, pointer and edit events to them.
//! Cell changes, commits and delete requests are forwarded to the parent
//! verbatim as [`TableEvent`]s; the table itself transforms no data.

mod events;
mod focus;
mod keyboard;
mod malformed;
mod mouse;
mod view;

pub use events::{EventResult, TableEvent, TableListener};
pub use focus::CellFocus;
pub use malformed::{MalformedRows, check_unique_ids, decode_rows};
pub use view::{RowView, SuggestionView, TableBody, TableView};

pub use crate::row::RowCommit;

use std::collections::{HashMap, HashSet, VecDeque};
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, warn};

use crate::config::TableConfig;
use crate::geometry::Rect;
use crate::keys::KeyCombo;
use crate::pointer::PointerHub;
use crate::row::{
    CommitOutcome, IdAllocator, RowDraft, RowId, RowKey, RowMode, RowReconciler, RowSnapshot,
};
use crate::schema::ColumnSchema;
use crate::suggest::SuggestionList;
use crate::validation::ValidationError;

/// Unique identifier for an EditableTable instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

impl TableId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__editable_table_{}", self.0)
    }
}

/// Internal state for the EditableTable.
#[derive(Debug)]
struct TableInner {
    config: TableConfig,
    columns: Arc<[ColumnSchema]>,
    ids: IdAllocator,
    hub: PointerHub<RowId>,
    /// Data rows in parent order.
    order: Vec<RowId>,
    rows: HashMap<RowId, RowReconciler>,
    /// Snapshot identity -> reconciler, for reuse across renders.
    keys: HashMap<RowKey, RowId>,
    /// The synthetic data-entry row, always last.
    entry: RowReconciler,
    /// Set when the parent supplied a malformed row list.
    diagnostic: Option<String>,
    focus: Option<CellFocus>,
    events: VecDeque<TableEvent>,
    suggestions: SuggestionList,
}

impl TableInner {
    fn new(columns: Vec<ColumnSchema>, config: TableConfig) -> Self {
        let columns: Arc<[ColumnSchema]> = Arc::from(columns);
        let ids = IdAllocator::new();
        let hub = PointerHub::new();
        let mut entry = RowReconciler::blank(Arc::clone(&columns), &ids);
        entry.attach(&hub);
        let suggestions = SuggestionList::new(config.max_suggestions);
        Self {
            config,
            columns,
            ids,
            hub,
            order: Vec::new(),
            rows: HashMap::new(),
            keys: HashMap::new(),
            entry,
            diagnostic: None,
            focus: None,
            events: VecDeque::new(),
            suggestions,
        }
    }

    fn row(&self, id: RowId) -> Option<&RowReconciler> {
        if id == self.entry.row_id() {
            Some(&self.entry)
        } else {
            self.rows.get(&id)
        }
    }

    fn row_mut(&mut self, id: RowId) -> Option<&mut RowReconciler> {
        if id == self.entry.row_id() {
            Some(&mut self.entry)
        } else {
            self.rows.get_mut(&id)
        }
    }

    /// Rows in display order, entry row last. Empty while showing a diagnostic.
    fn visible_order(&self) -> Vec<RowId> {
        if self.diagnostic.is_some() {
            return Vec::new();
        }
        let mut order = self.order.clone();
        order.push(self.entry.row_id());
        order
    }

    fn position_of(&self, id: RowId) -> Option<usize> {
        self.visible_order().iter().position(|r| *r == id)
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    fn set_rows(&mut self, rows: Vec<RowSnapshot>) {
        if let Err(err) = check_unique_ids(&rows) {
            self.mark_malformed(err);
            return;
        }
        if self.diagnostic.take().is_some() {
            debug!("row list recovered from malformed input");
        }

        let mut order = Vec::with_capacity(rows.len());
        let mut keys = HashMap::with_capacity(rows.len());
        let mut seen = HashSet::with_capacity(rows.len());

        for (position, snapshot) in rows.into_iter().enumerate() {
            let key = RowKey::of(&snapshot, position);
            let existing = self
                .keys
                .get(&key)
                .copied()
                .filter(|id| self.rows.contains_key(id));

            let id = match existing {
                Some(id) => {
                    if let Some(row) = self.rows.get_mut(&id) {
                        row.refresh(snapshot);
                    }
                    id
                }
                None => {
                    let mut row = RowReconciler::from_snapshot(
                        snapshot,
                        Arc::clone(&self.columns),
                        &self.ids,
                    );
                    row.attach(&self.hub);
                    let id = row.row_id();
                    self.rows.insert(id, row);
                    id
                }
            };

            if !seen.insert(id) {
                self.mark_malformed(MalformedRows::DuplicateId(id.get()));
                return;
            }
            order.push(id);
            keys.insert(key, id);
        }

        // Dropping a reconciler releases its pointer subscription.
        self.rows.retain(|id, _| seen.contains(id));
        self.order = order;
        self.keys = keys;

        if let Some(focus) = self.focus
            && self.row(focus.row).is_none()
        {
            self.focus = None;
            self.suggestions.close();
            self.events.push_back(TableEvent::FocusMoved(None));
        }
    }

    fn mark_malformed(&mut self, err: MalformedRows) {
        warn!("malformed row list: {err}");
        self.diagnostic = Some(format!("{}: {err}", self.config.diagnostic_text));
        self.rows.clear();
        self.order.clear();
        self.keys.clear();
        if self.focus.take().is_some() {
            self.events.push_back(TableEvent::FocusMoved(None));
        }
        self.suggestions.close();
    }

    fn set_columns(&mut self, columns: Vec<ColumnSchema>) {
        self.columns = Arc::from(columns);
        for row in self.rows.values_mut() {
            row.apply_schema(Arc::clone(&self.columns));
        }
        self.entry.apply_schema(Arc::clone(&self.columns));

        match self.focus {
            Some(focus) if focus.column >= self.columns.len() => {
                self.focus = None;
                self.suggestions.close();
                self.events.push_back(TableEvent::FocusMoved(None));
            }
            Some(focus) => self.open_suggestions(focus),
            None => {}
        }
    }

    /// Swap in a fresh entry row after the current one was committed.
    fn replace_entry(&mut self) {
        let mut fresh = RowReconciler::blank(Arc::clone(&self.columns), &self.ids);
        fresh.attach(&self.hub);
        let old = mem::replace(&mut self.entry, fresh);
        debug!(
            "entry row {} committed, new entry row {}",
            old.row_id(),
            self.entry.row_id()
        );

        if self.focus.is_some_and(|f| f.row == old.row_id()) {
            let focus = self
                .entry
                .first_editable_column()
                .map(|column| CellFocus::new(self.entry.row_id(), column));
            if self.suggestions.target().is_some_and(|t| t.row == old.row_id()) {
                self.suggestions.close();
            }
            self.focus = focus;
            self.events.push_back(TableEvent::FocusMoved(focus));
        }
    }

    // -------------------------------------------------------------------------
    // Row operations
    // -------------------------------------------------------------------------

    fn begin_edit(&mut self, id: RowId) -> bool {
        self.row_mut(id).is_some_and(RowReconciler::begin_edit)
    }

    fn input(&mut self, id: RowId, column: usize, value: String) -> Result<(), ValidationError> {
        let Some(row) = self.row_mut(id) else {
            return Ok(());
        };
        if let Some(change) = row.input(column, value)? {
            if self.suggestions.target() == Some(CellFocus::new(id, column)) {
                self.suggestions.refilter(&change.value);
            }
            self.events.push_back(TableEvent::CellChanged {
                row_id: change.row_id,
                column: change.column,
                value: change.value,
            });
        }
        Ok(())
    }

    fn commit_row(&mut self, id: RowId) -> CommitOutcome {
        let is_entry = id == self.entry.row_id();
        let Some(row) = self.row_mut(id) else {
            return CommitOutcome::NotEditing;
        };
        let outcome = row.commit();
        if let CommitOutcome::Committed(commit) = &outcome {
            self.events.push_back(TableEvent::RowCommitted(commit.clone()));
            if is_entry {
                self.replace_entry();
            }
        }
        outcome
    }

    fn cancel_row(&mut self, id: RowId) {
        if let Some(row) = self.row_mut(id) {
            row.cancel();
        }
        if self.suggestions.target().is_some_and(|t| t.row == id) {
            self.suggestions.close();
        }
    }

    fn delete_row(&mut self, id: RowId) -> bool {
        if id == self.entry.row_id() {
            self.cancel_row(id);
            return false;
        }
        let Some(row) = self.rows.get(&id) else {
            return false;
        };
        let row_id = row.delete();
        self.events.push_back(TableEvent::RowDeleted { row_id });
        true
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    /// Move keyboard focus. Leaving a row counts as leaving its boundary and
    /// attempts an implicit commit; focusing a cell opens an edit session.
    fn move_focus(&mut self, target: Option<CellFocus>) {
        let target = target.filter(|t| self.row(t.row).is_some() && t.column < self.columns.len());
        let previous = self.focus;
        if previous == target {
            return;
        }

        if self.suggestions.target().is_some() && self.suggestions.target() != target {
            self.suggestions
                .close_deferred(self.config.suggestion_close_delay);
        }

        if let Some(prev) = previous
            && target.map(|t| t.row) != Some(prev.row)
            && self.row(prev.row).is_some_and(|r| r.mode() == RowMode::Editing)
        {
            self.commit_row(prev.row);
        }

        self.focus = target;
        if let Some(t) = target {
            self.begin_edit(t.row);
            self.open_suggestions(t);
        }
        self.events.push_back(TableEvent::FocusMoved(target));
    }

    fn open_suggestions(&mut self, focus: CellFocus) {
        let Some(column) = self.columns.get(focus.column) else {
            return;
        };
        if column.suggestions.is_empty() {
            return;
        }
        let value = self
            .row(focus.row)
            .and_then(|r| r.draft().value(focus.column))
            .unwrap_or_default()
            .to_string();
        self.suggestions
            .open_for(focus, column.suggestions.clone(), &value);
    }

    fn pick_suggestion(&mut self, index: usize) -> bool {
        let Some((target, value)) = self.suggestions.pick(index) else {
            return false;
        };
        // A rejected pick surfaces on the cell like typed input.
        let _ = self.input(target.row, target.column, value);
        true
    }

    fn take_events(&mut self) -> Vec<TableEvent> {
        self.events.drain(..).collect()
    }

    fn view(&self) -> TableView {
        let body = match &self.diagnostic {
            Some(text) => TableBody::Diagnostic(text.clone()),
            None => TableBody::Rows(
                self.visible_order()
                    .into_iter()
                    .filter_map(|id| self.row(id))
                    .map(|row| {
                        let draft = row.draft();
                        RowView {
                            row_id: draft.row_id,
                            mode: draft.mode,
                            is_new: draft.is_new,
                            is_dirty: draft.is_dirty,
                            is_entry: row.is_synthetic(),
                            cells: draft.cells.clone(),
                        }
                    })
                    .collect(),
            ),
        };
        let suggestions = match self.suggestions.target() {
            Some(target) if self.suggestions.is_open() => Some(SuggestionView {
                target,
                items: self.suggestions.visible(),
                highlight: self.suggestions.highlight_index(),
            }),
            _ => None,
        };
        TableView {
            columns: self.columns.to_vec(),
            body,
            focus: self.focus,
            suggestions,
        }
    }
}

/// An editable table of line items.
///
/// `EditableTable` is a shared handle: clones refer to the same table. The
/// parent supplies columns and row snapshots, forwards input events, and
/// drains [`TableEvent`]s to persist commits and deletions.
///
/// # Example
///
/// ```
/// use ledger_table::{ColumnSchema, EditableTable, RowSnapshot, TableEvent};
///
/// let table = EditableTable::new(vec![
///     ColumnSchema::text("Desc").required(),
///     ColumnSchema::number("Price").required(),
/// ]);
/// table.set_rows(vec![RowSnapshot::saved(5, ["Tyre rotation", "40"])]);
///
/// let entry = table.entry_id();
/// table.input(entry, 0, "Oil change").unwrap();
/// table.input(entry, 1, "89.5").unwrap();
/// assert!(table.commit(entry).is_committed());
///
/// let committed = table
///     .drain_events()
///     .into_iter()
///     .any(|e| matches!(e, TableEvent::RowCommitted(row) if row.is_new));
/// assert!(committed);
/// assert_ne!(table.entry_id(), entry);
/// ```
#[derive(Debug, Clone)]
pub struct EditableTable {
    id: TableId,
    inner: Arc<RwLock<TableInner>>,
    /// Dirty flag for re-render.
    dirty: Arc<AtomicBool>,
}

impl EditableTable {
    /// Create a table with the given columns and default configuration.
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self::with_config(columns, TableConfig::default())
    }

    pub fn with_config(columns: Vec<ColumnSchema>, config: TableConfig) -> Self {
        Self {
            id: TableId::new(),
            inner: Arc::new(RwLock::new(TableInner::new(columns, config))),
            dirty: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Share a pointer hub (and the given id allocator) with other tables,
    /// so one click is routed across all of them.
    pub fn with_pointer_hub(self, hub: PointerHub<RowId>, ids: IdAllocator) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.hub = hub;
            guard.ids = ids;
            let mut entry = RowReconciler::blank(Arc::clone(&guard.columns), &guard.ids);
            entry.attach(&guard.hub);
            guard.entry = entry;
            let TableInner { rows, hub, .. } = &mut *guard;
            for row in rows.values_mut() {
                row.attach(hub);
            }
        }
        self
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut TableInner) -> R) -> Option<R> {
        let mut guard = self.inner.write().ok()?;
        let result = f(&mut guard);
        self.dirty.store(true, Ordering::SeqCst);
        Some(result)
    }

    fn read<R>(&self, f: impl FnOnce(&TableInner) -> R) -> Option<R> {
        let guard = self.inner.read().ok()?;
        Some(f(&guard))
    }

    // -------------------------------------------------------------------------
    // Parent-supplied data
    // -------------------------------------------------------------------------

    pub fn columns(&self) -> Vec<ColumnSchema> {
        self.read(|inner| inner.columns.to_vec()).unwrap_or_default()
    }

    /// Replace the column schema. Rule changes reach every draft immediately.
    pub fn set_columns(&self, columns: Vec<ColumnSchema>) {
        self.with_inner(|inner| inner.set_columns(columns));
    }

    /// Reconcile against a new row list from the parent.
    pub fn set_rows(&self, rows: Vec<RowSnapshot>) {
        self.with_inner(|inner| inner.set_rows(rows));
    }

    /// Reconcile against an untyped row payload.
    ///
    /// A malformed payload renders a diagnostic row instead of data rows.
    pub fn set_rows_value(&self, value: &serde_json::Value) {
        match decode_rows(value) {
            Ok(rows) => self.set_rows(rows),
            Err(err) => {
                self.with_inner(|inner| inner.mark_malformed(err));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Row access
    // -------------------------------------------------------------------------

    /// Row ids in display order, entry row last.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.read(TableInner::visible_order).unwrap_or_default()
    }

    /// Id of the synthetic data-entry row.
    pub fn entry_id(&self) -> RowId {
        self.read(|inner| inner.entry.row_id())
            .unwrap_or(RowId(0))
    }

    pub fn draft(&self, row: RowId) -> Option<RowDraft> {
        self.read(|inner| inner.row(row).map(|r| r.draft().clone()))
            .flatten()
    }

    pub fn mode(&self, row: RowId) -> Option<RowMode> {
        self.read(|inner| inner.row(row).map(RowReconciler::mode))
            .flatten()
    }

    /// Diagnostic text shown in place of rows, if the last row list was
    /// malformed.
    pub fn diagnostic(&self) -> Option<String> {
        self.read(|inner| inner.diagnostic.clone()).flatten()
    }

    pub fn view(&self) -> TableView {
        self.read(TableInner::view).unwrap_or_else(|| TableView {
            columns: Vec::new(),
            body: TableBody::Rows(Vec::new()),
            focus: None,
            suggestions: None,
        })
    }

    // -------------------------------------------------------------------------
    // Row operations
    // -------------------------------------------------------------------------

    pub fn begin_edit(&self, row: RowId) -> bool {
        self.with_inner(|inner| inner.begin_edit(row))
            .unwrap_or(false)
    }

    /// Set a cell's value as if typed. Rejected input leaves the cell as is.
    pub fn input(
        &self,
        row: RowId,
        column: usize,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let value = value.into();
        self.with_inner(|inner| inner.input(row, column, value))
            .unwrap_or(Ok(()))
    }

    pub fn commit(&self, row: RowId) -> CommitOutcome {
        self.with_inner(|inner| inner.commit_row(row))
            .unwrap_or(CommitOutcome::NotEditing)
    }

    pub fn cancel(&self, row: RowId) {
        self.with_inner(|inner| inner.cancel_row(row));
    }

    /// Ask the parent to delete a row. Returns false for the entry row,
    /// which is cleared instead.
    pub fn delete(&self, row: RowId) -> bool {
        self.with_inner(|inner| inner.delete_row(row))
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Focus and input routing
    // -------------------------------------------------------------------------

    pub fn focus(&self) -> Option<CellFocus> {
        self.read(|inner| inner.focus).flatten()
    }

    pub fn set_focus(&self, focus: Option<CellFocus>) {
        self.with_inner(|inner| inner.move_focus(focus));
    }

    pub fn handle_key(&self, key: KeyCombo) -> EventResult {
        self.with_inner(|inner| inner.handle_key(key))
            .unwrap_or(EventResult::Ignored)
    }

    pub fn handle_click(&self, x: u16, y: u16) -> EventResult {
        self.with_inner(|inner| inner.handle_click(x, y))
            .unwrap_or(EventResult::Ignored)
    }

    /// Record where a row was rendered (renderer feedback for hit testing).
    pub fn set_row_area(&self, row: RowId, area: Rect) {
        if let Ok(guard) = self.inner.read()
            && let Some(row) = guard.row(row)
        {
            row.set_area(area);
        }
    }

    /// Pick a visible suggestion for the cell the list is bound to.
    pub fn pick_suggestion(&self, index: usize) -> bool {
        self.with_inner(|inner| inner.pick_suggestion(index))
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    pub fn drain_events(&self) -> Vec<TableEvent> {
        self.inner
            .write()
            .map(|mut g| g.take_events())
            .unwrap_or_default()
    }

    /// Deliver queued events to the parent. Returns how many were delivered.
    ///
    /// The table is not locked while the listener runs, so it may call back
    /// into the table (for instance to re-supply rows).
    pub fn dispatch<L: TableListener + ?Sized>(&self, listener: &mut L) -> usize {
        let events = self.drain_events();
        for event in &events {
            event.dispatch(listener);
        }
        events.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
            || self
                .read(|inner| inner.suggestions.is_dirty())
                .unwrap_or(false)
    }

    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
        if let Ok(guard) = self.inner.read() {
            guard.suggestions.clear_dirty();
        }
    }
}
