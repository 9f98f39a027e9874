//! Keyboard routing.

use log::trace;

use crate::keys::{Key, KeyCombo};
use crate::row::RowId;
use crate::schema::DataKind;

use super::{CellFocus, EventResult, TableInner};

impl TableInner {
    pub(super) fn handle_key(&mut self, key: KeyCombo) -> EventResult {
        trace!("key {key:?} with focus {:?}", self.focus);
        let Some(focus) = self.focus else {
            return match key.key {
                Key::Down | Key::Tab => {
                    self.focus_first();
                    EventResult::Consumed
                }
                _ => EventResult::Ignored,
            };
        };

        if key.modifiers.ctrl && key.key == Key::Char('d') {
            self.delete_row(focus.row);
            return EventResult::Consumed;
        }

        match key.key {
            Key::Enter if key.is_commit() => {
                if self.suggestions.target() == Some(focus)
                    && self.suggestions.is_open()
                    && self.suggestions.has_navigated()
                {
                    let index = self.suggestions.highlight_index();
                    self.pick_suggestion(index);
                } else {
                    self.commit_and_advance(focus);
                }
                EventResult::Consumed
            }
            Key::Enter if key.modifiers.shift => {
                if self.columns.get(focus.column).map(|c| c.kind) != Some(DataKind::Multiline) {
                    return EventResult::Ignored;
                }
                self.edit_focused(focus, |value| Some(format!("{value}\n")))
            }
            Key::Escape => {
                if self.suggestions.is_open() {
                    self.suggestions.close();
                } else {
                    self.cancel_row(focus.row);
                }
                EventResult::Consumed
            }
            Key::Backspace => self.edit_focused(focus, |value| {
                let mut value = value.to_string();
                value.pop().map(|_| value)
            }),
            Key::Char(c) if key.is_text_input() => {
                self.edit_focused(focus, |value| Some(format!("{value}{c}")))
            }
            Key::Tab => {
                if let Some(next) = self.step_cell(focus, true) {
                    self.move_focus(Some(next));
                }
                EventResult::Consumed
            }
            Key::BackTab => {
                if let Some(prev) = self.step_cell(focus, false) {
                    self.move_focus(Some(prev));
                }
                EventResult::Consumed
            }
            Key::Up | Key::Down => {
                let delta = if key.key == Key::Up { -1 } else { 1 };
                if self.suggestions.target() == Some(focus) && self.suggestions.is_open() {
                    self.suggestions.move_highlight(delta);
                } else if let Some(row) = self.step_row(focus.row, delta) {
                    self.move_focus(Some(CellFocus::new(row, focus.column)));
                }
                EventResult::Consumed
            }
            _ => EventResult::Ignored,
        }
    }

    /// Commit the focused row; on success move to the next row's first
    /// editable cell. Best-effort: nothing happens if there is no such cell.
    fn commit_and_advance(&mut self, focus: CellFocus) {
        let entry_before = self.entry.row_id();
        let position = self.position_of(focus.row);
        let outcome = self.commit_row(focus.row);
        if !outcome.is_committed() || !self.config.advance_on_commit {
            return;
        }

        let next = if focus.row == entry_before {
            Some(self.entry.row_id())
        } else {
            position.and_then(|i| self.visible_order().get(i + 1).copied())
        };
        let target = next.and_then(|row| {
            self.row(row)
                .and_then(|r| r.first_editable_column())
                .map(|column| CellFocus::new(row, column))
        });
        if target.is_some() {
            self.move_focus(target);
        }
    }

    /// Apply an edit to the focused cell's value.
    fn edit_focused(
        &mut self,
        focus: CellFocus,
        edit: impl FnOnce(&str) -> Option<String>,
    ) -> EventResult {
        let Some(current) = self
            .row(focus.row)
            .and_then(|r| r.draft().value(focus.column))
            .map(str::to_string)
        else {
            return EventResult::Ignored;
        };
        if let Some(next) = edit(&current) {
            // Rejected input is surfaced on the cell itself.
            let _ = self.input(focus.row, focus.column, next);
        } else {
            self.begin_edit(focus.row);
        }
        EventResult::Consumed
    }

    fn focus_first(&mut self) {
        let target = self.visible_order().into_iter().find_map(|row| {
            self.row(row)
                .and_then(|r| r.first_editable_column())
                .map(|column| CellFocus::new(row, column))
        });
        self.move_focus(target);
    }

    fn step_row(&self, row: RowId, delta: isize) -> Option<RowId> {
        let order = self.visible_order();
        let index = order.iter().position(|r| *r == row)? as isize + delta;
        if index < 0 {
            return None;
        }
        order.get(index as usize).copied()
    }

    /// Next (or previous) editable cell in reading order, crossing rows.
    fn step_cell(&self, focus: CellFocus, forward: bool) -> Option<CellFocus> {
        let editable: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_editable())
            .map(|(i, _)| i)
            .collect();
        let cells: Vec<CellFocus> = self
            .visible_order()
            .into_iter()
            .flat_map(|row| editable.iter().map(move |&column| CellFocus::new(row, column)))
            .collect();
        let index = cells.iter().position(|c| *c == focus)?;
        if forward {
            cells.get(index + 1).copied()
        } else {
            index.checked_sub(1).and_then(|i| cells.get(i).copied())
        }
    }
}
