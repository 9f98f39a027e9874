//! Pointer routing and click-outside handling.

use log::trace;

use crate::row::RowMode;
use crate::schema::column_at;

use super::{CellFocus, EventResult, TableInner};

impl TableInner {
    pub(super) fn handle_click(&mut self, x: u16, y: u16) -> EventResult {
        let routing = self.hub.click(x, y);

        for id in routing.outside {
            if self.row(id).is_some_and(|r| r.mode() == RowMode::Editing) {
                trace!("row {id}: click outside at ({x}, {y})");
                self.commit_row(id);
            }
        }

        let hit = routing.inside.into_iter().find_map(|id| {
            let area = self.row(id)?.area()?;
            let column = column_at(&self.columns, x.saturating_sub(area.x))?;
            Some(CellFocus::new(id, column))
        });

        match hit {
            Some(target) => {
                self.move_focus(Some(target));
                // Clicking the focused cell of a settled row reopens it.
                self.begin_edit(target.row);
                EventResult::Consumed
            }
            None => {
                if self.focus.is_some() {
                    self.move_focus(None);
                }
                EventResult::Ignored
            }
        }
    }
}
