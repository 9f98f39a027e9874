//! Event loop.

use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures::StreamExt;
use ledger_table::KeyCombo;
use log::{debug, info, trace};

use crate::error::AppError;
use crate::invoice::InvoiceEditor;
use crate::render::{self, Layout};
use crate::terminal::TerminalGuard;

/// Repaint check interval, so a deferred suggestion close shows up without
/// further input.
const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run the editor until the user quits.
pub async fn run(editor: &mut InvoiceEditor) -> Result<(), AppError> {
    let mut terminal = TerminalGuard::new()?;
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut layout = Layout::default();
    let mut force_render = true;
    info!("editor started for invoice #{}", editor.number());

    loop {
        editor.pump();
        if force_render || editor.table().is_dirty() {
            let size = terminal.size()?;
            layout = render::draw(terminal.out(), editor, size)?;
            for (row, area) in &layout.rows {
                editor.table().set_row_area(*row, *area);
            }
            editor.table().clear_dirty();
            force_render = false;
        }

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => {
                    trace!("terminal event: {event:?}");
                    match handle_event(editor, &layout, event) {
                        Flow::Quit => break,
                        Flow::Continue => force_render = true,
                    }
                }
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
            _ = tick.tick() => {}
        }
    }

    info!("editor closed");
    Ok(())
}

/// Route one terminal event to the table.
pub fn handle_event(editor: &InvoiceEditor, layout: &Layout, event: Event) -> Flow {
    match event {
        Event::Key(key) => handle_key(editor, key),
        Event::Mouse(mouse) => {
            handle_mouse(editor, layout, mouse);
            Flow::Continue
        }
        _ => Flow::Continue,
    }
}

fn handle_key(editor: &InvoiceEditor, key: KeyEvent) -> Flow {
    if key.kind == KeyEventKind::Press
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && key.code == KeyCode::Char('q')
    {
        return Flow::Quit;
    }
    if let Some(combo) = KeyCombo::from_crossterm(key) {
        let result = editor.table().handle_key(combo);
        trace!("{combo:?} -> {result:?}");
    }
    Flow::Continue
}

fn handle_mouse(editor: &InvoiceEditor, layout: &Layout, mouse: MouseEvent) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    // The popup sits over other rows, so it takes the click first.
    if let Some(index) = layout.popup_index(mouse.column, mouse.row) {
        debug!("suggestion {index} picked by pointer");
        editor.table().pick_suggestion(index);
        return;
    }
    editor.table().handle_click(mouse.column, mouse.row);
}
