//! Draws the invoice editor with crossterm commands.
//!
//! The renderer is stateless: every frame is drawn from the table's
//! [`TableView`](ledger_table::TableView) and the editor's totals. The row
//! rectangles it produces are handed back to the table for hit testing.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use ledger_table::schema::column_offsets;
use ledger_table::{CellFocus, Rect, RowId, RowMode, RowView, TableBody, TextAlign};
use unicode_width::UnicodeWidthChar;

use crate::invoice::InvoiceEditor;

const LEFT: u16 = 2;
const TITLE_Y: u16 = 0;
const HEADER_Y: u16 = 2;
const FIRST_ROW_Y: u16 = 3;
/// Status and help lines at the bottom.
const FOOTER_LINES: u16 = 2;

const HELP: &str =
    "Tab/Shift+Tab move  Enter save  Shift+Enter newline  Esc undo  Ctrl+D delete  Ctrl+Q quit";

/// Screen areas produced by the last frame.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub rows: Vec<(RowId, Rect)>,
    pub popup: Option<Rect>,
}

impl Layout {
    /// Index of the suggestion under the pointer, if any.
    pub fn popup_index(&self, x: u16, y: u16) -> Option<usize> {
        let popup = self.popup?;
        popup.contains(x, y).then(|| usize::from(y - popup.y))
    }
}

/// Fit `text` into `width` columns, keeping a one-column gutter on the right.
/// Line breaks are shown as `⏎`.
pub fn fit(text: &str, width: u16, align: TextAlign) -> String {
    let width = usize::from(width);
    if width == 0 {
        return String::new();
    }
    let room = width - 1;

    let mut shown = String::new();
    let mut used = 0;
    for c in text.chars() {
        let c = if c == '\n' { '⏎' } else { c };
        let w = c.width().unwrap_or(0);
        if used + w > room {
            break;
        }
        shown.push(c);
        used += w;
    }

    let pad = room - used;
    let (left, right) = match align {
        TextAlign::Left => (0, pad),
        TextAlign::Right => (pad, 0),
        TextAlign::Center => (pad / 2, pad - pad / 2),
    };
    format!("{}{shown}{} ", " ".repeat(left), " ".repeat(right))
}

/// Draw a full frame.
pub fn draw(out: &mut impl Write, editor: &InvoiceEditor, size: (u16, u16)) -> io::Result<Layout> {
    let (width, height) = size;
    let view = editor.table().view();
    let offsets = column_offsets(&view.columns);
    let table_width: u16 = view.columns.iter().map(|c| c.width).sum();
    let rows_end = height.saturating_sub(FOOTER_LINES + 4);

    queue!(out, Clear(ClearType::All), SetAttribute(Attribute::Reset))?;

    let title = format!(
        "{}  Invoice #{:05}",
        editor.settings().company_name,
        editor.number()
    );
    queue!(
        out,
        MoveTo(LEFT, TITLE_Y),
        SetAttribute(Attribute::Bold),
        Print(fit(&title, width.saturating_sub(LEFT), TextAlign::Left)),
        SetAttribute(Attribute::Reset),
    )?;

    queue!(
        out,
        MoveTo(LEFT, HEADER_Y),
        SetAttribute(Attribute::Bold),
        SetAttribute(Attribute::Underlined),
    )?;
    for column in &view.columns {
        queue!(out, Print(fit(&column.name, column.width, column.align)))?;
    }
    queue!(out, SetAttribute(Attribute::Reset))?;

    let mut layout = Layout::default();
    let mut y = FIRST_ROW_Y;
    match &view.body {
        TableBody::Diagnostic(text) => {
            queue!(
                out,
                MoveTo(LEFT, y),
                SetForegroundColor(Color::Red),
                Print(fit(text, table_width, TextAlign::Left)),
                ResetColor,
            )?;
            y += 1;
        }
        TableBody::Rows(rows) => {
            for row in rows {
                if y >= rows_end {
                    // Off screen: an empty area never receives clicks.
                    layout.rows.push((row.row_id, Rect::new(LEFT, y, table_width, 0)));
                    continue;
                }
                draw_row(out, row, &view.columns, view.focus, y)?;
                layout.rows.push((row.row_id, Rect::new(LEFT, y, table_width, 1)));
                y += 1;
            }
        }
    }

    draw_totals(out, editor, y + 1, table_width)?;

    if let Some(suggestions) = &view.suggestions
        && let Some((_, area)) = layout.rows.iter().find(|(id, _)| *id == suggestions.target.row)
        && !area.is_empty()
        && let Some(column) = view.columns.get(suggestions.target.column)
    {
        let x = area.x + offsets.get(suggestions.target.column).copied().unwrap_or(0);
        let top = area.y + 1;
        let visible = usize::from(height.saturating_sub(top + FOOTER_LINES));
        let items: Vec<_> = suggestions.items.iter().take(visible).collect();
        for (i, item) in items.iter().enumerate() {
            let highlight = i == suggestions.highlight;
            queue!(
                out,
                MoveTo(x, top + i as u16),
                SetForegroundColor(Color::Cyan),
                SetAttribute(if highlight { Attribute::Reverse } else { Attribute::NoReverse }),
                Print(fit(item, column.width, TextAlign::Left)),
                SetAttribute(Attribute::Reset),
                ResetColor,
            )?;
        }
        if !items.is_empty() {
            layout.popup = Some(Rect::new(x, top, column.width, items.len() as u16));
        }
    }

    let status_y = height.saturating_sub(FOOTER_LINES);
    let focused_error = view.focus.and_then(|focus| {
        view.rows()
            .iter()
            .find(|r| r.row_id == focus.row)
            .and_then(|r| r.cells.get(focus.column))
            .and_then(|c| c.rejected.clone().or_else(|| c.error_message.clone()))
    });
    match focused_error {
        Some(message) => queue!(
            out,
            MoveTo(LEFT, status_y),
            SetForegroundColor(Color::Red),
            Print(fit(&message, width.saturating_sub(LEFT), TextAlign::Left)),
            ResetColor,
        )?,
        None => {
            if let Some(status) = editor.status() {
                queue!(
                    out,
                    MoveTo(LEFT, status_y),
                    Print(fit(status, width.saturating_sub(LEFT), TextAlign::Left)),
                )?;
            }
        }
    }
    queue!(
        out,
        MoveTo(LEFT, status_y + 1),
        SetAttribute(Attribute::Dim),
        Print(fit(HELP, width.saturating_sub(LEFT), TextAlign::Left)),
        SetAttribute(Attribute::Reset),
    )?;

    out.flush()?;
    Ok(layout)
}

fn draw_row(
    out: &mut impl Write,
    row: &RowView,
    columns: &[ledger_table::ColumnSchema],
    focus: Option<CellFocus>,
    y: u16,
) -> io::Result<()> {
    let marker = if row.is_entry {
        "+"
    } else if row.mode == RowMode::Editing && row.is_dirty {
        "*"
    } else {
        " "
    };
    queue!(out, MoveTo(LEFT - 2, y), Print(marker), MoveTo(LEFT, y))?;

    for (index, (column, cell)) in columns.iter().zip(&row.cells).enumerate() {
        let focused = focus == Some(CellFocus::new(row.row_id, index));
        if cell.is_invalid {
            queue!(out, SetForegroundColor(Color::Red))?;
        } else if row.is_entry && cell.value.is_empty() {
            queue!(out, SetAttribute(Attribute::Dim))?;
        }
        if focused {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        queue!(
            out,
            Print(fit(&cell.value, column.width, column.align)),
            SetAttribute(Attribute::Reset),
            ResetColor,
        )?;
    }
    Ok(())
}

fn draw_totals(out: &mut impl Write, editor: &InvoiceEditor, y: u16, width: u16) -> io::Result<()> {
    let totals = editor.totals();
    let tax_label = format!("Tax ({}%)", editor.settings().tax_rate.normalize());
    let lines = [
        ("Subtotal", totals.subtotal, false),
        (tax_label.as_str(), totals.tax, false),
        ("Total", totals.total, true),
    ];
    for (i, (label, amount, bold)) in lines.into_iter().enumerate() {
        let text = format!("{label}  {}", editor.money(amount));
        queue!(out, MoveTo(LEFT, y + i as u16))?;
        if bold {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        queue!(
            out,
            Print(fit(&text, width, TextAlign::Right)),
            SetAttribute(Attribute::Reset),
        )?;
    }
    Ok(())
}
