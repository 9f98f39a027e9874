//! Column schema: render and validation rules per column.

use serde::{Deserialize, Serialize};

/// Kind of data a column holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    #[default]
    Text,
    Number,
    /// Free text where Shift+Enter inserts a line break.
    Multiline,
}

/// Horizontal alignment of cell content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A column definition.
///
/// Owned by the parent. The table only reads it, and re-applies it to every
/// row draft when the parent replaces the schema via
/// [`EditableTable::set_columns`](crate::table::EditableTable::set_columns).
///
/// # Example
///
/// ```
/// use ledger_table::ColumnSchema;
///
/// let columns = vec![
///     ColumnSchema::text("Desc").required().max_length(60),
///     ColumnSchema::number("Price").required(),
/// ];
/// assert!(columns[1].is_numeric());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default)]
    pub kind: DataKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub align: TextAlign,
    /// Rendered width in terminal cells.
    #[serde(default = "default_width")]
    pub width: u16,
    /// Autocomplete suggestions offered while editing this column.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

fn default_width() -> u16 {
    12
}

impl ColumnSchema {
    /// Create a column of the given kind.
    pub fn new(name: impl Into<String>, kind: DataKind) -> Self {
        let align = match kind {
            DataKind::Number => TextAlign::Right,
            _ => TextAlign::Left,
        };
        Self {
            name: name.into(),
            kind,
            required: false,
            read_only: false,
            max_length: None,
            default_value: None,
            align,
            width: default_width(),
            suggestions: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, DataKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, DataKind::Number)
    }

    pub fn multiline(name: impl Into<String>) -> Self {
        Self::new(name, DataKind::Multiline)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn suggestions<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = items.into_iter().map(Into::into).collect();
        self
    }

    /// Value a fresh cell in this column starts with.
    pub fn initial_value(&self) -> String {
        self.default_value.clone().unwrap_or_default()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == DataKind::Number
    }

    pub fn is_editable(&self) -> bool {
        !self.read_only
    }
}

/// X offset of each column relative to the row's left edge.
pub fn column_offsets(columns: &[ColumnSchema]) -> Vec<u16> {
    let mut offsets = Vec::with_capacity(columns.len());
    let mut x = 0u16;
    for col in columns {
        offsets.push(x);
        x = x.saturating_add(col.width);
    }
    offsets
}

/// Column index at `x` relative to the row's left edge.
pub fn column_at(columns: &[ColumnSchema], x: u16) -> Option<usize> {
    let mut start = 0u16;
    for (i, col) in columns.iter().enumerate() {
        let end = start.saturating_add(col.width);
        if x >= start && x < end {
            return Some(i);
        }
        start = end;
    }
    None
}
