//! Decoding row lists supplied as untyped payloads.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::row::RowSnapshot;

/// The parent supplied a row list that is not a well-formed ordered sequence.
///
/// Never returned to the parent: the table logs it and renders a diagnostic
/// row instead of any data rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRows {
    #[error("expected an array of rows, found {found}")]
    NotAnArray { found: &'static str },

    #[error("row {index}: {reason}")]
    InvalidRow { index: usize, reason: String },

    #[error("row id {0} appears more than once")]
    DuplicateId(i64),
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn scalar_cell(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn decode_cells(index: usize, cells: &[Value]) -> Result<Vec<Option<String>>, MalformedRows> {
    cells
        .iter()
        .enumerate()
        .map(|(col, cell)| {
            scalar_cell(cell).ok_or_else(|| MalformedRows::InvalidRow {
                index,
                reason: format!("cell {col} is {}", kind_of(cell)),
            })
        })
        .collect()
}

fn decode_row(index: usize, value: &Value) -> Result<RowSnapshot, MalformedRows> {
    match value {
        Value::Array(cells) => Ok(RowSnapshot {
            id: None,
            cells: decode_cells(index, cells)?,
            is_new: false,
        }),
        Value::Object(map) => {
            let id = match map.get("id") {
                None | Some(Value::Null) => None,
                Some(v) => Some(v.as_i64().ok_or_else(|| MalformedRows::InvalidRow {
                    index,
                    reason: format!("id is {}", kind_of(v)),
                })?),
            };
            let cells = match map.get("cells") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(cells)) => decode_cells(index, cells)?,
                Some(v) => {
                    return Err(MalformedRows::InvalidRow {
                        index,
                        reason: format!("cells is {}", kind_of(v)),
                    });
                }
            };
            let is_new = map.get("is_new").and_then(Value::as_bool).unwrap_or(false);
            Ok(RowSnapshot { id, cells, is_new })
        }
        other => Err(MalformedRows::InvalidRow {
            index,
            reason: format!("expected an object or array, found {}", kind_of(other)),
        }),
    }
}

/// Decode a JSON row list.
///
/// Rows may be objects (`{"id": 5, "cells": ["Oil change", 89.5]}`) or bare
/// cell arrays. Scalar cells are stringified; `null` is an absent cell.
pub fn decode_rows(value: &Value) -> Result<Vec<RowSnapshot>, MalformedRows> {
    let Value::Array(rows) = value else {
        return Err(MalformedRows::NotAnArray {
            found: kind_of(value),
        });
    };
    let rows = rows
        .iter()
        .enumerate()
        .map(|(index, row)| decode_row(index, row))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique_ids(&rows)?;
    Ok(rows)
}

/// Row ids must identify rows uniquely.
pub fn check_unique_ids(rows: &[RowSnapshot]) -> Result<(), MalformedRows> {
    let mut seen = HashSet::new();
    for id in rows.iter().filter_map(|r| r.id) {
        if !seen.insert(id) {
            return Err(MalformedRows::DuplicateId(id));
        }
    }
    Ok(())
}
