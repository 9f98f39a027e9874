use crate::schema::{ColumnSchema, DataKind};

use super::ValidationError;

/// Validate a stored value against its column.
pub fn validate_cell(column: &ColumnSchema, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        if column.required {
            return Err(ValidationError::Required {
                column: column.name.clone(),
            });
        }
        return Ok(());
    }

    if let Some(max) = column.max_length
        && value.chars().count() > max
    {
        return Err(ValidationError::TooLong {
            column: column.name.clone(),
            max,
        });
    }

    if column.kind == DataKind::Number && !is_number(value) {
        return Err(ValidationError::NotANumber {
            column: column.name.clone(),
        });
    }

    Ok(())
}

/// Decide whether typed input may replace the stored value at all.
///
/// Rejected input leaves the cell untouched; it is never truncated.
pub fn check_input(column: &ColumnSchema, value: &str) -> Result<(), ValidationError> {
    if column.read_only {
        return Err(ValidationError::ReadOnly {
            column: column.name.clone(),
        });
    }

    if let Some(max) = column.max_length
        && value.chars().count() > max
    {
        return Err(ValidationError::TooLong {
            column: column.name.clone(),
            max,
        });
    }

    if column.kind == DataKind::Number && !is_partial_number(value.trim()) {
        return Err(ValidationError::NotANumber {
            column: column.name.clone(),
        });
    }

    Ok(())
}

fn is_number(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

/// Accepts anything that can still grow into a number: `-`, `12.`, `.5`.
fn is_partial_number(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    true
}
