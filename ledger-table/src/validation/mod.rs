//! Cell validation.
//!
//! Validation failures are recovered locally: the offending cell is marked
//! invalid with an inline message and commit is blocked. Nothing here is
//! propagated to the parent.

mod error;
mod result;
mod rules;

pub use error::ValidationError;
pub use result::{FieldError, ValidationResult};
pub use rules::{check_input, validate_cell};
