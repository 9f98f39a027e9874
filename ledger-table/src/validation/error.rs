use thiserror::Error;

/// Why a cell value (or an attempted input) is not acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{column} is required")]
    Required { column: String },

    #[error("{column} allows at most {max} characters")]
    TooLong { column: String, max: usize },

    #[error("{column} must be a number")]
    NotANumber { column: String },

    #[error("{column} is read-only")]
    ReadOnly { column: String },
}

impl ValidationError {
    /// Name of the column the error belongs to.
    pub fn column(&self) -> &str {
        match self {
            Self::Required { column }
            | Self::TooLong { column, .. }
            | Self::NotANumber { column }
            | Self::ReadOnly { column } => column,
        }
    }
}
