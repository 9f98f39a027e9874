use super::ValidationError;

/// A single invalid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Column index within the row.
    pub column: usize,
    pub error: ValidationError,
}

impl FieldError {
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Result of validating a whole row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }

    pub fn first_error(&self) -> Option<&FieldError> {
        self.errors().first()
    }

    /// Column index of the first invalid cell, for focusing.
    pub fn first_invalid_column(&self) -> Option<usize> {
        self.first_error().map(|e| e.column)
    }
}
