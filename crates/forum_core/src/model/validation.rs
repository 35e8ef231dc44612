//! Field-level validation shared by write models.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation error for write models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    Blank(&'static str),
    /// Text field exceeds its character budget.
    TooLong {
        field: &'static str,
        max_chars: usize,
    },
    /// Required collection field has no elements.
    Empty(&'static str),
    /// Field holds a value outside its accepted set.
    Invalid { field: &'static str, value: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(field) => write!(f, "`{field}` must not be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "`{field}` must be at most {max_chars} characters")
            }
            Self::Empty(field) => write!(f, "`{field}` must not be empty"),
            Self::Invalid { field, value } => write!(f, "invalid `{field}` value `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(())
}

pub(crate) fn limit_chars(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::TooLong { field, max_chars });
    }
    Ok(())
}
