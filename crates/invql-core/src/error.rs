//! Core error types.

use thiserror::Error;

/// Errors raised while resolving fields, executing queries or loading an
/// inventory.
#[derive(Debug, Error)]
pub enum Error {
    /// A query token did not resolve to any registered field.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// A computed field was used as filter criteria.
    #[error("field '{0}' is computed per record and cannot be used in a condition")]
    UnsupportedOperation(String),

    /// A literal could not be converted to the field's storage form.
    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// The predicate matched nothing, or the scope was already empty.
    #[error("no results")]
    EmptyResult,

    /// The inventory document could not be decoded.
    #[error("invalid inventory: {0}")]
    Inventory(#[from] serde_json::Error),

    /// The inventory file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid value error.
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is the expected "nothing matched" outcome rather than a fault.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Error::EmptyResult)
    }
}
