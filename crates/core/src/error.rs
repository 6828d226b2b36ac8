//! Input-format errors
//!
//! Raised when a record cannot be encoded into the canonical row schema.
//! Encoding never truncates or wraps: a value that does not fit its field
//! fails here.

use crate::schema::FieldKind;
use thiserror::Error;

/// Result type alias for record formatting
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// A record could not be encoded into a canonical row
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// Formatter returned the wrong number of values
    #[error("Expected {expected} values in schema order, got {actual}")]
    Arity {
        /// Number of schema fields
        expected: usize,
        /// Number of values returned
        actual: usize,
    },

    /// A required field is absent from a named-field record
    #[error("Missing required field '{0}'")]
    MissingField(String),

    /// Value does not fit the numeric width of its field
    #[error("Value {value} out of range for field '{field}' ({kind})")]
    OutOfRange {
        /// Field name
        field: String,
        /// Field kind
        kind: FieldKind,
        /// Offending value, rendered
        value: String,
    },

    /// Value has a kind that cannot be stored in the field at all
    #[error("Field '{field}' expects {kind}, got {got}")]
    WrongKind {
        /// Field name
        field: String,
        /// Field kind
        kind: FieldKind,
        /// Kind of the offending value
        got: &'static str,
    },
}

impl FormatError {
    /// Create a missing field error
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField(name.into())
    }
}
