//! Array error types

use crate::config::BuildConfigError;
use calcpack_core::FormatError;
use std::io;
use thiserror::Error;

/// Errors that can occur while building, writing or reading arrays
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A record could not be encoded into the canonical schema
    #[error("Invalid record at row {row}: {source}")]
    Format {
        /// Zero-based position of the record in the input
        row: usize,
        /// Underlying format error
        #[source]
        source: FormatError,
    },

    /// More records were supplied than the caller declared
    #[error("More rows than the {expected} declared")]
    TooManyRows {
        /// Declared row count
        expected: usize,
    },

    /// Builder configuration rejected
    #[error("Invalid build config: {0}")]
    Config(#[from] BuildConfigError),

    /// Binary file preamble is malformed
    #[error("Invalid array header: {0}")]
    InvalidHeader(String),

    /// Binary file describes a different row layout
    #[error("Array layout does not match the canonical row schema: {0}")]
    LayoutMismatch(String),

    /// Binary file body is shorter than its header declares
    #[error("Array body truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required by the header
        expected: usize,
        /// Bytes present
        actual: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ArrayError {
    /// Create a format error for the record at `row`
    pub fn format(row: usize, source: FormatError) -> Self {
        Self::Format { row, source }
    }

    /// Create an invalid header error
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }
}

/// Result type for array operations
pub type ArrayResult<T> = Result<T, ArrayError>;
