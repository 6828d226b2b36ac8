//! Key selection error types

use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur while selecting identifying attributes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Every candidate field was used and records still collide
    #[error("Fields {fields:?} are not enough to make every record unique")]
    NonUnique {
        /// Candidate fields that were tried
        fields: BTreeSet<String>,
    },

    /// A record's field set differs from the first record's
    #[error("Record {index} does not share the field set of the first record")]
    InconsistentFields {
        /// Position of the first offending record
        index: usize,
    },

    /// A record lacks the mandatory `id` attribute
    #[error("Record {index} has no 'id' attribute")]
    MissingId {
        /// Position of the offending record
        index: usize,
    },
}

/// Result type for key selection
pub type KeyResult<T> = Result<T, KeyError>;
