//! Core types for calcpack
//!
//! This crate defines the foundational types shared by every stage of the
//! data-package toolchain:
//! - Row: the canonical fixed-width record (the wire format of a resource)
//! - RowSchema: static, versioned descriptor of the canonical row layout
//! - Value / Record: loosely structured numeric input records
//! - FormatError: input-format errors raised while encoding a record

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod row;
pub mod schema;
pub mod value;

pub use error::{FormatError, FormatResult};
pub use row::Row;
pub use schema::{
    FieldKind, FieldSpec, RowSchema, CANONICAL_FIELDS, CANONICAL_SCHEMA, MAX_SIGNED_32BIT_INT,
    SORT_KEY,
};
pub use value::{Record, Value};
