//! Canonical row schema
//!
//! The layout of a canonical row is fixed across every producer and
//! consumer: field order and widths below are the wire format of every
//! array resource. The schema is a static value, never mutable global
//! state, so any number of packages can be built side by side.
//!
//! ```text
//! field             kind     width
//! row_value         u32      4
//! col_value         u32      4
//! row_index         u32      4
//! col_index         u32      4
//! uncertainty_type  u8       1
//! amount            f32      4
//! loc               f32      4
//! scale             f32      4
//! shape             f32      4
//! minimum           f32      4
//! maximum           f32      4
//! negative          bool     1
//! flip              bool     1
//!                            --
//!                            43 bytes, packed
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Max signed 32 bit integer. Sentinel for "index not yet assigned".
pub const MAX_SIGNED_32BIT_INT: u32 = 2_147_483_647;

/// Fields that define the canonical ordering of an array, most significant first.
pub const SORT_KEY: [&str; 4] = ["row_value", "col_value", "uncertainty_type", "amount"];

/// Numeric kind of a single row field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 8-bit integer
    UInt8,
    /// IEEE-754 single precision float
    Float32,
    /// One byte boolean (0 or 1)
    Bool,
}

impl FieldKind {
    /// Width of the field in bytes
    pub const fn width(self) -> usize {
        match self {
            FieldKind::UInt32 | FieldKind::Float32 => 4,
            FieldKind::UInt8 | FieldKind::Bool => 1,
        }
    }

    /// Array-protocol type string (explicit little-endian where width > 1)
    pub const fn type_code(self) -> &'static str {
        match self {
            FieldKind::UInt32 => "<u4",
            FieldKind::UInt8 => "|u1",
            FieldKind::Float32 => "<f4",
            FieldKind::Bool => "|b1",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::UInt32 => "u32",
            FieldKind::UInt8 => "u8",
            FieldKind::Float32 => "f32",
            FieldKind::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Name and kind of one schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name
    pub name: &'static str,
    /// Numeric kind (determines width)
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Canonical field list, in wire order
pub const CANONICAL_FIELDS: [FieldSpec; 13] = [
    FieldSpec::new("row_value", FieldKind::UInt32),
    FieldSpec::new("col_value", FieldKind::UInt32),
    FieldSpec::new("row_index", FieldKind::UInt32),
    FieldSpec::new("col_index", FieldKind::UInt32),
    FieldSpec::new("uncertainty_type", FieldKind::UInt8),
    FieldSpec::new("amount", FieldKind::Float32),
    FieldSpec::new("loc", FieldKind::Float32),
    FieldSpec::new("scale", FieldKind::Float32),
    FieldSpec::new("shape", FieldKind::Float32),
    FieldSpec::new("minimum", FieldKind::Float32),
    FieldSpec::new("maximum", FieldKind::Float32),
    FieldSpec::new("negative", FieldKind::Bool),
    FieldSpec::new("flip", FieldKind::Bool),
];

/// The canonical row schema (version 1)
pub static CANONICAL_SCHEMA: RowSchema = RowSchema {
    version: 1,
    fields: &CANONICAL_FIELDS,
};

/// Static, versioned descriptor of a fixed-width row layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSchema {
    /// Layout version
    pub version: u32,
    /// Fields in wire order
    pub fields: &'static [FieldSpec],
}

impl RowSchema {
    /// The canonical schema shared by all producers and consumers
    pub fn canonical() -> &'static RowSchema {
        &CANONICAL_SCHEMA
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Width of one packed row in bytes
    pub fn row_width(&self) -> usize {
        self.fields.iter().map(|f| f.kind.width()).sum()
    }

    /// Field names in wire order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Position of a field by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field at a position
    pub fn field(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }
}
