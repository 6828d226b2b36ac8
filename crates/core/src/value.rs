//! Loose input values
//!
//! Callers hand the encoder records in one of two shapes:
//! - a positional tuple of values, already in schema order
//! - a map of named fields (`row`, `col`, `amount`, ...)
//!
//! `Value` is deliberately small: the canonical row only stores unsigned
//! integers, floats and booleans. Conversions into a field check the
//! field's width and fail instead of truncating.

use crate::error::{FormatError, FormatResult};
use crate::schema::{FieldKind, FieldSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loosely typed scalar from an input record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / null value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Double precision float
    Float(f64),
    /// Text (never valid in a numeric field)
    String(String),
}

impl Value {
    /// Name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }

    fn out_of_range(&self, field: &FieldSpec) -> FormatError {
        let value = match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            other => format!("{:?}", other),
        };
        FormatError::OutOfRange {
            field: field.name.to_string(),
            kind: field.kind,
            value,
        }
    }

    fn wrong_kind(&self, field: &FieldSpec) -> FormatError {
        FormatError::WrongKind {
            field: field.name.to_string(),
            kind: field.kind,
            got: self.kind_name(),
        }
    }

    /// Integral value as i64, refusing floats with a fractional part
    fn as_integral(&self, field: &FieldSpec) -> FormatResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            Value::Float(f) => {
                let in_range = *f >= i64::MIN as f64 && *f <= i64::MAX as f64;
                if f.is_finite() && f.fract() == 0.0 && in_range {
                    Ok(*f as i64)
                } else {
                    Err(self.out_of_range(field))
                }
            }
            _ => Err(self.wrong_kind(field)),
        }
    }

    /// Convert for a `u32` field
    pub fn to_u32(&self, field: &FieldSpec) -> FormatResult<u32> {
        let i = self.as_integral(field)?;
        u32::try_from(i).map_err(|_| self.out_of_range(field))
    }

    /// Convert for a `u8` field
    pub fn to_u8(&self, field: &FieldSpec) -> FormatResult<u8> {
        let i = self.as_integral(field)?;
        u8::try_from(i).map_err(|_| self.out_of_range(field))
    }

    /// Convert for an `f32` field
    ///
    /// NaN and infinities pass through; finite values beyond the `f32`
    /// range are rejected rather than saturated.
    pub fn to_f32(&self, field: &FieldSpec) -> FormatResult<f32> {
        match self {
            Value::Int(i) => Ok(*i as f32),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Float(f) => {
                if f.is_finite() && f.abs() > f32::MAX as f64 {
                    Err(self.out_of_range(field))
                } else {
                    Ok(*f as f32)
                }
            }
            _ => Err(self.wrong_kind(field)),
        }
    }

    /// Convert for a boolean field (accepts `0` / `1` integers)
    pub fn to_bool(&self, field: &FieldSpec) -> FormatResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(_) => Err(self.out_of_range(field)),
            _ => Err(self.wrong_kind(field)),
        }
    }

    /// Check that the value can be stored in the given field
    pub fn check(&self, field: &FieldSpec) -> FormatResult<()> {
        match field.kind {
            FieldKind::UInt32 => self.to_u32(field).map(|_| ()),
            FieldKind::UInt8 => self.to_u8(field).map(|_| ()),
            FieldKind::Float32 => self.to_f32(field).map(|_| ()),
            FieldKind::Bool => self.to_bool(field).map(|_| ()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u8> for Value {
    fn from(i: u8) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// One raw input record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    /// Values already in schema order
    Tuple(Vec<Value>),
    /// Named fields, e.g. `{"row": 1, "amount": 0.5}`
    Fields(BTreeMap<String, Value>),
}

impl Record {
    /// Build a positional record
    pub fn tuple<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Record::Tuple(values.into_iter().map(Into::into).collect())
    }

    /// Build a named-field record
    pub fn fields<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Record::Fields(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a named field (always `None` for tuples)
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Record::Tuple(_) => None,
            Record::Fields(map) => map.get(name),
        }
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Record::Tuple(values)
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Record::Fields(map)
    }
}
