//! Row encoding
//!
//! A `RowFormatter` turns one raw record into values in schema order. The
//! `RowEncoder` then checks arity and field widths and produces a `Row`.
//! Formatters never see partially written buffers, so a bad record fails
//! before anything is stored.

use calcpack_core::{
    FormatError, FormatResult, Record, Row, RowSchema, Value, CANONICAL_SCHEMA,
    MAX_SIGNED_32BIT_INT,
};
use std::collections::BTreeMap;

/// Strategy that extracts schema-ordered values from a record
pub trait RowFormatter<R: ?Sized> {
    /// Return one value per schema field, in schema order
    fn format(&self, record: &R, schema: &RowSchema) -> FormatResult<Vec<Value>>;
}

impl<R: ?Sized, T: RowFormatter<R> + ?Sized> RowFormatter<R> for &T {
    fn format(&self, record: &R, schema: &RowSchema) -> FormatResult<Vec<Value>> {
        (**self).format(record, schema)
    }
}

impl<R: ?Sized, T: RowFormatter<R> + ?Sized> RowFormatter<R> for Box<T> {
    fn format(&self, record: &R, schema: &RowSchema) -> FormatResult<Vec<Value>> {
        (**self).format(record, schema)
    }
}

/// Positional records are passed through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct TupleFormatter;

impl RowFormatter<[Value]> for TupleFormatter {
    fn format(&self, record: &[Value], _schema: &RowSchema) -> FormatResult<Vec<Value>> {
        Ok(record.to_vec())
    }
}

impl RowFormatter<Vec<Value>> for TupleFormatter {
    fn format(&self, record: &Vec<Value>, _schema: &RowSchema) -> FormatResult<Vec<Value>> {
        Ok(record.clone())
    }
}

/// Named-field records
///
/// `row` and `amount` are required. `col` defaults to `row` (a 1-d
/// matrix), `loc` defaults to `amount`, distribution parameters default
/// to NaN and flags to false. Matrix indices always start unassigned.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryFormatter;

impl RowFormatter<BTreeMap<String, Value>> for DictionaryFormatter {
    fn format(
        &self,
        record: &BTreeMap<String, Value>,
        _schema: &RowSchema,
    ) -> FormatResult<Vec<Value>> {
        let required = |name: &str| {
            record
                .get(name)
                .cloned()
                .ok_or_else(|| FormatError::missing_field(name))
        };
        let or = |name: &str, default: Value| record.get(name).cloned().unwrap_or(default);
        let nan = || Value::Float(f64::NAN);

        let row = required("row")?;
        let amount = required("amount")?;
        Ok(vec![
            row.clone(),
            or("col", row),
            Value::from(MAX_SIGNED_32BIT_INT),
            Value::from(MAX_SIGNED_32BIT_INT),
            or("uncertainty_type", Value::Int(0)),
            amount.clone(),
            or("loc", amount),
            or("scale", nan()),
            or("shape", nan()),
            or("minimum", nan()),
            or("maximum", nan()),
            or("negative", Value::Bool(false)),
            or("flip", Value::Bool(false)),
        ])
    }
}

/// Default strategy for loose records: tuples pass through, named fields
/// go through `DictionaryFormatter`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl RowFormatter<Record> for DefaultFormatter {
    fn format(&self, record: &Record, schema: &RowSchema) -> FormatResult<Vec<Value>> {
        match record {
            Record::Tuple(values) => TupleFormatter.format(values.as_slice(), schema),
            Record::Fields(map) => DictionaryFormatter.format(map, schema),
        }
    }
}

/// Adapts a closure `Fn(&R, &RowSchema) -> FormatResult<Vec<Value>>` into a formatter
///
/// ```ignore
/// let f = FormatFn(|x: &u32, _: &RowSchema| Ok(Row::new(*x, *x, 1.0).to_values()));
/// ```
pub struct FormatFn<F>(pub F);

impl<R: ?Sized, F> RowFormatter<R> for FormatFn<F>
where
    F: Fn(&R, &RowSchema) -> FormatResult<Vec<Value>>,
{
    fn format(&self, record: &R, schema: &RowSchema) -> FormatResult<Vec<Value>> {
        (self.0)(record, schema)
    }
}

/// Encodes records into canonical rows
#[derive(Debug, Clone, Copy)]
pub struct RowEncoder {
    schema: &'static RowSchema,
}

impl Default for RowEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RowEncoder {
    /// Encoder for the canonical schema
    pub fn new() -> Self {
        Self {
            schema: &CANONICAL_SCHEMA,
        }
    }

    /// Schema rows are encoded into
    pub fn schema(&self) -> &'static RowSchema {
        self.schema
    }

    /// Encode exactly one record into exactly one row
    pub fn encode<R, F>(&self, record: &R, formatter: &F) -> FormatResult<Row>
    where
        R: ?Sized,
        F: RowFormatter<R> + ?Sized,
    {
        let values = formatter.format(record, self.schema)?;
        Row::from_values(&values, self.schema)
    }
}
