//! Canonical row
//!
//! One numeric exchange / uncertainty entry. `row_value` and `col_value`
//! identify entities; `row_index` and `col_index` are matrix positions
//! assigned at matrix build time and hold `MAX_SIGNED_32BIT_INT` until then.

use crate::error::{FormatError, FormatResult};
use crate::schema::{RowSchema, CANONICAL_FIELDS, MAX_SIGNED_32BIT_INT};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A canonical fixed-width row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Row entity identifier
    pub row_value: u32,
    /// Column entity identifier
    pub col_value: u32,
    /// Matrix row position, sentinel until assigned
    pub row_index: u32,
    /// Matrix column position, sentinel until assigned
    pub col_index: u32,
    /// Uncertainty distribution identifier
    pub uncertainty_type: u8,
    /// Static amount
    pub amount: f32,
    /// Distribution location
    pub loc: f32,
    /// Distribution scale
    pub scale: f32,
    /// Distribution shape
    pub shape: f32,
    /// Distribution lower bound
    pub minimum: f32,
    /// Distribution upper bound
    pub maximum: f32,
    /// Sampled values should be negated
    pub negative: bool,
    /// Sign flip applied at matrix build time
    pub flip: bool,
}

impl Default for Row {
    fn default() -> Self {
        Row {
            row_value: 0,
            col_value: 0,
            row_index: MAX_SIGNED_32BIT_INT,
            col_index: MAX_SIGNED_32BIT_INT,
            uncertainty_type: 0,
            amount: 0.0,
            loc: 0.0,
            scale: f32::NAN,
            shape: f32::NAN,
            minimum: f32::NAN,
            maximum: f32::NAN,
            negative: false,
            flip: false,
        }
    }
}

impl Row {
    /// Row with the given identifiers and amount, all other fields defaulted
    ///
    /// `loc` takes the value of `amount`.
    pub fn new(row_value: u32, col_value: u32, amount: f32) -> Self {
        Row {
            row_value,
            col_value,
            amount,
            loc: amount,
            ..Default::default()
        }
    }

    /// Build a row from values given in schema order
    ///
    /// Fails if the schema or the values do not have the canonical arity,
    /// or any value does not fit its field.
    pub fn from_values(values: &[Value], schema: &RowSchema) -> FormatResult<Row> {
        let expected = CANONICAL_FIELDS.len();
        for actual in [schema.len(), values.len()] {
            if actual != expected {
                return Err(FormatError::Arity { expected, actual });
            }
        }
        let f = schema.fields;
        Ok(Row {
            row_value: values[0].to_u32(&f[0])?,
            col_value: values[1].to_u32(&f[1])?,
            row_index: values[2].to_u32(&f[2])?,
            col_index: values[3].to_u32(&f[3])?,
            uncertainty_type: values[4].to_u8(&f[4])?,
            amount: values[5].to_f32(&f[5])?,
            loc: values[6].to_f32(&f[6])?,
            scale: values[7].to_f32(&f[7])?,
            shape: values[8].to_f32(&f[8])?,
            minimum: values[9].to_f32(&f[9])?,
            maximum: values[10].to_f32(&f[10])?,
            negative: values[11].to_bool(&f[11])?,
            flip: values[12].to_bool(&f[12])?,
        })
    }

    /// Values of this row in schema order
    pub fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.row_value),
            Value::from(self.col_value),
            Value::from(self.row_index),
            Value::from(self.col_index),
            Value::from(self.uncertainty_type),
            Value::from(self.amount),
            Value::from(self.loc),
            Value::from(self.scale),
            Value::from(self.shape),
            Value::from(self.minimum),
            Value::from(self.maximum),
            Value::from(self.negative),
            Value::from(self.flip),
        ]
    }

    /// Compare by the canonical sort key
    /// `(row_value, col_value, uncertainty_type, amount)`.
    ///
    /// NaN amounts order after every number.
    pub fn cmp_sort_key(&self, other: &Row) -> Ordering {
        self.row_value
            .cmp(&other.row_value)
            .then(self.col_value.cmp(&other.col_value))
            .then(self.uncertainty_type.cmp(&other.uncertainty_type))
            .then_with(|| cmp_nan_last(self.amount, other.amount))
    }

    /// Bitwise equality, so NaN fields compare equal to themselves
    pub fn bit_eq(&self, other: &Row) -> bool {
        self.row_value == other.row_value
            && self.col_value == other.col_value
            && self.row_index == other.row_index
            && self.col_index == other.col_index
            && self.uncertainty_type == other.uncertainty_type
            && self.amount.to_bits() == other.amount.to_bits()
            && self.loc.to_bits() == other.loc.to_bits()
            && self.scale.to_bits() == other.scale.to_bits()
            && self.shape.to_bits() == other.shape.to_bits()
            && self.minimum.to_bits() == other.minimum.to_bits()
            && self.maximum.to_bits() == other.maximum.to_bits()
            && self.negative == other.negative
            && self.flip == other.flip
    }
}

fn cmp_nan_last(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CANONICAL_SCHEMA;

    fn values(range: std::ops::Range<i64>, negative: bool, flip: bool) -> Vec<Value> {
        let mut v: Vec<Value> = range.map(Value::Int).collect();
        v.push(Value::Bool(negative));
        v.push(Value::Bool(flip));
        v
    }

    #[test]
    fn test_default_row() {
        let row = Row::default();
        assert_eq!(row.row_index, MAX_SIGNED_32BIT_INT);
        assert_eq!(row.col_index, MAX_SIGNED_32BIT_INT);
        assert!(row.scale.is_nan());
        assert!(row.maximum.is_nan());
        assert!(!row.negative);
    }

    #[test]
    fn test_new_copies_amount_to_loc() {
        let row = Row::new(1, 2, 3.5);
        assert_eq!(row.loc, 3.5);
    }

    #[test]
    fn test_from_values() {
        let row = Row::from_values(&values(0..11, false, true), &CANONICAL_SCHEMA).unwrap();
        assert_eq!(row.row_value, 0);
        assert_eq!(row.uncertainty_type, 4);
        assert_eq!(row.maximum, 10.0);
        assert!(row.flip);
    }

    #[test]
    fn test_from_values_wrong_arity() {
        let err = Row::from_values(&[Value::Int(1)], &CANONICAL_SCHEMA).unwrap_err();
        assert_eq!(
            err,
            FormatError::Arity {
                expected: 13,
                actual: 1
            }
        );
    }

    #[test]
    fn test_from_values_short_schema() {
        static SHORT: [crate::schema::FieldSpec; 1] = [CANONICAL_FIELDS[0]];
        let schema = RowSchema {
            version: 1,
            fields: &SHORT,
        };
        let err = Row::from_values(&[Value::Int(1)], &schema).unwrap_err();
        assert_eq!(
            err,
            FormatError::Arity {
                expected: 13,
                actual: 1
            }
        );
    }

    #[test]
    fn test_values_roundtrip() {
        let row = Row::new(4, 5, 0.5);
        let back = Row::from_values(&row.to_values(), &CANONICAL_SCHEMA).unwrap();
        assert!(row.bit_eq(&back));
    }

    #[test]
    fn test_sort_key_order() {
        let a = Row::new(1, 9, 5.0);
        let b = Row::new(2, 0, 0.0);
        assert_eq!(a.cmp_sort_key(&b), Ordering::Less);

        let mut c = Row::new(1, 9, 1.0);
        c.uncertainty_type = 2;
        assert_eq!(a.cmp_sort_key(&c), Ordering::Less);

        let nan = Row::new(1, 9, f32::NAN);
        assert_eq!(a.cmp_sort_key(&nan), Ordering::Less);
        assert_eq!(nan.cmp_sort_key(&nan), Ordering::Equal);
    }
}
