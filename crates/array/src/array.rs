//! Sorted row arrays
//!
//! A `RowArray` is always sorted by `(row_value, col_value,
//! uncertainty_type, amount)`. Consumers rely on this for grouped
//! iteration and binary search, so every constructor sorts.

use crate::error::ArrayResult;
use crate::npy;
use calcpack_core::Row;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::slice;

/// An ordered sequence of canonical rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowArray {
    rows: Vec<Row>,
}

impl RowArray {
    /// Create an array from rows in any order
    pub fn from_rows(mut rows: Vec<Row>) -> Self {
        rows.sort_by(Row::cmp_sort_key);
        Self { rows }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the array is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in canonical order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume the array, returning its rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Iterate rows in canonical order
    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Whether rows are in canonical order
    pub fn is_sorted(&self) -> bool {
        self.rows
            .windows(2)
            .all(|w| w[0].cmp_sort_key(&w[1]) != std::cmp::Ordering::Greater)
    }

    /// All rows with the given `row_value`, found by binary search
    pub fn rows_for(&self, row_value: u32) -> &[Row] {
        let start = self.rows.partition_point(|r| r.row_value < row_value);
        let end = self.rows.partition_point(|r| r.row_value <= row_value);
        &self.rows[start..end]
    }

    /// All rows with the given `(row_value, col_value)` pair
    pub fn rows_for_pair(&self, row_value: u32, col_value: u32) -> &[Row] {
        let key = (row_value, col_value);
        let start = self
            .rows
            .partition_point(|r| (r.row_value, r.col_value) < key);
        let end = self
            .rows
            .partition_point(|r| (r.row_value, r.col_value) <= key);
        &self.rows[start..end]
    }

    /// Bitwise comparison, treating identical NaN fields as equal
    pub fn bit_eq(&self, other: &RowArray) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.bit_eq(b))
    }

    // =========================================================================
    // Binary IO
    // =========================================================================

    /// Serialize into any writer, returning the number of bytes written
    pub fn write_to<W: Write>(&self, writer: W) -> ArrayResult<u64> {
        npy::write_rows(writer, &self.rows)
    }

    /// Serialize into a byte vector
    pub fn to_bytes(&self) -> ArrayResult<Vec<u8>> {
        let mut buffer = Vec::with_capacity(npy::encoded_len(self.len()));
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Deserialize from any reader
    pub fn read_from<R: Read>(reader: R) -> ArrayResult<Self> {
        Ok(Self::from_rows(npy::read_rows(reader)?))
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> ArrayResult<Self> {
        Self::read_from(data)
    }

    /// Write the array to `path`
    ///
    /// The file is written beside its destination and renamed into place,
    /// so a failed write never leaves a partial file at `path`.
    pub fn save(&self, path: &Path) -> ArrayResult<u64> {
        let temp_path = path.with_extension("npy.tmp");
        let result = (|| -> ArrayResult<u64> {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            let written = self.write_to(&mut writer)?;
            writer.flush()?;
            Ok(written)
        })();

        match result {
            Ok(written) => {
                fs::rename(&temp_path, path)?;
                Ok(written)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    /// Read an array from `path`
    pub fn load(path: &Path) -> ArrayResult<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}

impl From<Vec<Row>> for RowArray {
    fn from(rows: Vec<Row>) -> Self {
        Self::from_rows(rows)
    }
}

impl<'a> IntoIterator for &'a RowArray {
    type Item = &'a Row;
    type IntoIter = slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
