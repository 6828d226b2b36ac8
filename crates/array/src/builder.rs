//! Array builder
//!
//! Drives the `RowEncoder` over a possibly huge iterable of records.
//!
//! - With a nonzero expected row count, exactly that many rows are allocated up
//!   front and a surplus record fails with `TooManyRows` before it is
//!   encoded.
//! - Without one, records are consumed in fixed-size buckets. Each bucket
//!   is encoded into its own preallocated buffer, trimmed if partial, and
//!   the buckets are concatenated once the input is exhausted.
//!
//! Either way the result is sorted by the canonical key.

use crate::array::RowArray;
use crate::config::BuildConfig;
use crate::encoder::{RowEncoder, RowFormatter};
use crate::error::{ArrayError, ArrayResult};
use calcpack_core::Row;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Split an iterator into `Vec`s of at most `size` items
///
/// The last chunk may be shorter. A `size` of 0 yields nothing.
pub fn chunked<I: IntoIterator>(iter: I, size: usize) -> Chunked<I::IntoIter> {
    Chunked {
        iter: iter.into_iter(),
        size,
    }
}

/// Iterator returned by [`chunked`]
pub struct Chunked<I> {
    iter: I,
    size: usize,
}

impl<I: Iterator> Iterator for Chunked<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<I::Item> = self.iter.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}

/// Summary of one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    /// Rows in the final array
    pub rows: usize,
    /// Internal buffers used (1 when the row count was declared)
    pub buckets: usize,
}

/// Builds sorted `RowArray`s from raw records
#[derive(Debug, Clone, Default)]
pub struct ArrayBuilder {
    config: BuildConfig,
    encoder: RowEncoder,
}

impl ArrayBuilder {
    /// Create a builder with the given configuration
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            encoder: RowEncoder::new(),
        }
    }

    /// Create a builder with default configuration
    pub fn with_defaults() -> Self {
        Self::new(BuildConfig::default())
    }

    /// Builder configuration
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build a sorted array from `records`
    ///
    /// A nonzero `expected_rows` switches to pre-counted mode; `Some(0)` is
    /// treated like `None`. See the module docs.
    pub fn build<R, I, F>(
        &self,
        records: I,
        formatter: &F,
        expected_rows: Option<usize>,
    ) -> ArrayResult<RowArray>
    where
        I: IntoIterator<Item = R>,
        F: RowFormatter<R> + ?Sized,
    {
        self.build_with_report(records, formatter, expected_rows)
            .map(|(array, _)| array)
    }

    /// Build a sorted array and report how it was assembled
    pub fn build_with_report<R, I, F>(
        &self,
        records: I,
        formatter: &F,
        expected_rows: Option<usize>,
    ) -> ArrayResult<(RowArray, BuildReport)>
    where
        I: IntoIterator<Item = R>,
        F: RowFormatter<R> + ?Sized,
    {
        self.config.validate()?;

        let (rows, buckets) = match expected_rows {
            Some(expected) if expected > 0 => {
                (self.build_counted(records, formatter, expected)?, 1)
            }
            _ => self.build_bucketed(records, formatter)?,
        };

        let array = RowArray::from_rows(rows);
        let report = BuildReport {
            rows: array.len(),
            buckets,
        };
        debug!(
            target: "calcpack::array",
            rows = report.rows,
            buckets = report.buckets,
            "Built array"
        );
        Ok((array, report))
    }

    /// Build a sorted array and write it to `path`
    ///
    /// Nothing is written unless every record encodes.
    pub fn build_to_file<R, I, F>(
        &self,
        records: I,
        formatter: &F,
        expected_rows: Option<usize>,
        path: &Path,
    ) -> ArrayResult<PathBuf>
    where
        I: IntoIterator<Item = R>,
        F: RowFormatter<R> + ?Sized,
    {
        let (array, _) = self.build_with_report(records, formatter, expected_rows)?;
        let bytes = array.save(path)?;
        debug!(target: "calcpack::array", path = %path.display(), bytes, "Wrote array");
        Ok(path.to_path_buf())
    }

    fn encode_at<R, F>(&self, index: usize, record: &R, formatter: &F) -> ArrayResult<Row>
    where
        F: RowFormatter<R> + ?Sized,
    {
        self.encoder
            .encode(record, formatter)
            .map_err(|e| ArrayError::format(index, e))
    }

    fn build_counted<R, I, F>(
        &self,
        records: I,
        formatter: &F,
        expected: usize,
    ) -> ArrayResult<Vec<Row>>
    where
        I: IntoIterator<Item = R>,
        F: RowFormatter<R> + ?Sized,
    {
        let mut rows = vec![Row::default(); expected];
        let mut filled = 0;
        for (i, record) in records.into_iter().enumerate() {
            if i >= expected {
                return Err(ArrayError::TooManyRows { expected });
            }
            rows[i] = self.encode_at(i, &record, formatter)?;
            filled = i + 1;
        }

        if filled < expected {
            warn!(
                target: "calcpack::array",
                expected,
                actual = filled,
                "Fewer rows than declared; trimming array"
            );
            rows.truncate(filled);
        }
        Ok(rows)
    }

    fn build_bucketed<R, I, F>(&self, records: I, formatter: &F) -> ArrayResult<(Vec<Row>, usize)>
    where
        I: IntoIterator<Item = R>,
        F: RowFormatter<R> + ?Sized,
    {
        let size = self.config.bucket_size;
        let mut buckets: Vec<Vec<Row>> = Vec::new();
        let mut offset = 0;

        for chunk in chunked(records, size) {
            let mut bucket = Vec::with_capacity(size);
            for record in &chunk {
                bucket.push(self.encode_at(offset + bucket.len(), record, formatter)?);
            }
            if bucket.len() < size {
                bucket.shrink_to_fit();
            }
            offset += bucket.len();
            buckets.push(bucket);
        }

        let count = buckets.len();
        let mut rows = Vec::with_capacity(offset);
        for bucket in buckets {
            rows.extend(bucket);
        }
        Ok((rows, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{DefaultFormatter, FormatFn, TupleFormatter};
    use calcpack_core::{FormatError, FormatResult, Record, RowSchema, Value};
    use tempfile::tempdir;

    fn tuple(start: i64, negative: bool, flip: bool) -> Vec<Value> {
        let mut v: Vec<Value> = (start..start + 11).map(Value::Int).collect();
        v.push(Value::Bool(negative));
        v.push(Value::Bool(flip));
        v
    }

    #[test]
    fn test_chunked() {
        let mut c = chunked(0..600, 250);
        assert_eq!(c.next().unwrap().last(), Some(&249));
        assert_eq!(c.next().unwrap().last(), Some(&499));
        let last = c.next().unwrap();
        assert_eq!(last.len(), 100);
        assert_eq!(last.last(), Some(&599));
        assert!(c.next().is_none());
    }

    #[test]
    fn test_chunked_zero_size_is_empty() {
        assert_eq!(chunked(0..10, 0).count(), 0);
    }

    #[test]
    fn test_build_tuples() {
        let data = vec![tuple(0, false, false), tuple(12, true, true)];
        let array = ArrayBuilder::with_defaults()
            .build(data, &TupleFormatter, None)
            .unwrap();

        assert_eq!(array.len(), 2);
        assert_eq!(array.rows()[0].row_value, 0);
        assert_eq!(array.rows()[1].row_value, 12);
        assert!(!array.rows()[0].flip);
        assert!(array.rows()[1].flip);
    }

    #[test]
    fn test_build_with_format_function() {
        let formatter = FormatFn(|_: &i32, _: &RowSchema| -> FormatResult<Vec<Value>> {
            Ok(vec![
                Value::Int(2),
                Value::Int(4),
                Value::Int(1),
                Value::Int(3),
                Value::Int(5),
                Value::Int(7),
                Value::Int(6),
                Value::Int(8),
                Value::Int(9),
                Value::Int(11),
                Value::Int(10),
                Value::Bool(false),
                Value::Bool(true),
            ])
        });
        let array = ArrayBuilder::with_defaults()
            .build(0..10, &formatter, None)
            .unwrap();
        assert_eq!(array.len(), 10);
        let total: u32 = array.iter().map(|r| r.row_value).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_build_sorts_output() {
        let data = vec![
            Record::fields([("row", 5), ("amount", 1)]),
            Record::fields([("row", 1), ("col", 3), ("amount", 1)]),
            Record::fields([("row", 1), ("col", 2), ("amount", 9)]),
            Record::fields([("row", 1), ("col", 2), ("amount", -9)]),
        ];
        let array = ArrayBuilder::with_defaults()
            .build(data, &DefaultFormatter, None)
            .unwrap();
        assert!(array.is_sorted());
        assert_eq!(array.rows()[0].amount, -9.0);
        assert_eq!(array.rows()[3].row_value, 5);
    }

    #[test]
    fn test_expected_rows() {
        let data = vec![tuple(0, false, false); 200];
        let (array, report) = ArrayBuilder::with_defaults()
            .build_with_report(data, &TupleFormatter, Some(200))
            .unwrap();
        assert_eq!(array.len(), 200);
        assert_eq!(report.buckets, 1);
        assert_eq!(array.iter().map(|r| r.row_value).sum::<u32>(), 0);
    }

    #[test]
    fn test_expected_rows_too_many() {
        let data = vec![tuple(0, false, false); 200];
        let err = ArrayBuilder::with_defaults()
            .build(data, &TupleFormatter, Some(100))
            .unwrap_err();
        assert!(matches!(err, ArrayError::TooManyRows { expected: 100 }));
    }

    #[test]
    fn test_too_many_rows_fails_at_first_surplus_record() {
        let formatter = FormatFn(|i: &usize, _: &RowSchema| -> FormatResult<Vec<Value>> {
            assert!(*i < 100, "record {} should never be encoded", i);
            Ok(Row::new(*i as u32, 0, 1.0).to_values())
        });
        let err = ArrayBuilder::with_defaults()
            .build(0..200usize, &formatter, Some(100))
            .unwrap_err();
        assert!(matches!(err, ArrayError::TooManyRows { expected: 100 }));
    }

    #[test]
    fn test_expected_rows_fewer_records_trims() {
        let data = vec![tuple(0, false, false); 3];
        let array = ArrayBuilder::with_defaults()
            .build(data, &TupleFormatter, Some(10))
            .unwrap();
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn test_zero_expected_rows_uses_buckets() {
        let data = vec![tuple(0, false, false); 3];
        let (array, report) = ArrayBuilder::new(BuildConfig::new().with_bucket_size(2))
            .build_with_report(data, &TupleFormatter, Some(0))
            .unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(report.buckets, 2);
    }

    #[test]
    fn test_chunk_data() {
        let data = vec![tuple(0, false, false); 90_000];
        let (array, report) = ArrayBuilder::with_defaults()
            .build_with_report(data, &TupleFormatter, None)
            .unwrap();
        assert_eq!(array.len(), 90_000);
        assert_eq!(report.buckets, 4);
        assert_eq!(array.iter().map(|r| r.row_value).sum::<u32>(), 0);
    }

    #[test]
    fn test_bucket_boundary() {
        let formatter = FormatFn(|i: &u32, _: &RowSchema| -> FormatResult<Vec<Value>> {
            Ok(Row::new(*i, 0, 1.0).to_values())
        });
        let (array, report) = ArrayBuilder::with_defaults()
            .build_with_report(0..25_001u32, &formatter, None)
            .unwrap();
        assert_eq!(report.buckets, 2);
        assert_eq!(array.len(), 25_001);
        for (i, row) in array.iter().enumerate() {
            assert_eq!(row.row_value, i as u32);
        }
    }

    #[test]
    fn test_empty_input() {
        let data: Vec<Vec<Value>> = Vec::new();
        let (array, report) = ArrayBuilder::with_defaults()
            .build_with_report(data, &TupleFormatter, None)
            .unwrap();
        assert!(array.is_empty());
        assert_eq!(report.buckets, 0);
    }

    #[test]
    fn test_format_error_reports_row() {
        let data = vec![
            Record::fields([("row", 1), ("amount", 1)]),
            Record::fields([("row", 2)]),
        ];
        let err = ArrayBuilder::with_defaults()
            .build(data, &DefaultFormatter, None)
            .unwrap_err();
        match err {
            ArrayError::Format { row, source } => {
                assert_eq!(row, 1);
                assert_eq!(source, FormatError::MissingField("amount".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_zero_bucket_size_rejected() {
        let builder = ArrayBuilder::new(BuildConfig::new().with_bucket_size(0));
        let err = builder
            .build(Vec::<Vec<Value>>::new(), &TupleFormatter, None)
            .unwrap_err();
        assert!(matches!(err, ArrayError::Config(_)));
    }

    #[test]
    fn test_build_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("array.npy");
        let data = vec![tuple(0, false, false), tuple(12, true, true)];

        let written = ArrayBuilder::with_defaults()
            .build_to_file(data, &TupleFormatter, None, &path)
            .unwrap();
        assert_eq!(written, path);

        let back = RowArray::load(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.rows()[1].flip);
    }

    #[test]
    fn test_failed_build_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("array.npy");
        let data = vec![tuple(0, false, false); 200];

        let err = ArrayBuilder::with_defaults()
            .build_to_file(data, &TupleFormatter, Some(100), &path)
            .unwrap_err();
        assert!(matches!(err, ArrayError::TooManyRows { .. }));
        assert!(!path.exists());
    }
}
