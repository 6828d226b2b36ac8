//! Array building for calcpack
//!
//! Turns arbitrary numeric records into canonical rows and collects them
//! into sorted arrays:
//!
//! - Encoder: pluggable `RowFormatter` strategies (tuple, named fields,
//!   closures) driving a `RowEncoder` that validates every field width
//! - Builder: bucketed or pre-counted construction with bounded memory
//! - RowArray: rows sorted by `(row_value, col_value, uncertainty_type, amount)`
//! - npy: portable binary row files (NPY v1.0 structured array layout)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod builder;
pub mod config;
pub mod encoder;
pub mod error;
pub mod npy;

pub use array::RowArray;
pub use builder::{chunked, ArrayBuilder, BuildReport, Chunked};
pub use config::{BuildConfig, BuildConfigError, DEFAULT_BUCKET_SIZE};
pub use encoder::{
    DefaultFormatter, DictionaryFormatter, FormatFn, RowEncoder, RowFormatter, TupleFormatter,
};
pub use error::{ArrayError, ArrayResult};
pub use npy::{NPY_EXTENSION, NPY_MAGIC};
