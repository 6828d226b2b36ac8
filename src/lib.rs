//! calcpack - processed data packages for matrix calculations
//!
//! Turns loosely structured numeric exchange records into portable data
//! packages:
//!
//! 1. Records are encoded into fixed-width canonical rows ([`RowEncoder`])
//! 2. Rows are collected into sorted arrays with bounded memory ([`ArrayBuilder`])
//! 3. Attribute records are reduced to a minimal identifying key
//!    ([`as_unique_attributes`])
//! 4. Arrays and index records are described in a `datapackage.json`
//!    manifest and written as a zip archive, a directory, or kept in
//!    memory ([`PackageWriter`])
//!
//! # Quick Start
//!
//! ```ignore
//! use calcpack::{PackageOptions, PackageRequest, PackageWriter, Record, Resource};
//!
//! let records = vec![
//!     Record::fields([("row", 1), ("col", 2), ("amount", 3)]),
//!     Record::fields([("row", 1), ("amount", 1)]),
//! ];
//! let request = PackageRequest::new("my-package")
//!     .with_resource(Resource::new("exchanges", "technosphere_matrix", records));
//! let archive = PackageWriter::new(PackageOptions::default()).package(Some(dir), request)?;
//! ```

pub use calcpack_array::{
    chunked, ArrayBuilder, ArrayError, ArrayResult, BuildConfig, BuildReport, DefaultFormatter,
    DictionaryFormatter, FormatFn, RowArray, RowEncoder, RowFormatter, TupleFormatter,
};
pub use calcpack_core::{
    FieldKind, FieldSpec, FormatError, FormatResult, Record, Row, RowSchema, Value,
    MAX_SIGNED_32BIT_INT,
};
pub use calcpack_keys::{
    as_unique_attributes, greedy_set_cover, AttributeRecord, KeyError, KeyResult,
    UniqueAttributes,
};
pub use calcpack_package::{
    build_manifest, create_package, safe_filename, validate_name, ArchiveCompression,
    DataPackage, IndexResource, License, PackageContents, PackageError, PackageMetadata,
    PackageOptions, PackageOutput, PackageReader, PackageRequest, PackageResult, PackageWriter,
    Resource, ResourceDescriptor,
};
