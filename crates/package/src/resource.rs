//! Package inputs: array resources, index resources and the request

use crate::manifest::PackageMetadata;
use calcpack_array::{DefaultFormatter, RowFormatter};
use calcpack_core::Record;
use calcpack_keys::AttributeRecord;
use serde_json::{Map, Value};
use std::fmt;

/// Boxed record stream feeding one array resource
pub type RecordStream<'a> = Box<dyn Iterator<Item = Record> + 'a>;

/// Boxed formatting strategy
pub type BoxedFormatter<'a> = Box<dyn RowFormatter<Record> + 'a>;

/// One binary array resource, built from raw records at packaging time
pub struct Resource<'a> {
    /// Logical name recorded in the manifest
    pub name: String,
    /// Matrix this resource populates
    pub matrix: String,
    /// Declared row count; switches the builder to pre-counted mode
    pub expected_rows: Option<usize>,
    /// Extra descriptor keys (`description`, `title`, ...)
    pub extra: Map<String, Value>,
    pub(crate) records: RecordStream<'a>,
    pub(crate) formatter: BoxedFormatter<'a>,
}

impl<'a> Resource<'a> {
    /// Create a resource using the default formatter
    pub fn new<I>(name: impl Into<String>, matrix: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'a,
    {
        Resource {
            name: name.into(),
            matrix: matrix.into(),
            expected_rows: None,
            extra: Map::new(),
            records: Box::new(records.into_iter()),
            formatter: Box::new(DefaultFormatter),
        }
    }

    /// Declare the number of records in advance
    pub fn with_expected_rows(mut self, rows: usize) -> Self {
        self.expected_rows = Some(rows);
        self
    }

    /// Replace the formatting strategy
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: RowFormatter<Record> + 'a,
    {
        self.formatter = Box::new(formatter);
        self
    }

    /// Add an extra descriptor key
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for Resource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("matrix", &self.matrix)
            .field("expected_rows", &self.expected_rows)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

/// Attribute records describing what integer ids mean
///
/// Stored as JSON after reduction to a minimal identifying key.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexResource {
    /// Logical name recorded in the manifest
    pub name: String,
    /// Matrix whose rows or columns these records identify
    pub matrix: Option<String>,
    /// Records, each carrying an `id`
    pub records: Vec<AttributeRecord>,
    /// Fields never used to distinguish records
    pub exclude: Vec<String>,
    /// Fields kept in the output regardless of selection
    pub include: Vec<String>,
    /// Extra descriptor keys
    pub extra: Map<String, Value>,
}

impl IndexResource {
    /// Create an index resource
    pub fn new(name: impl Into<String>, records: Vec<AttributeRecord>) -> Self {
        IndexResource {
            name: name.into(),
            matrix: None,
            records,
            exclude: Vec::new(),
            include: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Set the matrix role label
    pub fn with_matrix(mut self, matrix: impl Into<String>) -> Self {
        self.matrix = Some(matrix.into());
        self
    }

    /// Exclude fields from key selection
    pub fn with_exclude<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Always keep these fields
    pub fn with_include<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.include.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add an extra descriptor key
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Everything needed to build one package
#[derive(Debug)]
pub struct PackageRequest<'a> {
    /// Package name
    pub name: String,
    /// Array resources, in manifest order
    pub resources: Vec<Resource<'a>>,
    /// Index resources, listed after the arrays
    pub indices: Vec<IndexResource>,
    /// Package id; random when absent
    pub id: Option<String>,
    /// Licenses and extra top-level keys
    pub metadata: PackageMetadata,
}

impl<'a> PackageRequest<'a> {
    /// Empty request for a named package
    pub fn new(name: impl Into<String>) -> Self {
        PackageRequest {
            name: name.into(),
            resources: Vec::new(),
            indices: Vec::new(),
            id: None,
            metadata: PackageMetadata::default(),
        }
    }

    /// Append an array resource
    pub fn with_resource(mut self, resource: Resource<'a>) -> Self {
        self.resources.push(resource);
        self
    }

    /// Append an index resource
    pub fn with_index(mut self, index: IndexResource) -> Self {
        self.indices.push(index);
        self
    }

    /// Fix the package id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set package metadata
    pub fn with_metadata(mut self, metadata: PackageMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
