//! Data package reader
//!
//! Loads a package wholesale from a directory or a `.zip` archive and
//! validates it:
//! - `datapackage.json` exists and has the data-package profile
//! - every resource path is a plain file name present in the package
//! - recorded MD5 hashes match the resource bytes
//! - binary arrays decode against the canonical row layout

use crate::error::{PackageError, PackageResult};
use crate::fs::md5_bytes;
use crate::manifest::{DataPackage, ResourceDescriptor, ResourceFormat, DATAPACKAGE_FILE};
use calcpack_array::RowArray;
use calcpack_keys::AttributeRecord;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Decoded package contents
///
/// Arrays and index records are keyed by their file name (`path` in the
/// manifest).
#[derive(Debug, Clone)]
pub struct PackageContents {
    /// The manifest
    pub datapackage: DataPackage,
    /// Binary array resources
    pub arrays: BTreeMap<String, RowArray>,
    /// Index resources
    pub indices: BTreeMap<String, Vec<AttributeRecord>>,
}

impl PackageContents {
    /// Array resource by logical name
    pub fn array(&self, name: &str) -> Option<&RowArray> {
        self.datapackage
            .resource(name)
            .and_then(|r| self.arrays.get(&r.path))
    }

    /// Index records by logical name
    pub fn index(&self, name: &str) -> Option<&[AttributeRecord]> {
        self.datapackage
            .resource(name)
            .and_then(|r| self.indices.get(&r.path))
            .map(Vec::as_slice)
    }

    /// Array resources populating `matrix`, in manifest order
    pub fn arrays_for_matrix<'a>(
        &'a self,
        matrix: &'a str,
    ) -> impl Iterator<Item = (&'a ResourceDescriptor, &'a RowArray)> + 'a {
        self.datapackage
            .resources
            .iter()
            .filter(move |r| r.matrix.as_deref() == Some(matrix))
            .filter_map(move |r| self.arrays.get(&r.path).map(|a| (r, a)))
    }
}

/// Where package files come from
enum Source {
    Directory(std::path::PathBuf),
    Archive(ZipArchive<BufReader<File>>),
}

impl Source {
    fn open(path: &Path) -> PackageResult<Self> {
        if path.is_dir() {
            Ok(Source::Directory(path.to_path_buf()))
        } else {
            let file = File::open(path)?;
            Ok(Source::Archive(ZipArchive::new(BufReader::new(file))?))
        }
    }

    fn read(&mut self, name: &str) -> PackageResult<Vec<u8>> {
        match self {
            Source::Directory(dir) => {
                let path = dir.join(name);
                if !path.is_file() {
                    return Err(PackageError::missing_file(name));
                }
                Ok(fs::read(path)?)
            }
            Source::Archive(archive) => {
                let mut entry = archive.by_name(name).map_err(|e| match e {
                    ZipError::FileNotFound => PackageError::missing_file(name),
                    other => PackageError::Zip(other),
                })?;
                let mut data = Vec::new();
                entry.read_to_end(&mut data)?;
                Ok(data)
            }
        }
    }
}

/// Reader for data packages
pub struct PackageReader;

impl PackageReader {
    /// Load and verify a package directory or archive
    pub fn open(path: &Path) -> PackageResult<PackageContents> {
        let mut source = Source::open(path)?;
        let datapackage = DataPackage::from_slice(&source.read(DATAPACKAGE_FILE)?)?;

        let mut arrays = BTreeMap::new();
        let mut indices = BTreeMap::new();
        for resource in &datapackage.resources {
            check_resource_path(&resource.path)?;
            let data = source.read(&resource.path)?;
            verify_checksum(resource, &data)?;

            match resource.resource_format() {
                Some(ResourceFormat::Npy) => {
                    arrays.insert(resource.path.clone(), RowArray::from_bytes(&data)?);
                }
                Some(ResourceFormat::Json) => {
                    let records: Vec<AttributeRecord> = serde_json::from_slice(&data)?;
                    indices.insert(resource.path.clone(), records);
                }
                None => {
                    return Err(PackageError::invalid_package(format!(
                        "resource '{}' has unknown format '{}'",
                        resource.name, resource.format
                    )))
                }
            }
        }

        debug!(
            target: "calcpack::package",
            path = %path.display(),
            arrays = arrays.len(),
            indices = indices.len(),
            "Read package"
        );
        Ok(PackageContents {
            datapackage,
            arrays,
            indices,
        })
    }

    /// Read only the manifest
    pub fn read_manifest(path: &Path) -> PackageResult<DataPackage> {
        let mut source = Source::open(path)?;
        DataPackage::from_slice(&source.read(DATAPACKAGE_FILE)?)
    }
}

/// Resource paths must be bare file names inside the package
fn check_resource_path(name: &str) -> PackageResult<()> {
    let path = Path::new(name);
    let plain = path.file_name().map(|f| f == path.as_os_str()).unwrap_or(false);
    if plain {
        Ok(())
    } else {
        Err(PackageError::invalid_package(format!(
            "resource path '{}' is not a plain file name",
            name
        )))
    }
}

fn verify_checksum(resource: &ResourceDescriptor, data: &[u8]) -> PackageResult<()> {
    if let Some(expected) = &resource.md5 {
        let actual = md5_bytes(data);
        if expected != &actual {
            return Err(PackageError::ChecksumMismatch {
                file: resource.path.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(())
}
