//! Data package writer
//!
//! Builds every resource, describes it in a `datapackage.json` manifest and
//! emits the result in one of three modes (see [`PackageOptions`]):
//!
//! - Archive: resources and manifest are staged in a private temporary
//!   directory, then zipped into `<dir>/<safe name>.zip` with flat entry
//!   names. The archive is written beside its destination and renamed into
//!   place, so an existing archive is only replaced by a complete one.
//! - Directory: resources and manifest are written into `<dir>` directly.
//!   Files written by a failed call are removed again.
//! - In memory: arrays, index records and manifest are returned; nothing
//!   touches the filesystem.
//!
//! Every resource file is named `<random hex>.npy` (or `.json` for index
//! resources); the manifest maps these names back to logical names.

use crate::error::{PackageError, PackageResult};
use crate::fs::safe_filename;
use crate::manifest::{
    build_manifest, generate_id, validate_name, DataPackage, ResourceDescriptor, ResourceFormat,
    DATAPACKAGE_FILE,
};
use crate::options::{ConfigError, PackageOptions};
use crate::reader::PackageContents;
use crate::resource::{IndexResource, PackageRequest, Resource};
use calcpack_array::{ArrayBuilder, RowArray};
use calcpack_keys::{as_unique_attributes, AttributeRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Extension of compressed packages
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Descriptor key listing the fields selected for an index resource
pub const INDEX_FIELDS_KEY: &str = "fields";

/// Result of one packaging call
#[derive(Debug)]
pub enum PackageOutput {
    /// Path of the written zip archive
    Archive(PathBuf),
    /// Directory holding the loose package files
    Directory(PathBuf),
    /// Arrays, index records and manifest, keyed by generated file name
    InMemory(PackageContents),
}

impl PackageOutput {
    /// Filesystem location, if anything was written
    pub fn path(&self) -> Option<&Path> {
        match self {
            PackageOutput::Archive(path) | PackageOutput::Directory(path) => Some(path),
            PackageOutput::InMemory(_) => None,
        }
    }

    /// In-memory contents, if built in memory
    pub fn into_contents(self) -> Option<PackageContents> {
        match self {
            PackageOutput::InMemory(contents) => Some(contents),
            _ => None,
        }
    }
}

/// Archive path for a package named `name` inside `directory`
pub fn archive_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{}.{}", safe_filename(name, true), ARCHIVE_EXTENSION))
}

/// Removes files written into a caller directory unless committed
struct WrittenFiles {
    paths: Vec<PathBuf>,
    committed: bool,
}

impl WrittenFiles {
    fn new() -> Self {
        WrittenFiles {
            paths: Vec::new(),
            committed: false,
        }
    }

    fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for WrittenFiles {
    fn drop(&mut self) {
        if !self.committed {
            for path in &self.paths {
                let _ = fs::remove_file(path);
            }
        }
    }
}

/// Writer for data packages
#[derive(Debug, Clone, Default)]
pub struct PackageWriter {
    options: PackageOptions,
}

impl PackageWriter {
    /// Create a writer with the given options
    pub fn new(options: PackageOptions) -> Self {
        Self { options }
    }

    /// Create a writer with default options (replacing zip archive)
    pub fn with_defaults() -> Self {
        Self::new(PackageOptions::default())
    }

    /// Writer options
    pub fn options(&self) -> &PackageOptions {
        &self.options
    }

    /// Build and emit a package
    ///
    /// `directory` is ignored in memory and required otherwise. Options,
    /// name, target directory and archive conflicts are all checked before
    /// any record is encoded or any file is created.
    pub fn package(
        &self,
        directory: Option<&Path>,
        request: PackageRequest<'_>,
    ) -> PackageResult<PackageOutput> {
        self.options.validate()?;
        validate_name(&request.name)?;

        if self.options.in_memory {
            return self.package_in_memory(request).map(PackageOutput::InMemory);
        }

        let directory = directory.ok_or(ConfigError::MissingDirectory)?;
        if !directory.is_dir() {
            return Err(PackageError::NotADirectory(directory.to_path_buf()));
        }

        if self.options.compress {
            self.package_archive(directory, request)
                .map(PackageOutput::Archive)
        } else {
            self.package_directory(directory, request)
                .map(PackageOutput::Directory)
        }
    }

    fn builder(&self) -> ArrayBuilder {
        ArrayBuilder::new(self.options.build.clone())
    }

    fn package_in_memory(&self, request: PackageRequest<'_>) -> PackageResult<PackageContents> {
        let PackageRequest {
            name,
            resources,
            indices,
            id,
            metadata,
        } = request;

        let mut arrays = BTreeMap::new();
        let mut index_records = BTreeMap::new();
        let mut descriptors = Vec::with_capacity(resources.len() + indices.len());

        for resource in resources {
            let (descriptor, array) = self.build_resource(resource, None, None)?;
            arrays.insert(descriptor.path.clone(), array);
            descriptors.push(descriptor);
        }
        for index in indices {
            let (descriptor, records) = self.build_index(index, None, None)?;
            index_records.insert(descriptor.path.clone(), records);
            descriptors.push(descriptor);
        }

        let contents = PackageContents {
            datapackage: build_manifest(&name, descriptors, id.as_deref(), &metadata)?,
            arrays,
            indices: index_records,
        };
        debug!(
            target: "calcpack::package",
            name = %name,
            arrays = contents.arrays.len(),
            indices = contents.indices.len(),
            "Built in-memory package"
        );
        Ok(contents)
    }

    fn package_directory(
        &self,
        directory: &Path,
        request: PackageRequest<'_>,
    ) -> PackageResult<PathBuf> {
        let manifest_path = directory.join(DATAPACKAGE_FILE);
        if manifest_path.exists() && !self.options.replace {
            return Err(PackageError::Conflict(manifest_path));
        }

        let mut written = WrittenFiles::new();
        let manifest = self.write_resources(directory, request, Some(&mut written))?;

        // Manifest last; a half-written package never has one
        let temp_path = manifest_path.with_extension("json.tmp");
        written.push(temp_path.clone());
        fs::write(&temp_path, manifest.to_json_pretty()?)?;
        fs::rename(&temp_path, &manifest_path)?;
        written.commit();

        info!(
            target: "calcpack::package",
            path = %directory.display(),
            resources = manifest.resources.len(),
            "Wrote package directory"
        );
        Ok(directory.to_path_buf())
    }

    fn package_archive(
        &self,
        directory: &Path,
        request: PackageRequest<'_>,
    ) -> PackageResult<PathBuf> {
        let archive = archive_path(directory, &request.name);
        if archive.exists() {
            if !self.options.replace {
                return Err(PackageError::Conflict(archive));
            }
            debug!(
                target: "calcpack::package",
                path = %archive.display(),
                "Replacing existing archive"
            );
        }

        // Removed on drop, whatever happens below
        let staging = tempfile::tempdir()?;
        let manifest = self.write_resources(staging.path(), request, None)?;
        fs::write(
            staging.path().join(DATAPACKAGE_FILE),
            manifest.to_json_pretty()?,
        )?;

        let temp_path = archive.with_extension("zip.tmp");
        match self.write_archive(staging.path(), &temp_path) {
            Ok(entries) => {
                fs::rename(&temp_path, &archive)?;
                info!(
                    target: "calcpack::package",
                    path = %archive.display(),
                    entries,
                    "Wrote package archive"
                );
                Ok(archive)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    /// Build and write every resource into `dir`, returning the manifest
    ///
    /// Files are tracked in `written` when the caller owns their cleanup.
    fn write_resources(
        &self,
        dir: &Path,
        request: PackageRequest<'_>,
        mut written: Option<&mut WrittenFiles>,
    ) -> PackageResult<DataPackage> {
        let PackageRequest {
            name,
            resources,
            indices,
            id,
            metadata,
        } = request;

        let mut descriptors = Vec::with_capacity(resources.len() + indices.len());
        for resource in resources {
            let (descriptor, _) = self.build_resource(resource, Some(dir), written.as_deref_mut())?;
            descriptors.push(descriptor);
        }
        for index in indices {
            let (descriptor, _) = self.build_index(index, Some(dir), written.as_deref_mut())?;
            descriptors.push(descriptor);
        }

        build_manifest(&name, descriptors, id.as_deref(), &metadata)
    }

    fn build_resource(
        &self,
        resource: Resource<'_>,
        dir: Option<&Path>,
        written: Option<&mut WrittenFiles>,
    ) -> PackageResult<(ResourceDescriptor, RowArray)> {
        let Resource {
            name,
            matrix,
            expected_rows,
            extra,
            records,
            formatter,
        } = resource;

        let filename = format!("{}.{}", generate_id(), ResourceFormat::Npy.extension());
        let (array, report) = self
            .builder()
            .build_with_report(records, &*formatter, expected_rows)
            .map_err(|e| PackageError::resource(name.as_str(), e))?;

        if let Some(dir) = dir {
            let path = dir.join(&filename);
            if let Some(written) = written {
                written.push(path.clone());
            }
            array.save(&path)?;
        }

        debug!(
            target: "calcpack::package",
            resource = %name,
            file = %filename,
            rows = report.rows,
            buckets = report.buckets,
            "Built array resource"
        );

        let descriptor = ResourceDescriptor::new(ResourceFormat::Npy, name, filename)
            .with_matrix(matrix)
            .with_extra(&extra)
            .hashed_in(dir)?;
        Ok((descriptor, array))
    }

    fn build_index(
        &self,
        index: IndexResource,
        dir: Option<&Path>,
        written: Option<&mut WrittenFiles>,
    ) -> PackageResult<(ResourceDescriptor, Vec<AttributeRecord>)> {
        let exclude: Vec<&str> = index.exclude.iter().map(String::as_str).collect();
        let include: Vec<&str> = index.include.iter().map(String::as_str).collect();
        let unique = as_unique_attributes(&index.records, &exclude, &include)?;

        let filename = format!("{}.{}", generate_id(), ResourceFormat::Json.extension());
        if let Some(dir) = dir {
            let path = dir.join(&filename);
            if let Some(written) = written {
                written.push(path.clone());
            }
            fs::write(&path, serde_json::to_vec_pretty(&unique.records)?)?;
        }

        debug!(
            target: "calcpack::package",
            resource = %index.name,
            file = %filename,
            records = unique.records.len(),
            fields = ?unique.fields,
            "Built index resource"
        );

        let mut descriptor = ResourceDescriptor::new(ResourceFormat::Json, index.name, filename)
            .with_extra(&index.extra);
        if let Some(matrix) = index.matrix {
            descriptor = descriptor.with_matrix(matrix);
        }
        descriptor.extra.insert(
            INDEX_FIELDS_KEY.to_string(),
            Value::from(unique.fields.iter().cloned().collect::<Vec<String>>()),
        );
        let descriptor = descriptor.hashed_in(dir)?;
        Ok((descriptor, unique.records))
    }

    /// Zip every file directly inside `staging` into `path`
    ///
    /// Entries are flat base names in file-name order.
    fn write_archive(&self, staging: &Path, path: &Path) -> PackageResult<usize> {
        let mut zip = ZipWriter::new(BufWriter::new(File::create(path)?));
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(self.options.compression.method());

        let mut entries = 0;
        for entry in WalkDir::new(staging)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            zip.start_file(name, options)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut zip)?;
            entries += 1;
        }

        let mut writer = zip.finish()?;
        writer.flush()?;
        Ok(entries)
    }
}

/// Build a package with the given options
///
/// Convenience wrapper around [`PackageWriter::package`].
pub fn create_package(
    directory: Option<&Path>,
    request: PackageRequest<'_>,
    options: PackageOptions,
) -> PackageResult<PackageOutput> {
    PackageWriter::new(options).package(directory, request)
}
