//! Portable data packages
//!
//! A package is a set of resource files plus a `datapackage.json` manifest:
//!
//! ```text
//! <safe name>.<md5 of name>.zip
//! ├── datapackage.json       manifest (name, id, licenses, resources, created)
//! ├── <hex>.npy              binary row array, one per array resource
//! └── <hex>.json             reduced attribute records, one per index resource
//! ```
//!
//! - `manifest`: manifest types, name validation, `build_manifest`
//! - `writer`: archive, directory and in-memory packaging
//! - `reader`: loads and verifies a package wholesale
//! - `fs`: MD5 hashing and portable file names
//!
//! ```ignore
//! let request = PackageRequest::new("my-package")
//!     .with_resource(Resource::new("flows", "technosphere", records).with_expected_rows(n));
//! let output = PackageWriter::with_defaults().package(Some(dir), request)?;
//! let contents = PackageReader::open(output.path().unwrap())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fs;
pub mod manifest;
pub mod options;
pub mod reader;
pub mod resource;
pub mod writer;

pub use error::{PackageError, PackageResult};
pub use fs::{md5_bytes, md5_hex, safe_filename};
pub use manifest::{
    build_manifest, validate_name, DataPackage, License, PackageMetadata, ResourceDescriptor,
    ResourceFormat, DATAPACKAGE_FILE,
};
pub use options::{ArchiveCompression, ConfigError, PackageOptions};
pub use reader::{PackageContents, PackageReader};
pub use resource::{IndexResource, PackageRequest, Resource};
pub use writer::{archive_path, create_package, PackageOutput, PackageWriter, INDEX_FIELDS_KEY};
