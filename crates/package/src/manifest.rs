//! `datapackage.json` manifest types and builder
//!
//! The manifest follows the Frictionless data-package layout:
//!
//! ```text
//! {
//!   "profile": "data-package",
//!   "name": "...",            [A-Za-z0-9_.-]*
//!   "id": "...",              caller-supplied or random hex
//!   "licenses": [{name, path, title}],
//!   "resources": [{format, mediatype, path, name, profile, matrix, md5?, ...}],
//!   "created": "...Z"         UTC ISO-8601
//! }
//! ```

use crate::error::{PackageError, PackageResult};
use crate::fs::md5_hex;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;
use std::path::Path;
use uuid::Uuid;

/// Manifest file name inside every package
pub const DATAPACKAGE_FILE: &str = "datapackage.json";

/// Profile tag of the package
pub const DATA_PACKAGE_PROFILE: &str = "data-package";

/// Profile tag of every resource
pub const DATA_RESOURCE_PROFILE: &str = "data-resource";

/// Descriptor keys owned by the builder; caller extras never replace them
pub const RESERVED_RESOURCE_KEYS: [&str; 7] =
    ["format", "mediatype", "path", "name", "profile", "matrix", "md5"];

/// Package keys owned by the builder
pub const RESERVED_PACKAGE_KEYS: [&str; 6] =
    ["profile", "name", "id", "licenses", "resources", "created"];

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]*$").expect("valid package name regex"));

/// Check a package name against the data-package naming convention
pub fn validate_name(name: &str) -> PackageResult<()> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(PackageError::invalid_name(name))
    }
}

// =============================================================================
// Licenses
// =============================================================================

/// One license entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Short identifier, e.g. `ODC-PDDL-1.0`
    pub name: String,
    /// URL of the license text
    pub path: String,
    /// Human-readable title
    pub title: String,
}

impl License {
    /// Open Data Commons Public Domain Dedication and License v1.0
    pub fn pddl() -> Self {
        License {
            name: "ODC-PDDL-1.0".to_string(),
            path: "http://opendatacommons.org/licenses/pddl/".to_string(),
            title: "Open Data Commons Public Domain Dedication and License v1.0".to_string(),
        }
    }

    /// License list used when the caller supplies none
    pub fn defaults() -> Vec<License> {
        vec![License::pddl()]
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Storage format of a resource file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    /// Binary row array
    Npy,
    /// Attribute records
    Json,
}

impl ResourceFormat {
    /// `format` tag
    pub fn tag(self) -> &'static str {
        match self {
            ResourceFormat::Npy => "npy",
            ResourceFormat::Json => "json",
        }
    }

    /// `mediatype` tag
    pub fn mediatype(self) -> &'static str {
        match self {
            ResourceFormat::Npy => "application/octet-stream",
            ResourceFormat::Json => "application/json",
        }
    }

    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        self.tag()
    }

    /// Parse a `format` tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "npy" => Some(ResourceFormat::Npy),
            "json" => Some(ResourceFormat::Json),
            _ => None,
        }
    }
}

/// Metadata for one resource file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Binary format tag
    pub format: String,
    /// Media type
    pub mediatype: String,
    /// File name relative to the package root
    pub path: String,
    /// Logical resource name
    pub name: String,
    /// Resource profile tag
    pub profile: String,
    /// Matrix this resource populates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<String>,
    /// MD5 of the written file; absent for in-memory packages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    /// Caller-supplied keys such as `description` or `title`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceDescriptor {
    /// Create a descriptor with the fixed keys filled in
    pub fn new(format: ResourceFormat, name: impl Into<String>, path: impl Into<String>) -> Self {
        ResourceDescriptor {
            format: format.tag().to_string(),
            mediatype: format.mediatype().to_string(),
            path: path.into(),
            name: name.into(),
            profile: DATA_RESOURCE_PROFILE.to_string(),
            matrix: None,
            md5: None,
            extra: Map::new(),
        }
    }

    /// Set the matrix role label
    pub fn with_matrix(mut self, matrix: impl Into<String>) -> Self {
        self.matrix = Some(matrix.into());
        self
    }

    /// Merge caller extras, skipping any reserved key
    pub fn with_extra(mut self, extra: &Map<String, Value>) -> Self {
        for (key, value) in extra {
            if !RESERVED_RESOURCE_KEYS.contains(&key.as_str()) {
                self.extra.insert(key.clone(), value.clone());
            }
        }
        self
    }

    /// Record the MD5 of the file at `dir/path`
    ///
    /// Without a directory the resource only exists in memory and no hash
    /// is recorded.
    pub fn hashed_in(mut self, dir: Option<&Path>) -> io::Result<Self> {
        if let Some(dir) = dir {
            self.md5 = Some(md5_hex(&dir.join(&self.path))?);
        }
        Ok(self)
    }

    /// Parsed `format` tag
    pub fn resource_format(&self) -> Option<ResourceFormat> {
        ResourceFormat::from_tag(&self.format)
    }
}

// =============================================================================
// Package
// =============================================================================

/// Optional package-level metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetadata {
    /// Licenses; defaults to a single public-domain dedication
    pub licenses: Option<Vec<License>>,
    /// Extra top-level keys (e.g. a random seed); reserved keys are ignored
    pub extra: Map<String, Value>,
}

impl PackageMetadata {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set licenses (builder pattern)
    pub fn with_licenses(mut self, licenses: Vec<License>) -> Self {
        self.licenses = Some(licenses);
        self
    }

    /// Add one extra top-level key (builder pattern)
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// The `datapackage.json` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPackage {
    /// Always `data-package`
    pub profile: String,
    /// Package name
    pub name: String,
    /// Unique package id
    pub id: String,
    /// License list
    pub licenses: Vec<License>,
    /// Resource descriptors, in the order they were supplied
    pub resources: Vec<ResourceDescriptor>,
    /// UTC creation timestamp
    pub created: String,
    /// Caller-supplied top-level keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataPackage {
    /// Look up a resource by logical name
    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Serialize as indented JSON
    pub fn to_json_pretty(&self) -> PackageResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse a manifest, checking its profile
    pub fn from_slice(data: &[u8]) -> PackageResult<Self> {
        let package: DataPackage = serde_json::from_slice(data)?;
        if package.profile != DATA_PACKAGE_PROFILE {
            return Err(PackageError::invalid_package(format!(
                "unexpected profile '{}'",
                package.profile
            )));
        }
        Ok(package)
    }
}

/// UTC timestamp in ISO-8601 form with microseconds and a `Z` suffix
pub fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Fresh random package id (32 lowercase hex digits)
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Assemble a manifest from resource descriptors
///
/// The name is checked first; nothing else is done for an invalid name.
pub fn build_manifest(
    name: &str,
    resources: Vec<ResourceDescriptor>,
    id: Option<&str>,
    metadata: &PackageMetadata,
) -> PackageResult<DataPackage> {
    validate_name(name)?;

    let extra = metadata
        .extra
        .iter()
        .filter(|(key, _)| !RESERVED_PACKAGE_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(DataPackage {
        profile: DATA_PACKAGE_PROFILE.to_string(),
        name: name.to_string(),
        id: id.map(str::to_string).unwrap_or_else(generate_id),
        licenses: metadata.licenses.clone().unwrap_or_else(License::defaults),
        resources,
        created: utc_timestamp(),
        extra,
    })
}
