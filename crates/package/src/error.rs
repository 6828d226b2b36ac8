//! Package error types

use crate::options::ConfigError;
use calcpack_array::ArrayError;
use calcpack_keys::KeyError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or reading a data package
#[derive(Debug, Error)]
pub enum PackageError {
    /// Package name contains characters outside `[A-Za-z0-9_.-]`
    #[error("Invalid package name '{0}': only letters, digits, '_', '.' and '-' are allowed")]
    InvalidName(String),

    /// Target archive exists and replacing was not requested
    #[error("Package already exists: {}", .0.display())]
    Conflict(PathBuf),

    /// Mutually exclusive or invalid options
    #[error("Invalid package options: {0}")]
    Config(#[from] ConfigError),

    /// Target path is not an existing directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// File referenced by the manifest is missing
    #[error("Missing file in package: {0}")]
    MissingFile(String),

    /// Resource bytes do not match their recorded hash
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Resource file that failed verification
        file: String,
        /// Hash recorded in the manifest
        expected: String,
        /// Hash of the bytes found
        actual: String,
    },

    /// Manifest or package layout is malformed
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// A resource's records could not be built into an array
    #[error("Resource '{resource}': {source}")]
    Resource {
        /// Logical resource name
        resource: String,
        /// Underlying array error
        #[source]
        source: ArrayError,
    },

    /// Array encoding or decoding failed
    #[error("Array error: {0}")]
    Array(#[from] ArrayError),

    /// Identifying keys could not be selected
    #[error("Key selection error: {0}")]
    Keys(#[from] KeyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl PackageError {
    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Create a missing file error
    pub fn missing_file(path: impl Into<String>) -> Self {
        Self::MissingFile(path.into())
    }

    /// Create an invalid package error
    pub fn invalid_package(msg: impl Into<String>) -> Self {
        Self::InvalidPackage(msg.into())
    }

    /// Attach a resource name to an array error
    pub fn resource(resource: impl Into<String>, source: ArrayError) -> Self {
        Self::Resource {
            resource: resource.into(),
            source,
        }
    }
}

/// Result type for package operations
pub type PackageResult<T> = Result<T, PackageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PackageError::invalid_name("woo!");
        assert!(err.to_string().contains("woo!"));

        let err = PackageError::Conflict(PathBuf::from("/tmp/pkg.zip"));
        assert!(err.to_string().contains("pkg.zip"));

        let err = PackageError::ChecksumMismatch {
            file: "abc.npy".to_string(),
            expected: "111".to_string(),
            actual: "222".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc.npy"));
        assert!(msg.contains("111"));
        assert!(msg.contains("222"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            PackageError::missing_file("datapackage.json"),
            PackageError::MissingFile(_)
        ));
        assert!(matches!(
            PackageError::invalid_package("no resources"),
            PackageError::InvalidPackage(_)
        ));
        let err = PackageError::resource("flows", ArrayError::TooManyRows { expected: 3 });
        assert!(err.to_string().contains("flows"));
    }

    #[test]
    fn test_conversions() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(PackageError::from(io_err), PackageError::Io(_)));

        let err: PackageError = ConfigError::InMemoryCompressed.into();
        assert!(matches!(err, PackageError::Config(_)));

        let err: PackageError = KeyError::MissingId { index: 0 }.into();
        assert!(matches!(err, PackageError::Keys(_)));
    }
}
