//! Packaging options.
//!
//! Three mutually exclusive output modes are selected by two flags:
//!
//! | `compress` | `in_memory` | output |
//! |---|---|---|
//! | true | false | `<dir>/<safe name>.zip` |
//! | false | false | loose files in `<dir>` |
//! | false | true | `InMemoryPackage`, no filesystem writes |
//! | true | true | rejected by `validate()` |

use calcpack_array::{BuildConfig, BuildConfigError};

/// Compression applied to archive entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveCompression {
    /// No compression.
    Stored,
    /// Deflate (default).
    #[default]
    Deflated,
}

impl ArchiveCompression {
    /// Corresponding zip compression method.
    pub fn method(self) -> zip::CompressionMethod {
        match self {
            ArchiveCompression::Stored => zip::CompressionMethod::Stored,
            ArchiveCompression::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

/// Options for one packaging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    /// Overwrite an existing archive of the same name (default: true).
    pub replace: bool,
    /// Bundle everything into one zip archive (default: true).
    pub compress: bool,
    /// Return arrays and manifest instead of writing files (default: false).
    pub in_memory: bool,
    /// Archive entry compression (default: deflate).
    pub compression: ArchiveCompression,
    /// Array builder configuration used for every resource.
    pub build: BuildConfig,
}

impl Default for PackageOptions {
    fn default() -> Self {
        PackageOptions {
            replace: true,
            compress: true,
            in_memory: false,
            compression: ArchiveCompression::default(),
            build: BuildConfig::default(),
        }
    }
}

impl PackageOptions {
    /// Create options with default values (compressed archive).
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for an in-memory package.
    pub fn in_memory() -> Self {
        PackageOptions {
            compress: false,
            in_memory: true,
            ..Self::default()
        }
    }

    /// Options for a loose directory package.
    pub fn directory() -> Self {
        PackageOptions {
            compress: false,
            ..Self::default()
        }
    }

    /// Set replace policy (builder pattern).
    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Set archive compression flag (builder pattern).
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set in-memory flag (builder pattern).
    pub fn with_in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Set archive entry compression (builder pattern).
    pub fn with_compression(mut self, compression: ArchiveCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Set array builder configuration (builder pattern).
    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.in_memory && self.compress {
            return Err(ConfigError::InMemoryCompressed);
        }
        self.build.validate()?;
        Ok(())
    }

    /// Create options suitable for tests (small buckets, uncompressed entries).
    pub fn for_testing() -> Self {
        PackageOptions {
            compression: ArchiveCompression::Stored,
            build: BuildConfig::for_testing(),
            ..Self::default()
        }
    }
}

/// Packaging configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// In-memory output cannot be compressed.
    #[error("in_memory and compress are mutually exclusive")]
    InMemoryCompressed,

    /// File output was requested without a target directory.
    #[error("A target directory is required unless in_memory is set")]
    MissingDirectory,

    /// Invalid array builder configuration.
    #[error(transparent)]
    Build(#[from] BuildConfigError),
}
