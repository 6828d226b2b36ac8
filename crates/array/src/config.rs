//! Array builder configuration.

/// Rows per bucket when the row count is not known in advance.
pub const DEFAULT_BUCKET_SIZE: usize = 25_000;

/// Array builder configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Rows encoded per bucket in bucketed mode (default: 25,000).
    ///
    /// Peak memory while encoding is bounded by one bucket of raw records
    /// plus the completed, trimmed buckets.
    pub bucket_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl BuildConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bucket size (builder pattern).
    pub fn with_bucket_size(mut self, size: usize) -> Self {
        self.bucket_size = size;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), BuildConfigError> {
        if self.bucket_size == 0 {
            return Err(BuildConfigError::ZeroBucketSize);
        }
        Ok(())
    }

    /// Create a configuration optimized for testing (small buckets).
    pub fn for_testing() -> Self {
        BuildConfig { bucket_size: 16 }
    }
}

/// Array builder configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildConfigError {
    /// Bucket size must hold at least one row.
    #[error("Bucket size must be at least 1")]
    ZeroBucketSize,
}
