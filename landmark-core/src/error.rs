//! Error types for the landmark shard descriptor
//!
//! Error taxonomy covering the data-host fetch, archive extraction,
//! CSV conversion, integrity manifest, sharding and sample access.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for all descriptor operations
#[derive(Debug, Error)]
pub enum LandmarkError {
    // ========== Fetch Errors ==========

    /// Data-host request failed
    #[error("Data host request failed: {message}")]
    StorageError { message: String },

    /// Requested file does not exist on the data host
    #[error("Object not found: {key}")]
    ObjectNotFound { key: String },

    /// Data host rejected the supplied credentials
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// No credentials could be located
    #[error("Missing data-host credentials: {reason}")]
    MissingCredentials { reason: String },

    // ========== Filesystem Errors ==========

    /// Local filesystem operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be opened or extracted
    #[error("Archive {} could not be extracted: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    // ========== Conversion Errors ==========

    /// Tabular source is malformed
    #[error("CSV error in {}: {message}", .path.display())]
    Csv { path: PathBuf, message: String },

    /// A row could not be converted into sample arrays
    #[error("Row {row} could not be converted: {reason}")]
    Conversion { row: usize, reason: String },

    /// Array file could not be read or written
    #[error("Array file {} is unreadable: {message}", .path.display())]
    Npy { path: PathBuf, message: String },

    // ========== Manifest Errors ==========

    /// Manifest could not be serialized
    #[error("Manifest invalid: {reason}")]
    ManifestInvalid { reason: String },

    // ========== Sharding Errors ==========

    /// Rank/world-size pair is malformed or out of range
    #[error("Invalid shard spec: {reason}")]
    InvalidShardSpec { reason: String },

    /// Configuration file could not be loaded
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ========== Data Errors ==========

    /// Shard holds no samples, so shapes cannot be read
    #[error("Shard {rank} of {world_size} holds no samples")]
    DatasetEmpty { rank: u32, world_size: u32 },

    /// Index past the end of the shard
    #[error("Index {index} out of range for shard of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Target array is not one-dimensional
    #[error("Target shape error: expected a 1-dimensional keypoint vector, got {ndim} dimensions")]
    TargetShape { ndim: usize },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LandmarkError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LandmarkError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error indicates a corrupt or mismatched dataset
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            LandmarkError::ManifestInvalid { .. }
                | LandmarkError::Npy { .. }
                | LandmarkError::TargetShape { .. }
                | LandmarkError::Conversion { .. }
        )
    }
}

/// Result type alias for descriptor operations
pub type Result<T> = std::result::Result<T, LandmarkError>;
