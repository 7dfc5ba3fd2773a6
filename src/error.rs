//! Error types and handling for roadstore

use std::path::{Path, PathBuf};

/// Result type alias for roadstore operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error taxonomy for the artifact loading and publishing pipeline.
///
/// All file- and format-level errors abort the publish cycle; only
/// identity-marker mismatches are recovered locally (they are reported
/// through the validation report, never through this type's `Err` path).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Missing or unusable configuration, surfaced before any file I/O
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required artifact file does not exist
    #[error("Missing {artifact} file: {path}")]
    MissingFile { artifact: &'static str, path: PathBuf },

    /// An artifact file (or a core structure it declares) is empty
    #[error("Empty {artifact} file: {message}")]
    EmptyFile { artifact: &'static str, message: String },

    /// An artifact file ends before its fixed header is complete
    #[error("Truncated header in {artifact} file: {path}")]
    TruncatedHeader { artifact: &'static str, path: PathBuf },

    /// An artifact file ends before `count * element_size` payload bytes
    #[error("Truncated payload in {artifact} file: expected {expected} bytes")]
    TruncatedPayload { artifact: &'static str, expected: u64 },

    /// Section offset or size arithmetic left the addressable range
    #[error("Layout overflow while placing section {section}")]
    LayoutOverflow { section: &'static str },

    /// The platform denied a shared allocation request
    #[error("Allocation failed for region {name}: {message}")]
    AllocationFailed { name: String, message: String },

    /// The graph artifact was produced by a different toolchain build.
    /// Warning-level; carried in the validation report, not fatal.
    #[error("Identity mismatch: artifact {actual} vs toolchain {expected}")]
    IdentityMismatch { expected: String, actual: String },

    /// The graph file ends before its checksum field
    #[error("Checksum unavailable in graph file: {path}")]
    ChecksumUnavailable { path: PathBuf },

    /// No generation has been published under the given control region
    #[error("No published generation available")]
    NotPublished,

    /// Invalid parameters passed across an internal API seam
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// I/O related errors (file operations, mmap, etc.)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl StoreError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing-file error
    pub fn missing_file(artifact: &'static str, path: &Path) -> Self {
        Self::MissingFile {
            artifact,
            path: path.to_path_buf(),
        }
    }

    /// Create an empty-file error
    pub fn empty_file(artifact: &'static str, message: impl Into<String>) -> Self {
        Self::EmptyFile {
            artifact,
            message: message.into(),
        }
    }

    /// Create a truncated-header error
    pub fn truncated_header(artifact: &'static str, path: &Path) -> Self {
        Self::TruncatedHeader {
            artifact,
            path: path.to_path_buf(),
        }
    }

    /// Create a truncated-payload error
    pub fn truncated_payload(artifact: &'static str, expected: u64) -> Self {
        Self::TruncatedPayload { artifact, expected }
    }

    /// Create a layout-overflow error
    pub fn layout_overflow(section: &'static str) -> Self {
        Self::LayoutOverflow { section }
    }

    /// Create an allocation-failed error
    pub fn allocation_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AllocationFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}
