//! Error types for sieve.
//!
//! Errors are organized by concern so that a failed decision can be logged
//! with the file it concerns and the stage that failed.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sieve operations.
#[derive(Error, Debug)]
pub enum SieveError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Work could not be handed to the worker pool
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or write the config file
    #[error("Failed to access config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize configuration
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, organized by stage. Every variant names the file involved.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Folder could not be listed
    #[error("Cannot read folder {path}: {message}")]
    FolderUnreadable { path: PathBuf, message: String },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// JPEG encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// EXIF serialization failed
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Archive copy or output write failed
    #[error("Write failed for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No base output directory could be resolved
    #[error("No output directory for {0}: no folder loaded and no central folder set")]
    NoOutputDirectory(PathBuf),

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

impl PipelineError {
    /// Path of the file this error concerns.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::FolderUnreadable { path, .. }
            | Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::Metadata { path, .. }
            | Self::Write { path, .. }
            | Self::FileTooLarge { path, .. }
            | Self::ImageTooLarge { path, .. }
            | Self::UnsupportedFormat { path, .. } => path,
            Self::NoOutputDirectory(path) | Self::FileNotFound(path) => path,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised when handing work to the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Shutdown has begun; no new work is accepted
    #[error("dispatcher is shutting down; job for {0} rejected")]
    ShuttingDown(PathBuf),
}

/// Why a dispatched job did not produce a result.
#[derive(Error, Debug)]
pub enum JobError {
    /// The pipeline reported an error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The job panicked or was torn down before finishing
    #[error("worker task failed: {0}")]
    Panicked(String),
}

/// Convenience type alias for sieve results.
pub type Result<T> = std::result::Result<T, SieveError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
