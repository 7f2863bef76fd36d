//! Error types for the snaplabel classification pipeline.
//!
//! Errors are organized by stage so a failed cycle can be logged with the
//! file and stage that broke. None of these reach the user as a visible state:
//! the controller logs and swallows them.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for snaplabel operations.
#[derive(Error, Debug)]
pub enum SnaplabelError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image picker errors
    #[error("Picker error: {0}")]
    Pick(#[from] PickError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by an image picker.
///
/// A user cancelling the chooser is not an error; see `PickOutcome::Canceled`.
#[derive(Error, Debug)]
pub enum PickError {
    /// The user (or the OS) refused access to the image source
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The picked file does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The picker itself could not run (no terminal, chooser crashed, ...)
    #[error("Picker unavailable: {0}")]
    Unavailable(String),

    /// Any other I/O failure while listing or checking images
    #[error("Picker IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PickError {
    /// Map an I/O error on `path` into the matching pick error.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.into()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.into()),
            _ => Self::Io(err),
        }
    }
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading the picked file failed
    #[error("Read error for {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// The picked file has no content
    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Model loading failed
    #[error("Failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    /// Forward pass failed
    #[error("Inference failed for {path}: {message}")]
    Inference { path: PathBuf, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

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

/// Convenience type alias for snaplabel results.
pub type Result<T> = std::result::Result<T, SnaplabelError>;
