//! Error types and handling for BatchResize

use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for BatchResize operations
pub type Result<T> = std::result::Result<T, BatchResizeError>;

/// Main error type for BatchResize operations
#[derive(Debug, Error)]
pub enum BatchResizeError {
    /// Bad command-line arguments
    #[error("Invalid usage: {message}")]
    Usage { message: String },

    /// Target path is missing or unreadable
    #[error("Cannot access {path:?}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file passed directly is not an image
    #[error("invalid image file: {path:?}")]
    InvalidImage { path: PathBuf },

    /// Image bytes could not be decoded
    #[error("Failed to decode {path:?}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Resampling failed
    #[error("Failed to resize {path:?}: {message}")]
    Resize { path: PathBuf, message: String },

    /// Resized image could not be written
    #[error("Failed to save {path:?}: {message}")]
    Save { path: PathBuf, message: String },

    /// Output directory could not be created
    #[error("Failed to create output directory {path:?}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A task finished without settling its promise
    #[error("Task abandoned before settling: {message}")]
    TaskAbandoned { message: String },

    /// At least one task of a batch failed
    #[error("Batch failed after {completed} of {total} images")]
    Batch {
        completed: usize,
        total: usize,
        #[source]
        source: Box<BatchResizeError>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl BatchResizeError {
    /// Create a new usage error
    pub fn usage<S: Into<String>>(message: S) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create a new path access error
    pub fn path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Path {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_image(path: impl Into<PathBuf>) -> Self {
        Self::InvalidImage { path: path.into() }
    }

    pub fn decode<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn resize<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::Resize {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn save<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::Save {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    pub fn task_abandoned<S: Into<String>>(message: S) -> Self {
        Self::TaskAbandoned {
            message: message.into(),
        }
    }

    /// Wrap the first failure of a batch with its completion counts
    pub fn batch(completed: usize, total: usize, source: BatchResizeError) -> Self {
        Self::Batch {
            completed,
            total,
            source: Box::new(source),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Innermost error, looking through batch wrappers
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Batch { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Number of images that completed before a batch failure, if known
    pub fn completed_count(&self) -> Option<usize> {
        match self {
            Self::Batch { completed, .. } => Some(*completed),
            _ => None,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Path { path, .. }
            | Self::InvalidImage { path }
            | Self::Decode { path, .. }
            | Self::Resize { path, .. }
            | Self::Save { path, .. }
            | Self::DirectoryCreate { path, .. } => Some(path),
            Self::Batch { source, .. } => source.file_path(),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for BatchResizeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serde(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for BatchResizeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serde(format!("YAML parsing error: {}", err))
    }
}

/// Attach a file path to errors coming out of the imaging library
pub trait ImagingContext<T> {
    fn decode_context(self, path: &Path) -> Result<T>;
    fn resize_context(self, path: &Path) -> Result<T>;
    fn save_context(self, path: &Path) -> Result<T>;
}

impl<T, E: Display> ImagingContext<T> for std::result::Result<T, E> {
    fn decode_context(self, path: &Path) -> Result<T> {
        self.map_err(|e| BatchResizeError::decode(path, e.to_string()))
    }

    fn resize_context(self, path: &Path) -> Result<T> {
        self.map_err(|e| BatchResizeError::resize(path, e.to_string()))
    }

    fn save_context(self, path: &Path) -> Result<T> {
        self.map_err(|e| BatchResizeError::save(path, e.to_string()))
    }
}
