//! Configuration management for BatchResize

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{Result, BatchResizeError};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batch processing settings
    pub processing: ProcessingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Batch processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of images resized at once (None = logical CPU count)
    pub workers: Option<usize>,

    /// When resized images are written to disk
    pub save_strategy: SaveStrategy,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: None,
            save_strategy: SaveStrategy::Deferred,
        }
    }
}

impl ProcessingConfig {
    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// When resized images are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStrategy {
    /// Every task saves its own output as soon as it is resized
    Immediate,
    /// Tasks keep resized images in memory; one sequential pass saves them
    /// after the whole batch succeeded
    Deferred,
}

/// Image dimension held to the target value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Height,
    Width,
}

impl Axis {
    /// Letter used in output file names
    pub fn letter(self) -> char {
        match self {
            Self::Height => 'h',
            Self::Width => 'w',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height => f.write_str("height"),
            Self::Width => f.write_str("width"),
        }
    }
}

/// Requested resize: one axis pinned to `value` pixels, the other derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeSpec {
    pub axis: Axis,
    pub value: u32,
}

impl ResizeSpec {
    pub fn new(axis: Axis, value: u32) -> Result<Self> {
        if value == 0 {
            return Err(BatchResizeError::usage(format!("{axis} must be a positive integer")));
        }
        Ok(Self { axis, value })
    }

    pub fn height(value: u32) -> Result<Self> {
        Self::new(Axis::Height, value)
    }

    pub fn width(value: u32) -> Result<Self> {
        Self::new(Axis::Width, value)
    }

    /// Output name prefix, e.g. `h300-`
    pub fn prefix(&self) -> String {
        format!("{}{}-", self.axis.letter(), self.value)
    }

    /// Output file name for a source file name, e.g. `photo.jpg` -> `h300-photo.jpg`
    pub fn output_file_name(&self, original: &OsStr) -> OsString {
        let mut name = OsString::from(self.prefix());
        name.push(original);
        name
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BatchResizeError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(BatchResizeError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.processing.workers == Some(0) {
            return Err(BatchResizeError::config(
                "Worker count must be greater than 0"
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(BatchResizeError::config(
                format!("Unknown log level '{}'. Expected one of {:?}", self.logging.level, LOG_LEVELS)
            ));
        }

        Ok(())
    }
}
