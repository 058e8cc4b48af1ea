//! BatchResize - Concurrent Batch Image Resizer
//!
//! Resizes one image, or every image directly inside a directory, to a
//! target height or width while keeping the aspect ratio. Results are
//! written to a `Resized_Images` directory next to the input, named
//! `h<value>-<name>` or `w<value>-<name>`.
//!
//! # Architecture
//!
//! - [`parallel`]: promise, worker pool, fan-in combinator and result
//!   aggregator
//! - [`processing`]: image backend, discovery, output directory
//! - [`batch`]: the orchestrator tying them together
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use batchresize::{BatchResizer, ProcessingConfig, ResizeSpec};
//! use std::path::Path;
//!
//! # async fn example() -> batchresize::Result<()> {
//! let resizer = BatchResizer::new(&ProcessingConfig::default());
//! let report = resizer
//!     .run(Path::new("holiday_photos"), ResizeSpec::height(300)?)
//!     .await?;
//!
//! println!("Saved {} images", report.saved_count());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod parallel;
pub mod processing;

// Re-export commonly used types
pub use batch::{BatchMode, BatchReport, BatchResizer};
pub use config::{Axis, Config, LoggingConfig, ProcessingConfig, ResizeSpec, SaveStrategy};
pub use error::{Result, BatchResizeError};
pub use parallel::{await_all, BatchOutcome, Promise, Resolver, ResultAggregator, WorkerPool};
pub use processing::{ImageBackend, ImageCrateBackend, OutputDir, ProcessingEngine, OUTPUT_DIR_NAME};

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless; only the first subscriber is installed.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.json_format {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        info!("BatchResize v{} initialized", VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_init_logging_twice() {
        // Should not fail on multiple calls
        init_logging(&LoggingConfig::default());
        init_logging(&LoggingConfig {
            level: "debug".to_string(),
            json_format: true,
        });
    }
}
