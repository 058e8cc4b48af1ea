//! Shared output directory with race-safe, create-once semantics

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{Result, BatchResizeError};

/// Name of the directory results are written into
pub const OUTPUT_DIR_NAME: &str = "Resized_Images";

/// The `Resized_Images` directory of one batch.
///
/// Shared by every task of the batch. [`OutputDir::ensure`] may be called
/// from any number of threads at once; the directory is created at most once
/// and losing a creation race is not an error.
#[derive(Debug)]
pub struct OutputDir {
    path: PathBuf,
    ready: OnceCell<()>,
}

impl OutputDir {
    /// Output directory placed inside `parent`
    pub fn in_dir(parent: &Path) -> Self {
        Self {
            path: parent.join(OUTPUT_DIR_NAME),
            ready: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`OutputDir::ensure`] has already succeeded
    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    /// Create the directory if it does not exist yet
    pub fn ensure(&self) -> Result<&Path> {
        self.ready.get_or_try_init(|| create_if_absent(&self.path))?;
        Ok(&self.path)
    }
}

fn create_if_absent(path: &Path) -> Result<()> {
    match std::fs::create_dir(path) {
        Ok(()) => {
            info!("Created output directory: {}", path.display());
            Ok(())
        }
        // another process (or an earlier run) got there first
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => {
            debug!("Output directory already exists: {}", path.display());
            Ok(())
        }
        Err(e) => Err(BatchResizeError::directory_create(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use tempfile::TempDir;

    #[test]
    fn test_ensure_creates_once() {
        let temp = TempDir::new().unwrap();
        let output = OutputDir::in_dir(temp.path());

        assert!(!output.is_ready());
        assert!(!output.path().exists());

        let created = output.ensure().unwrap().to_path_buf();
        assert_eq!(created, temp.path().join(OUTPUT_DIR_NAME));
        assert!(created.is_dir());
        assert!(output.is_ready());

        // second call is a no-op
        output.ensure().unwrap();
    }

    #[test]
    fn test_concurrent_ensure() {
        let temp = TempDir::new().unwrap();
        let output = Arc::new(OutputDir::in_dir(temp.path()));
        let barrier = Arc::new(Barrier::new(32));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let output = Arc::clone(&output);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    output.ensure().map(Path::to_path_buf)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(output.path().is_dir());
    }

    #[test]
    fn test_independent_handles_race() {
        // Separate handles share no lock, so this exercises the AlreadyExists path
        let temp = TempDir::new().unwrap();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let parent = temp.path().to_path_buf();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let output = OutputDir::in_dir(&parent);
                    barrier.wait();
                    output.ensure().map(|_| ())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert!(temp.path().join(OUTPUT_DIR_NAME).is_dir());
    }

    #[test]
    fn test_blocked_by_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(OUTPUT_DIR_NAME), b"not a directory").unwrap();

        let output = OutputDir::in_dir(temp.path());
        let err = output.ensure().unwrap_err();
        assert!(matches!(err, BatchResizeError::DirectoryCreate { .. }));
        assert!(!output.is_ready());
    }
}
