//! Input discovery: classify the target and list its images

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, BatchResizeError};
use crate::processing::backend::ImageBackend;

/// List the images directly inside `dir`, sorted by file name.
///
/// Subdirectories are not entered. Entries that are not regular files, or
/// that fail the backend's probe, are skipped without error. Only a failure
/// to read `dir` itself is reported.
pub fn discover_images<B: ImageBackend>(backend: &B, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed"));
                return Err(BatchResizeError::path(dir, source));
            }
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            debug!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }

        if backend.probe(entry.path()) {
            images.push(entry.into_path());
        } else {
            debug!("Skipping non-image file: {:?}", entry.path());
        }
    }

    Ok(images)
}
