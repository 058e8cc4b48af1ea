//! Per-image processing: decode, resize, save

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{Axis, ResizeSpec};
use crate::error::{Result, BatchResizeError, ImagingContext};

pub mod backend;
pub mod discovery;
pub mod output;
pub mod resize;

pub use backend::*;
pub use discovery::*;
pub use output::*;
pub use resize::*;

/// A resized image held in memory until the save pass writes it
#[derive(Debug, Clone)]
pub struct ResizedArtifact<I> {
    /// Directory the source image was read from
    pub source_dir: PathBuf,
    /// Original file name, reused in the output name
    pub file_name: OsString,
    pub pixels: I,
    pub target_value: u32,
    pub axis: Axis,
}

impl<I> ResizedArtifact<I> {
    /// Output file name, e.g. `h300-photo.jpg`
    pub fn output_file_name(&self) -> OsString {
        let spec = ResizeSpec {
            axis: self.axis,
            value: self.target_value,
        };
        spec.output_file_name(&self.file_name)
    }
}

/// Core processing engine for image operations
pub struct ProcessingEngine<B = ImageCrateBackend> {
    backend: B,
}

impl ProcessingEngine {
    /// Create a new processing engine on the `image` crate
    pub fn new() -> Self {
        Self::with_backend(ImageCrateBackend)
    }
}

impl Default for ProcessingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ImageBackend> ProcessingEngine<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Decode probe
    pub fn is_image(&self, path: &Path) -> bool {
        self.backend.probe(path)
    }

    /// Decode and resize one file in memory
    pub fn resize_file(&self, source: &Path, spec: ResizeSpec) -> Result<ResizedArtifact<B::Image>> {
        let file_name = source
            .file_name()
            .ok_or_else(|| BatchResizeError::decode(source, "path has no file name"))?
            .to_os_string();
        let source_dir = source.parent().map(Path::to_path_buf).unwrap_or_default();

        let image = self.backend.decode(source)?;

        info!("Resizing: {}", file_name.to_string_lossy());

        let (width, height) = self.backend.dimensions(&image);
        let (target_width, target_height) =
            target_dimensions(width, height, spec).resize_context(source)?;

        debug!(
            "Resizing {:?}: {}x{} -> {}x{}",
            source, width, height, target_width, target_height
        );

        let pixels = self.backend.resize(&image, target_width, target_height, source)?;

        Ok(ResizedArtifact {
            source_dir,
            file_name,
            pixels,
            target_value: spec.value,
            axis: spec.axis,
        })
    }

    /// Write an artifact into the output directory, creating it on first need
    pub fn save_artifact(
        &self,
        artifact: &ResizedArtifact<B::Image>,
        output: &OutputDir,
    ) -> Result<PathBuf> {
        let dir = output.ensure()?;
        let path = dir.join(artifact.output_file_name());

        self.backend.encode(&artifact.pixels, &path)?;

        info!("Image saved to: {}", path.display());
        Ok(path)
    }

    /// Resize one file and save it straight away
    pub fn process_file(
        &self,
        source: &Path,
        spec: ResizeSpec,
        output: &OutputDir,
    ) -> Result<PathBuf> {
        let artifact = self.resize_file(source, spec)?;
        self.save_artifact(&artifact, output)
    }
}
