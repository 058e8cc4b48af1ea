//! Imaging library seam: decode, resize and encode

use std::path::Path;
use tracing::trace;

use crate::error::{Result, ImagingContext};
use crate::processing::resize::{check_output_size, RESIZE_FILTER};

/// Pixel operations the batch pipeline delegates to an imaging library.
///
/// Implementations are shared by every task of a batch, so they must be
/// `Send + Sync`. All methods are blocking.
pub trait ImageBackend: Send + Sync + 'static {
    /// Decoded, in-memory image
    type Image: Send + 'static;

    /// Cheap classification: does `path` look like a decodable image?
    ///
    /// Used during directory discovery; any failure means "not an image".
    fn probe(&self, path: &Path) -> bool;

    /// Fully decode the image at `path`
    fn decode(&self, path: &Path) -> Result<Self::Image>;

    /// Width and height in pixels
    fn dimensions(&self, image: &Self::Image) -> (u32, u32);

    /// Resample to exactly `width` x `height`. `source` is only used for
    /// error context.
    fn resize(&self, image: &Self::Image, width: u32, height: u32, source: &Path)
        -> Result<Self::Image>;

    /// Write `image` to `path`; the format follows the path's extension
    fn encode(&self, image: &Self::Image, path: &Path) -> Result<()>;
}

/// [`ImageBackend`] backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateBackend;

impl ImageCrateBackend {
    fn reader(path: &Path) -> std::io::Result<image::io::Reader<std::io::BufReader<std::fs::File>>> {
        // sniff the header instead of trusting the extension
        image::io::Reader::open(path)?.with_guessed_format()
    }
}

impl ImageBackend for ImageCrateBackend {
    type Image = image::DynamicImage;

    fn probe(&self, path: &Path) -> bool {
        let Ok(reader) = Self::reader(path) else {
            return false;
        };
        if reader.format().is_none() {
            return false;
        }
        match reader.into_dimensions() {
            Ok((width, height)) => {
                trace!("Probed {:?}: {}x{}", path, width, height);
                true
            }
            Err(e) => {
                trace!("Probe rejected {:?}: {}", path, e);
                false
            }
        }
    }

    fn decode(&self, path: &Path) -> Result<Self::Image> {
        Self::reader(path)
            .decode_context(path)?
            .decode()
            .decode_context(path)
    }

    fn dimensions(&self, image: &Self::Image) -> (u32, u32) {
        (image.width(), image.height())
    }

    fn resize(
        &self,
        image: &Self::Image,
        width: u32,
        height: u32,
        source: &Path,
    ) -> Result<Self::Image> {
        check_output_size(width, height).resize_context(source)?;
        Ok(image.resize_exact(width, height, RESIZE_FILTER))
    }

    fn encode(&self, image: &Self::Image, path: &Path) -> Result<()> {
        image.save(path).save_context(path)
    }
}
