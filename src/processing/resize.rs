//! Target dimension calculation and resampling filter

use crate::config::{Axis, ResizeSpec};

/// Resampling filter used for every resize. Not configurable.
pub const RESIZE_FILTER: image::imageops::FilterType = image::imageops::FilterType::Lanczos3;

/// Largest output side in pixels
pub const MAX_DIMENSION: u32 = 32_768;

/// Largest output area in pixels
pub const MAX_PIXELS: u64 = 500_000_000;

/// Calculate output dimensions for `spec`, keeping the aspect ratio.
///
/// The pinned axis equals `spec.value` exactly; the other axis is rounded to
/// the nearest pixel and never drops below 1. The error is a bare message;
/// callers attach the source path.
pub fn target_dimensions(
    original_width: u32,
    original_height: u32,
    spec: ResizeSpec,
) -> Result<(u32, u32), String> {
    if original_width == 0 || original_height == 0 {
        return Err(format!(
            "source image has no pixels ({}x{})",
            original_width, original_height
        ));
    }
    if spec.value == 0 {
        return Err(format!("{} must be greater than 0", spec.axis));
    }

    let (width, height) = match spec.axis {
        Axis::Height => (scale(original_width, spec.value, original_height), spec.value),
        Axis::Width => (spec.value, scale(original_height, spec.value, original_width)),
    };

    check_output_size(width, height)?;
    Ok((width, height))
}

/// Reject outputs the resampler could not allocate
pub fn check_output_size(width: u32, height: u32) -> Result<(), String> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(format!(
            "output {}x{} exceeds the {}px limit per side",
            width, height, MAX_DIMENSION
        ));
    }
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(format!(
            "output {}x{} exceeds {} pixels",
            width, height, MAX_PIXELS
        ));
    }
    Ok(())
}

/// `other * target / pinned`, rounded half away from zero, at least 1
fn scale(other: u32, target: u32, pinned: u32) -> u32 {
    let scaled = (f64::from(other) * f64::from(target) / f64::from(pinned)).round();
    // clamp keeps absurd upscales inside u32
    scaled.clamp(1.0, f64::from(u32::MAX)) as u32
}
