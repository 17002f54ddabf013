//! PNG snapshots of a contour frame.
//!
//! Feature-gated behind `png` (default on) so the rasterizer can be used
//! without pulling in the `image` crate.

use metaballs_core::canvas::Canvas;
use metaballs_core::contour::Contour;
use metaballs_core::error::EngineError;
use std::path::Path;
use tracing::info;

use crate::pixel::{contour_to_rgba, StrokeStyle};

/// Rasterizes `contour` with `style` and writes it as a PNG.
///
/// Returns `EngineError::InvalidDimensions` if the canvas overflows `u32`,
/// or `EngineError::Io` on write failure.
pub fn write_png(
    contour: &Contour,
    canvas: &Canvas,
    style: &StrokeStyle,
    frame: usize,
    path: &Path,
) -> Result<(), EngineError> {
    let rgba = contour_to_rgba(contour, canvas, style, frame);
    let w = u32::try_from(canvas.width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(canvas.height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))?;
    info!(path = %path.display(), width = w, height = h, frame, "snapshot written");
    Ok(())
}
