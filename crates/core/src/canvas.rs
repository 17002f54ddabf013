//! Canvas bounds and the sampling grid laid over them.
//!
//! The canvas is the rectangle `[0, width] x [0, height]` that sources bounce
//! inside. The sampling grid starts at the origin and covers the canvas with
//! square cells of side `step`; the last row and column of cells may reach
//! past the far edges.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Rectangular drawing area in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    width: usize,
    height: usize,
}

impl Canvas {
    /// Creates a canvas of the given dimensions.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero,
    /// or if `width * height` would overflow `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        width
            .checked_mul(height)
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self { width, height })
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width as a coordinate bound.
    pub fn max_x(&self) -> f64 {
        self.width as f64
    }

    /// Height as a coordinate bound.
    pub fn max_y(&self) -> f64 {
        self.height as f64
    }

    /// Whether a circle of `radius` can sit inside the canvas on both axes.
    pub fn fits(&self, radius: f64) -> bool {
        2.0 * radius <= self.max_x() && 2.0 * radius <= self.max_y()
    }

    /// Number of grid cells `(columns, rows)` needed to cover the canvas.
    ///
    /// `step` must already have passed [`Canvas::checked_grid_cells`].
    pub fn grid_cells(&self, step: f64) -> (usize, usize) {
        let cols = (self.max_x() / step).ceil() as usize;
        let rows = (self.max_y() / step).ceil() as usize;
        (cols.max(1), rows.max(1))
    }

    /// Like [`Canvas::grid_cells`], but rejects steps whose lattice would
    /// exceed [`MAX_GRID_VERTICES`] or overflow `usize`.
    ///
    /// Returns `EngineError::InvalidGridSize` for such steps and for any step
    /// [`validate_step`] rejects.
    pub fn checked_grid_cells(&self, step: f64) -> Result<(usize, usize), EngineError> {
        let step = validate_step(step)?;
        let (cols, rows) = self.grid_cells(step);
        let vertices = cols
            .checked_add(1)
            .zip(rows.checked_add(1))
            .and_then(|(c, r)| c.checked_mul(r));
        match vertices {
            Some(v) if v <= MAX_GRID_VERTICES => Ok((cols, rows)),
            _ => Err(EngineError::InvalidGridSize(step)),
        }
    }
}

/// Most lattice vertices a single sweep may sample (512 MiB of `f64`s).
pub const MAX_GRID_VERTICES: usize = 1 << 26;

/// Rejects grid steps that are zero, negative, or not finite.
pub fn validate_step(step: f64) -> Result<f64, EngineError> {
    if step.is_finite() && step > 0.0 {
        Ok(step)
    } else {
        Err(EngineError::InvalidGridSize(step))
    }
}
