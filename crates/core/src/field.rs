//! The scalar influence field of a set of sources, and its per-frame sampling.
//!
//! `field(p) = Σ radius² / distance²(p, source)`. Values are unbounded above;
//! the singularity at a source centre is floored to a large finite value.
//!
//! [`FieldGrid`] evaluates the field once per grid vertex so the four cells
//! touching a vertex all read the same sample.

use glam::DVec2;
use rayon::prelude::*;

use crate::canvas::Canvas;
use crate::source::Source;

/// Squared distances below this are treated as this value.
pub const DISTANCE_EPSILON_SQ: f64 = 1e-12;

/// Influence of one source at `point`: `radius² / max(d², ε)`.
///
/// A point on the source centre yields a large finite value instead of
/// infinity, so it always classifies as inside.
pub fn influence(source: &Source, point: DVec2) -> f64 {
    let d_sq = source.position().distance_squared(point).max(DISTANCE_EPSILON_SQ);
    source.radius() * source.radius() / d_sq
}

/// Combined influence of every source at `point`.
pub fn field_value(sources: &[Source], point: DVec2) -> f64 {
    sources.iter().map(|s| influence(s, point)).sum()
}

/// Field samples at every vertex of the sampling grid for one frame.
///
/// Row-major, `(cols + 1) * (rows + 1)` values. Vertex `(i, j)` sits at
/// `(i * step, j * step)`.
#[derive(Debug, Clone)]
pub struct FieldGrid {
    cols: usize,
    rows: usize,
    step: f64,
    data: Vec<f64>,
}

impl FieldGrid {
    /// Samples the field over a grid covering `canvas`.
    ///
    /// Rows are evaluated in parallel against the immutable `sources` slice,
    /// which is the snapshot every cell of this frame observes. `step` must be
    /// positive and within the lattice cap (see [`Canvas::checked_grid_cells`]).
    pub fn sample(sources: &[Source], canvas: &Canvas, step: f64) -> Self {
        let (cols, rows) = canvas.grid_cells(step);
        let stride = cols + 1;
        let mut data = vec![0.0; stride * (rows + 1)];
        data.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(j, row)| {
                let y = j as f64 * step;
                for (i, value) in row.iter_mut().enumerate() {
                    *value = field_value(sources, DVec2::new(i as f64 * step, y));
                }
            });
        Self {
            cols,
            rows,
            step,
            data,
        }
    }

    /// Number of cell columns (one less than vertex columns).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cell rows (one less than vertex rows).
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Raw vertex samples, row-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Sample at vertex `(i, j)`. Panics if out of range.
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.data[j * (self.cols + 1) + i]
    }

    /// Coordinates of vertex `(i, j)`.
    pub fn vertex(&self, i: usize, j: usize) -> DVec2 {
        DVec2::new(i as f64 * self.step, j as f64 * self.step)
    }

    /// Corner points of cell `(i, j)`, clockwise from top-left.
    pub fn cell_corners(&self, i: usize, j: usize) -> [DVec2; 4] {
        [
            self.vertex(i, j),
            self.vertex(i + 1, j),
            self.vertex(i + 1, j + 1),
            self.vertex(i, j + 1),
        ]
    }

    /// Corner samples of cell `(i, j)`, in the same order as [`Self::cell_corners`].
    pub fn cell_samples(&self, i: usize, j: usize) -> [f64; 4] {
        [
            self.at(i, j),
            self.at(i + 1, j),
            self.at(i + 1, j + 1),
            self.at(i, j + 1),
        ]
    }
}
