//! Marching-squares contour building.
//!
//! A cell with corners TL, TR, BR, BL (clockwise from top-left) and a case
//! code from [`classify_cell`] emits zero, one, or two line segments. Each
//! segment joins two of the cell's edges, at the point where the field is
//! estimated to cross the threshold by linear interpolation along that edge.
//!
//! The code-to-edges mapping is the declarative [`CASE_TABLE`]. The two
//! saddle codes (5 and 10) are resolved by a [`SaddlePolicy`].

use std::str::FromStr;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::canvas::Canvas;
use crate::classify::{classify_cell, CellCode};
use crate::error::EngineError;
use crate::field::{field_value, FieldGrid};
use crate::source::Source;

/// Sample differences smaller than this are treated as a flat edge.
pub const FLAT_EDGE_EPSILON: f64 = 1e-6;

/// One cell edge, named by the side of the cell it lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// TL to TR.
    Top,
    /// TR to BR.
    Right,
    /// BL to BR.
    Bottom,
    /// TL to BL.
    Left,
}

use self::Edge::{Bottom, Left, Right, Top};

/// Edge pairs crossed by the contour for each case code.
///
/// Saddle rows (5 and 10) hold the inside-joined resolution: the two outside
/// corners are cut off and the inside region runs through the cell.
pub const CASE_TABLE: [&[(Edge, Edge)]; 16] = [
    &[],                             // 0
    &[(Left, Bottom)],               // 1  BL
    &[(Bottom, Right)],              // 2  BR
    &[(Left, Right)],                // 3  BL BR
    &[(Top, Right)],                 // 4  TR
    &[(Left, Top), (Bottom, Right)], // 5  TR BL
    &[(Top, Bottom)],                // 6  TR BR
    &[(Left, Top)],                  // 7  TR BR BL
    &[(Left, Top)],                  // 8  TL
    &[(Top, Bottom)],                // 9  TL BL
    &[(Top, Right), (Bottom, Left)], // 10 TL BR
    &[(Top, Right)],                 // 11 TL BR BL
    &[(Left, Right)],                // 12 TL TR
    &[(Bottom, Right)],              // 13 TL TR BL
    &[(Left, Bottom)],               // 14 TL TR BR
    &[],                             // 15
];

/// Saddle rows used when the cell centre is outside: each inside corner is
/// cut off on its own.
const SEPARATED_SADDLES: [&[(Edge, Edge)]; 2] = [
    &[(Top, Right), (Left, Bottom)], // 5  TR BL
    &[(Left, Top), (Bottom, Right)], // 10 TL BR
];

/// How the ambiguous diagonal cells (codes 5 and 10) are connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaddlePolicy {
    /// Always join the inside corners through the cell.
    #[default]
    JoinInside,
    /// Sample the cell centre; join the inside corners only if the centre is
    /// inside too.
    CenterSample,
}

impl SaddlePolicy {
    /// All policy names, as accepted by [`FromStr`].
    pub fn list_names() -> &'static [&'static str] {
        &["join_inside", "center_sample"]
    }

    pub fn name(self) -> &'static str {
        match self {
            SaddlePolicy::JoinInside => "join_inside",
            SaddlePolicy::CenterSample => "center_sample",
        }
    }
}

impl FromStr for SaddlePolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join_inside" => Ok(SaddlePolicy::JoinInside),
            "center_sample" => Ok(SaddlePolicy::CenterSample),
            other => Err(EngineError::UnknownSaddlePolicy(other.to_string())),
        }
    }
}

/// A directed line segment between two edge crossings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: DVec2,
    pub end: DVec2,
}

impl Segment {
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Point on segment `a`-`b` where the field is estimated to equal `threshold`.
///
/// Uses `t = (threshold - fa) / (fb - fa)` clamped to `[0, 1]`. A flat edge
/// (`|fb - fa| < FLAT_EDGE_EPSILON`) yields the midpoint.
pub fn interpolate(a: DVec2, fa: f64, b: DVec2, fb: f64, threshold: f64) -> DVec2 {
    let df = fb - fa;
    if df.abs() < FLAT_EDGE_EPSILON {
        return (a + b) * 0.5;
    }
    let t = ((threshold - fa) / df).clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Crossing point on `edge` of a cell.
///
/// Every edge is interpolated in a fixed direction (left to right, top to
/// bottom), so two cells sharing an edge compute bit-identical points.
fn edge_point(edge: Edge, corners: &[DVec2; 4], samples: &[f64; 4], threshold: f64) -> DVec2 {
    let [tl, tr, br, bl] = *corners;
    let [ftl, ftr, fbr, fbl] = *samples;
    match edge {
        Top => interpolate(tl, ftl, tr, ftr, threshold),
        Right => interpolate(tr, ftr, br, fbr, threshold),
        Bottom => interpolate(bl, fbl, br, fbr, threshold),
        Left => interpolate(tl, ftl, bl, fbl, threshold),
    }
}

/// Segments emitted by one frame's sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub segments: Vec<Segment>,
    /// Cells visited by the sweep.
    pub cells: usize,
    /// Cells that emitted at least one segment.
    pub crossed_cells: usize,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Turns classified cells into segments with a single threshold.
///
/// The same threshold drives classification and interpolation, so contour
/// points always land on edges whose corners straddle it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourBuilder {
    threshold: f64,
    saddle: SaddlePolicy,
}

impl ContourBuilder {
    /// Creates a builder. Returns `EngineError::InvalidThreshold` unless
    /// `threshold` is finite and positive.
    pub fn new(threshold: f64, saddle: SaddlePolicy) -> Result<Self, EngineError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(EngineError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold, saddle })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn saddle(&self) -> SaddlePolicy {
        self.saddle
    }

    /// Classifies four corner samples with this builder's threshold.
    pub fn classify(&self, samples: [f64; 4]) -> CellCode {
        classify_cell(samples, self.threshold)
    }

    /// Edge pairs for `code`, resolving saddles with `center` when the
    /// policy asks for it. A missing centre sample falls back to the mean of
    /// the corners.
    pub fn edges_for(
        &self,
        code: CellCode,
        samples: &[f64; 4],
        center: Option<f64>,
    ) -> &'static [(Edge, Edge)] {
        let bits = code.bits() as usize;
        if self.saddle == SaddlePolicy::CenterSample && code.is_saddle() {
            let center = center.unwrap_or_else(|| samples.iter().sum::<f64>() / 4.0);
            if center <= self.threshold {
                return SEPARATED_SADDLES[usize::from(bits == 10)];
            }
        }
        CASE_TABLE[bits]
    }

    /// Appends the segments for one cell to `out`.
    pub fn build_cell(
        &self,
        code: CellCode,
        corners: &[DVec2; 4],
        samples: &[f64; 4],
        center: Option<f64>,
        out: &mut Vec<Segment>,
    ) {
        for &(a, b) in self.edges_for(code, samples, center) {
            out.push(Segment::new(
                edge_point(a, corners, samples, self.threshold),
                edge_point(b, corners, samples, self.threshold),
            ));
        }
    }

    /// Runs one frame: samples the field over `canvas` and builds every cell.
    ///
    /// `sources` is read as an immutable snapshot for the whole sweep. Rows
    /// are processed in parallel; segment order is row-major regardless.
    pub fn sweep(&self, sources: &[Source], canvas: &Canvas, step: f64) -> Contour {
        let _span = debug_span!("sweep", sources = sources.len(), step).entered();
        let grid = FieldGrid::sample(sources, canvas, step);
        self.sweep_grid(&grid, sources)
    }

    /// Builds every cell of an already sampled grid.
    ///
    /// `sources` is only consulted for centre samples under
    /// [`SaddlePolicy::CenterSample`].
    pub fn sweep_grid(&self, grid: &FieldGrid, sources: &[Source]) -> Contour {
        use rayon::prelude::*;

        let rows: Vec<(Vec<Segment>, usize)> = (0..grid.rows())
            .into_par_iter()
            .map(|j| {
                let mut segments = Vec::new();
                let mut crossed = 0;
                for i in 0..grid.cols() {
                    let samples = grid.cell_samples(i, j);
                    let code = self.classify(samples);
                    if code.is_uniform() {
                        continue;
                    }
                    let corners = grid.cell_corners(i, j);
                    let center = (self.saddle == SaddlePolicy::CenterSample && code.is_saddle())
                        .then(|| field_value(sources, (corners[0] + corners[2]) * 0.5));
                    self.build_cell(code, &corners, &samples, center, &mut segments);
                    crossed += 1;
                }
                (segments, crossed)
            })
            .collect();

        let crossed_cells = rows.iter().map(|(_, c)| c).sum();
        let segments = rows.into_iter().flat_map(|(s, _)| s).collect();
        Contour {
            segments,
            cells: grid.cols() * grid.rows(),
            crossed_cells,
        }
    }
}

/// Segments for one cell with the inside-joined saddle resolution.
///
/// `corners` and `samples` are ordered TL, TR, BR, BL. Codes 0 and 15 give an
/// empty list; every other code gives one segment, or two for 5 and 10.
pub fn build_contour_segments(
    code: CellCode,
    corners: [DVec2; 4],
    samples: [f64; 4],
    threshold: f64,
) -> Vec<Segment> {
    CASE_TABLE[code.bits() as usize]
        .iter()
        .map(|&(a, b)| {
            Segment::new(
                edge_point(a, &corners, &samples, threshold),
                edge_point(b, &corners, &samples, threshold),
            )
        })
        .collect()
}
