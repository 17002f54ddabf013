//! Four-corner cell classification into a marching-squares case code.

use serde::{Deserialize, Serialize};

/// Bit for the top-left corner.
pub const TOP_LEFT: u8 = 0b1000;
/// Bit for the top-right corner.
pub const TOP_RIGHT: u8 = 0b0100;
/// Bit for the bottom-right corner.
pub const BOTTOM_RIGHT: u8 = 0b0010;
/// Bit for the bottom-left corner.
pub const BOTTOM_LEFT: u8 = 0b0001;

/// Marching-squares case code in `0..=15`.
///
/// One bit per corner, clockwise from the most significant: top-left,
/// top-right, bottom-right, bottom-left. A set bit means the corner sample is
/// strictly above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCode(u8);

impl CellCode {
    /// No corner inside.
    pub const EMPTY: CellCode = CellCode(0);
    /// Every corner inside.
    pub const FULL: CellCode = CellCode(15);

    /// Builds a code from its raw value, keeping only the low four bits.
    pub fn new(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether the corner for `bit` (one of the corner constants) is inside.
    pub fn is_inside(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    /// Inside corners lie on a diagonal (codes 5 and 10).
    pub fn is_saddle(self) -> bool {
        self.0 == 5 || self.0 == 10
    }

    /// Uniform cells (codes 0 and 15) carry no contour.
    pub fn is_uniform(self) -> bool {
        self == Self::EMPTY || self == Self::FULL
    }
}

/// Classifies four corner samples (TL, TR, BR, BL) against `threshold`.
///
/// A sample exactly equal to the threshold is outside.
pub fn classify_cell(samples: [f64; 4], threshold: f64) -> CellCode {
    let [tl, tr, br, bl] = samples;
    let bit = |v: f64, mask: u8| if v > threshold { mask } else { 0 };
    CellCode(bit(tl, TOP_LEFT) | bit(tr, TOP_RIGHT) | bit(br, BOTTOM_RIGHT) | bit(bl, BOTTOM_LEFT))
}
