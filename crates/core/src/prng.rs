//! Seedable Xorshift64 generator for placing and launching sources.
//!
//! Scene setup must replay exactly from a `u64` seed, so the generator is
//! pure integer arithmetic with a fixed float conversion.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Xorshift64 (shifts 13, 7, 17). Same seed, same sequence, on every platform.
///
/// Seed 0 is a fixed point of xorshift and is replaced by a non-zero
/// fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform in [0, 1), from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform point in `[0, width) x [0, height)`.
    pub fn next_point(&mut self, width: f64, height: f64) -> DVec2 {
        let x = self.next_range(0.0, width);
        let y = self.next_range(0.0, height);
        DVec2::new(x, y)
    }

    /// Unit vector with a uniformly distributed heading.
    pub fn next_direction(&mut self) -> DVec2 {
        DVec2::from_angle(self.next_range(0.0, TAU))
    }
}
