//! Moving point sources ("metaballs") and their reflection at canvas edges.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::EngineError;

/// A point source contributing `radius² / distance²` to the field.
///
/// Position and velocity change every frame; the radius is fixed at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Source {
    position: DVec2,
    velocity: DVec2,
    radius: f64,
}

impl Source {
    /// Creates a source, rejecting non-finite coordinates and radii that
    /// are not strictly positive.
    pub fn new(position: DVec2, radius: f64, velocity: DVec2) -> Result<Self, EngineError> {
        if !position.is_finite() {
            return Err(EngineError::NonFiniteCoordinate("position"));
        }
        if !velocity.is_finite() {
            return Err(EngineError::NonFiniteCoordinate("velocity"));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(EngineError::InvalidRadius(radius));
        }
        Ok(Self {
            position,
            velocity,
            radius,
        })
    }

    /// A source that never moves.
    pub fn stationary(position: DVec2, radius: f64) -> Result<Self, EngineError> {
        Self::new(position, radius, DVec2::ZERO)
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Advances one frame and reflects off the canvas edges.
    ///
    /// On each axis, a coordinate closer than `radius` to an edge flips that
    /// velocity component and is clamped back into `[radius, bound - radius]`.
    /// The caller guarantees `canvas.fits(radius)`.
    pub fn advance(&mut self, canvas: &Canvas) {
        self.position += self.velocity;
        let (x, vx) = reflect(self.position.x, self.velocity.x, self.radius, canvas.max_x());
        let (y, vy) = reflect(self.position.y, self.velocity.y, self.radius, canvas.max_y());
        self.position = DVec2::new(x, y);
        self.velocity = DVec2::new(vx, vy);
    }
}

/// One-axis reflection boundary.
fn reflect(coord: f64, vel: f64, radius: f64, bound: f64) -> (f64, f64) {
    let lo = radius;
    let hi = (bound - radius).max(lo);
    if coord < lo || coord > hi {
        (coord.clamp(lo, hi), -vel)
    } else {
        (coord, vel)
    }
}
