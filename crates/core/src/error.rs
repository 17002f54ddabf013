//! Error types for the metaballs core.
//!
//! Only construction boundaries fail. The per-frame path (field sampling,
//! classification, contour building) is total and never returns these.

use thiserror::Error;

/// Errors produced when building sources, canvases, or engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero when creating a canvas or grid.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A source radius was zero, negative, or not finite.
    #[error("invalid radius {0}: must be finite and greater than zero")]
    InvalidRadius(f64),

    /// A position or velocity component was NaN or infinite.
    #[error("non-finite coordinate in {0}")]
    NonFiniteCoordinate(&'static str),

    /// The grid step was zero, negative, or not finite.
    #[error("invalid grid size {0}: must be finite and greater than zero")]
    InvalidGridSize(f64),

    /// The contour threshold was zero, negative, or not finite.
    #[error("invalid threshold {0}: must be finite and greater than zero")]
    InvalidThreshold(f64),

    /// A source is too large to bounce inside the canvas.
    #[error("source of radius {radius} does not fit a {width}x{height} canvas")]
    SourceDoesNotFit {
        radius: f64,
        width: usize,
        height: usize,
    },

    /// More sources were requested than the engine accepts.
    #[error("too many sources: {count} requested, at most {max} allowed")]
    TooManySources { count: usize, max: usize },

    /// No engine is registered under the given name.
    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    /// The saddle policy name was not recognised.
    #[error("unknown saddle policy: {0}")]
    UnknownSaddlePolicy(String),

    /// A colour string could not be parsed as `#rrggbb`.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Writing output failed.
    #[error("i/o error: {0}")]
    Io(String),
}
