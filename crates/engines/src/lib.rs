#![deny(unsafe_code)]
//! Engine registry: maps engine names to implementations and provides CPU-side
//! contour rasterization.
//!
//! Sits between `metaballs-core` (which defines the `Engine` trait) and the
//! frame driver in `metaballs-sim`, so the CLI resolves engines by name
//! without knowing their concrete types.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

use metaballs_core::canvas::Canvas;
use metaballs_core::contour::Contour;
use metaballs_core::error::EngineError;
use metaballs_core::source::Source;
use metaballs_core::Engine;
use metaballs_sim::Metaballs;
use serde_json::Value;

const ENGINE_NAMES: &[&str] = &["metaballs"];

/// Every engine the registry can build.
///
/// Delegates the `Engine` trait to the wrapped implementation. Use
/// [`EngineKind::from_name`] for string-based construction.
pub enum EngineKind {
    /// Bouncing inverse-square sources contoured with marching squares.
    Metaballs(Metaballs),
}

impl EngineKind {
    /// Constructs an engine by name.
    ///
    /// Returns `EngineError::UnknownEngine` if the name is not recognized.
    pub fn from_name(
        name: &str,
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        match name {
            "metaballs" => Ok(EngineKind::Metaballs(Metaballs::from_json(
                width, height, seed, params,
            )?)),
            _ => Err(EngineError::UnknownEngine(name.to_string())),
        }
    }

    pub fn list_engines() -> &'static [&'static str] {
        ENGINE_NAMES
    }
}

impl Engine for EngineKind {
    fn step(&mut self) -> Result<(), EngineError> {
        match self {
            EngineKind::Metaballs(e) => e.step(),
        }
    }

    fn contour(&self) -> &Contour {
        match self {
            EngineKind::Metaballs(e) => e.contour(),
        }
    }

    fn sources(&self) -> &[Source] {
        match self {
            EngineKind::Metaballs(e) => e.sources(),
        }
    }

    fn canvas(&self) -> Canvas {
        match self {
            EngineKind::Metaballs(e) => e.canvas(),
        }
    }

    fn frame(&self) -> usize {
        match self {
            EngineKind::Metaballs(e) => e.frame(),
        }
    }

    fn params(&self) -> Value {
        match self {
            EngineKind::Metaballs(e) => e.params(),
        }
    }

    fn param_schema(&self) -> Value {
        match self {
            EngineKind::Metaballs(e) => e.param_schema(),
        }
    }
}
