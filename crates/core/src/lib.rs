#![deny(unsafe_code)]
//! Core of the metaballs contour engine.
//!
//! Provides moving [`Source`]s, the inverse-square influence field and its
//! per-frame [`FieldGrid`], marching-squares classification ([`CellCode`]),
//! contour building ([`ContourBuilder`], [`build_contour_segments`]),
//! segment chaining, the [`Engine`] trait, the `Xorshift64` PRNG, [`Seed`],
//! and parameter helpers.

pub mod canvas;
pub mod chain;
pub mod classify;
pub mod contour;
pub mod engine;
pub mod error;
pub mod field;
pub mod params;
pub mod prng;
pub mod seed;
pub mod source;

pub use canvas::Canvas;
pub use chain::{chain_segments, Polyline};
pub use classify::{classify_cell, CellCode};
pub use contour::{build_contour_segments, interpolate, Contour, ContourBuilder, SaddlePolicy, Segment};
pub use engine::Engine;
pub use error::EngineError;
pub use field::{field_value, influence, FieldGrid};
pub use prng::Xorshift64;
pub use seed::Seed;
pub use source::Source;
