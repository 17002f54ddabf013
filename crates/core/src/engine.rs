//! The frame-driving `Engine` trait.
//!
//! The trait is object-safe so drivers can be held as `dyn Engine` by the
//! registry, the CLI, and the rasterizer.

use crate::canvas::Canvas;
use crate::contour::Contour;
use crate::error::EngineError;
use crate::source::Source;
use serde_json::Value;

/// A simulation that moves sources and produces one contour per frame.
pub trait Engine {
    /// Advances one frame: moves every source, then rebuilds the contour.
    fn step(&mut self) -> Result<(), EngineError>;

    /// Contour of the most recent frame.
    fn contour(&self) -> &Contour;

    /// Current source snapshot.
    fn sources(&self) -> &[Source];

    /// Bounds the sources bounce inside.
    fn canvas(&self) -> Canvas;

    /// Frames advanced since construction.
    fn frame(&self) -> usize;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Types, ranges, and defaults of every parameter.
    fn param_schema(&self) -> Value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use serde_json::json;

    struct StillEngine {
        canvas: Canvas,
        sources: Vec<Source>,
        contour: Contour,
        frame: usize,
    }

    impl StillEngine {
        fn new() -> Self {
            Self {
                canvas: Canvas::new(8, 8).unwrap(),
                sources: vec![Source::stationary(DVec2::new(4.0, 4.0), 2.0).unwrap()],
                contour: Contour::default(),
                frame: 0,
            }
        }
    }

    impl Engine for StillEngine {
        fn step(&mut self) -> Result<(), EngineError> {
            self.frame += 1;
            Ok(())
        }

        fn contour(&self) -> &Contour {
            &self.contour
        }

        fn sources(&self) -> &[Source] {
            &self.sources
        }

        fn canvas(&self) -> Canvas {
            self.canvas
        }

        fn frame(&self) -> usize {
            self.frame
        }

        fn params(&self) -> Value {
            json!({"count": self.sources.len()})
        }

        fn param_schema(&self) -> Value {
            json!({"count": {"type": "integer", "default": 1}})
        }
    }

    #[test]
    fn engine_trait_is_object_safe() {
        let engine: Box<dyn Engine> = Box::new(StillEngine::new());
        assert_eq!(engine.canvas().width(), 8);
        assert_eq!(engine.sources().len(), 1);
        assert!(engine.contour().is_empty());
    }

    #[test]
    fn dyn_engine_mut_reference_steps() {
        let mut engine = StillEngine::new();
        let engine_ref: &mut dyn Engine = &mut engine;
        engine_ref.step().unwrap();
        engine_ref.step().unwrap();
        assert_eq!(engine_ref.frame(), 2);
    }

    #[test]
    fn params_and_schema_are_json_objects() {
        let engine = StillEngine::new();
        assert_eq!(engine.params()["count"], 1);
        assert_eq!(engine.param_schema()["count"]["type"], "integer");
    }
}
