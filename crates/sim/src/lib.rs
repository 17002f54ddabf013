#![deny(unsafe_code)]
//! Metaballs engine.
//!
//! A fixed set of sources drifts across the canvas, reflecting off its edges.
//! Every frame the combined influence field is swept with marching squares
//! and the threshold contour is rebuilt from scratch.

use glam::DVec2;
use metaballs_core::canvas::Canvas;
use metaballs_core::contour::{Contour, ContourBuilder, SaddlePolicy};
use metaballs_core::error::EngineError;
use metaballs_core::params::{param_f64, param_string, param_usize};
use metaballs_core::prng::Xorshift64;
use metaballs_core::source::Source;
use metaballs_core::Engine;
use serde_json::{json, Value};
use tracing::{debug, trace};

/// Default canvas width in pixels.
pub const DEFAULT_WIDTH: usize = 700;
/// Default canvas height in pixels.
pub const DEFAULT_HEIGHT: usize = 400;

const DEFAULT_COUNT: usize = 6;
const DEFAULT_RADIUS_MIN: f64 = 30.0;
const DEFAULT_RADIUS_MAX: f64 = 60.0;
/// Pixels per frame.
const DEFAULT_SPEED: f64 = 2.25;
const DEFAULT_GRID_SIZE: f64 = 1.2;
const DEFAULT_THRESHOLD: f64 = 0.8;

/// Largest `count` accepted by [`MetaballsParams::validate`].
pub const MAX_COUNT: usize = 64;
/// Smallest `grid_size` accepted by [`MetaballsParams::validate`].
pub const MIN_GRID_SIZE: f64 = 0.25;

/// Scene and contour parameters.
///
/// [`Default`] gives six sources of radius 30 to 60 moving at 2.25 px per
/// frame, swept on a 1.2 px grid at threshold 0.8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetaballsParams {
    /// Number of randomly placed sources.
    pub count: usize,
    /// Smallest source radius (inclusive).
    pub radius_min: f64,
    /// Largest source radius (exclusive unless equal to `radius_min`).
    pub radius_max: f64,
    /// Source speed in pixels per frame.
    pub speed: f64,
    /// Grid step between field samples.
    pub grid_size: f64,
    /// Field value separating inside from outside.
    pub threshold: f64,
    /// Resolution of diagonal (saddle) cells.
    pub saddle: SaddlePolicy,
}

impl Default for MetaballsParams {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            radius_min: DEFAULT_RADIUS_MIN,
            radius_max: DEFAULT_RADIUS_MAX,
            speed: DEFAULT_SPEED,
            grid_size: DEFAULT_GRID_SIZE,
            threshold: DEFAULT_THRESHOLD,
            saddle: SaddlePolicy::default(),
        }
    }
}

impl MetaballsParams {
    /// Reads parameters from a JSON object, using defaults for missing keys.
    ///
    /// Fails only on an unrecognised `saddle` name; ranges are checked by
    /// [`MetaballsParams::validate`].
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        let saddle = param_string(params, "saddle", SaddlePolicy::default().name()).parse()?;
        Ok(Self {
            count: param_usize(params, "count", DEFAULT_COUNT),
            radius_min: param_f64(params, "radius_min", DEFAULT_RADIUS_MIN),
            radius_max: param_f64(params, "radius_max", DEFAULT_RADIUS_MAX),
            speed: param_f64(params, "speed", DEFAULT_SPEED),
            grid_size: param_f64(params, "grid_size", DEFAULT_GRID_SIZE),
            threshold: param_f64(params, "threshold", DEFAULT_THRESHOLD),
            saddle,
        })
    }

    /// Checks every range against `canvas`.
    pub fn validate(&self, canvas: &Canvas) -> Result<(), EngineError> {
        if self.count > MAX_COUNT {
            return Err(EngineError::TooManySources {
                count: self.count,
                max: MAX_COUNT,
            });
        }
        self.validate_grid(canvas)?;
        ContourBuilder::new(self.threshold, self.saddle)?;
        if !self.radius_min.is_finite() || self.radius_min <= 0.0 {
            return Err(EngineError::InvalidRadius(self.radius_min));
        }
        if !self.radius_max.is_finite() || self.radius_max < self.radius_min {
            return Err(EngineError::InvalidRadius(self.radius_max));
        }
        if !self.speed.is_finite() {
            return Err(EngineError::NonFiniteCoordinate("speed"));
        }
        if !canvas.fits(self.radius_max) {
            return Err(EngineError::SourceDoesNotFit {
                radius: self.radius_max,
                width: canvas.width(),
                height: canvas.height(),
            });
        }
        Ok(())
    }

    /// Rejects grid steps below [`MIN_GRID_SIZE`] or whose lattice over
    /// `canvas` is too large to sample.
    fn validate_grid(&self, canvas: &Canvas) -> Result<(), EngineError> {
        if self.grid_size.is_nan() || self.grid_size < MIN_GRID_SIZE {
            return Err(EngineError::InvalidGridSize(self.grid_size));
        }
        canvas.checked_grid_cells(self.grid_size)?;
        Ok(())
    }
}

/// The metaballs frame driver.
///
/// Owns the sources, canvas, and parameters. Each [`Engine::step`] advances
/// the sources and then rebuilds [`Engine::contour`] against the moved
/// snapshot; the contour available after construction is that of the
/// initial placement.
pub struct Metaballs {
    canvas: Canvas,
    sources: Vec<Source>,
    params: MetaballsParams,
    builder: ContourBuilder,
    contour: Contour,
    frame: usize,
}

impl Metaballs {
    /// Creates an engine with `params.count` randomly placed sources.
    ///
    /// Positions are uniform over the canvas (the first step pulls any
    /// source overlapping an edge back inside), radii uniform in
    /// `[radius_min, radius_max)`, headings uniform, speed `params.speed`.
    pub fn new(
        width: usize,
        height: usize,
        seed: u64,
        params: MetaballsParams,
    ) -> Result<Self, EngineError> {
        let canvas = Canvas::new(width, height)?;
        params.validate(&canvas)?;
        let mut rng = Xorshift64::new(seed);
        let sources = (0..params.count)
            .map(|_| spawn_source(&mut rng, &canvas, &params))
            .collect::<Result<Vec<_>, _>>()?;
        Self::assemble(canvas, sources, params)
    }

    /// Creates an engine from a JSON params object.
    pub fn from_json(
        width: usize,
        height: usize,
        seed: u64,
        json_params: &Value,
    ) -> Result<Self, EngineError> {
        Self::new(width, height, seed, MetaballsParams::from_json(json_params)?)
    }

    /// Creates an engine around explicit sources. `params.count` is replaced
    /// by the number of sources given.
    pub fn with_sources(
        canvas: Canvas,
        sources: Vec<Source>,
        params: MetaballsParams,
    ) -> Result<Self, EngineError> {
        let params = MetaballsParams {
            count: sources.len(),
            ..params
        };
        params.validate_grid(&canvas)?;
        if let Some(s) = sources.iter().find(|s| !canvas.fits(s.radius())) {
            return Err(EngineError::SourceDoesNotFit {
                radius: s.radius(),
                width: canvas.width(),
                height: canvas.height(),
            });
        }
        Self::assemble(canvas, sources, params)
    }

    fn assemble(
        canvas: Canvas,
        sources: Vec<Source>,
        params: MetaballsParams,
    ) -> Result<Self, EngineError> {
        let builder = ContourBuilder::new(params.threshold, params.saddle)?;
        let contour = builder.sweep(&sources, &canvas, params.grid_size);
        Ok(Self {
            canvas,
            sources,
            params,
            builder,
            contour,
            frame: 0,
        })
    }

    /// Current parameters.
    pub fn settings(&self) -> &MetaballsParams {
        &self.params
    }
}

fn spawn_source(
    rng: &mut Xorshift64,
    canvas: &Canvas,
    params: &MetaballsParams,
) -> Result<Source, EngineError> {
    let position = rng.next_point(canvas.max_x(), canvas.max_y());
    let radius = if params.radius_max > params.radius_min {
        rng.next_range(params.radius_min, params.radius_max)
    } else {
        params.radius_min
    };
    let velocity: DVec2 = rng.next_direction() * params.speed;
    Source::new(position, radius, velocity)
}

impl Engine for Metaballs {
    fn step(&mut self) -> Result<(), EngineError> {
        for source in &mut self.sources {
            source.advance(&self.canvas);
        }
        self.contour = self
            .builder
            .sweep(&self.sources, &self.canvas, self.params.grid_size);
        self.frame += 1;
        debug!(
            frame = self.frame,
            segments = self.contour.len(),
            crossed_cells = self.contour.crossed_cells,
            "frame swept"
        );
        trace!(sources = ?self.sources, "source positions");
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
        json!({
            "count": self.params.count,
            "radius_min": self.params.radius_min,
            "radius_max": self.params.radius_max,
            "speed": self.params.speed,
            "grid_size": self.params.grid_size,
            "threshold": self.params.threshold,
            "saddle": self.params.saddle.name(),
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "count": {
                "type": "integer",
                "default": DEFAULT_COUNT,
                "min": 0,
                "max": MAX_COUNT,
                "description": "Number of randomly placed sources"
            },
            "radius_min": {
                "type": "number",
                "default": DEFAULT_RADIUS_MIN,
                "min": 1.0,
                "max": 200.0,
                "description": "Smallest source radius in pixels"
            },
            "radius_max": {
                "type": "number",
                "default": DEFAULT_RADIUS_MAX,
                "min": 1.0,
                "max": 200.0,
                "description": "Largest source radius in pixels"
            },
            "speed": {
                "type": "number",
                "default": DEFAULT_SPEED,
                "min": 0.0,
                "max": 20.0,
                "description": "Source speed in pixels per frame"
            },
            "grid_size": {
                "type": "number",
                "default": DEFAULT_GRID_SIZE,
                "min": MIN_GRID_SIZE,
                "max": 20.0,
                "description": "Spacing between field samples"
            },
            "threshold": {
                "type": "number",
                "default": DEFAULT_THRESHOLD,
                "min": 0.05,
                "max": 10.0,
                "description": "Field value on the contour; higher shrinks the blobs"
            },
            "saddle": {
                "type": "string",
                "default": SaddlePolicy::default().name(),
                "options": SaddlePolicy::list_names(),
                "description": "How diagonal cells connect: join_inside or center_sample"
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaballs_core::chain::chain_segments;

    fn mb(width: usize, height: usize, seed: u64) -> Metaballs {
        Metaballs::new(width, height, seed, MetaballsParams::default()).unwrap()
    }

    fn stationary(x: f64, y: f64, r: f64) -> Source {
        Source::stationary(DVec2::new(x, y), r).unwrap()
    }

    // ---- Construction ----

    #[test]
    fn new_spawns_requested_sources() {
        let engine = mb(DEFAULT_WIDTH, DEFAULT_HEIGHT, 42);
        assert_eq!(engine.sources().len(), DEFAULT_COUNT);
        for s in engine.sources() {
            assert!((DEFAULT_RADIUS_MIN..DEFAULT_RADIUS_MAX).contains(&s.radius()));
            assert!((s.velocity().length() - DEFAULT_SPEED).abs() < 1e-9);
        }
    }

    #[test]
    fn new_with_zero_dimensions_returns_error() {
        let p = MetaballsParams::default();
        assert!(Metaballs::new(0, 10, 42, p).is_err());
        assert!(Metaballs::new(10, 0, 42, p).is_err());
    }

    #[test]
    fn new_rejects_canvas_smaller_than_largest_source() {
        let result = Metaballs::new(100, 100, 1, MetaballsParams::default());
        assert!(matches!(result, Err(EngineError::SourceDoesNotFit { .. })));
    }

    #[test]
    fn new_rejects_bad_grid_size_and_threshold() {
        let bad_grid = MetaballsParams {
            grid_size: 0.0,
            ..MetaballsParams::default()
        };
        assert!(matches!(
            Metaballs::new(700, 400, 1, bad_grid),
            Err(EngineError::InvalidGridSize(_))
        ));
        let bad_threshold = MetaballsParams {
            threshold: -0.8,
            ..MetaballsParams::default()
        };
        assert!(matches!(
            Metaballs::new(700, 400, 1, bad_threshold),
            Err(EngineError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn new_rejects_inverted_radius_range() {
        let p = MetaballsParams {
            radius_min: 40.0,
            radius_max: 20.0,
            ..MetaballsParams::default()
        };
        assert!(matches!(
            Metaballs::new(700, 400, 1, p),
            Err(EngineError::InvalidRadius(_))
        ));
    }

    #[test]
    fn new_rejects_tiny_grid_size_before_sampling() {
        let params = MetaballsParams::from_json(
            &json!({"grid_size": 1e-9, "radius_min": 10, "radius_max": 20}),
        )
        .unwrap();
        let canvas = Canvas::new(100, 100).unwrap();
        assert!(matches!(
            params.validate(&canvas),
            Err(EngineError::InvalidGridSize(_))
        ));
        assert!(matches!(
            Metaballs::new(100, 100, 1, params),
            Err(EngineError::InvalidGridSize(_))
        ));
    }

    #[test]
    fn new_rejects_grid_size_below_minimum() {
        let p = MetaballsParams {
            grid_size: 0.1,
            ..MetaballsParams::default()
        };
        assert!(matches!(
            Metaballs::new(700, 400, 1, p),
            Err(EngineError::InvalidGridSize(_))
        ));
        let at_min = MetaballsParams {
            grid_size: MIN_GRID_SIZE,
            radius_min: 10.0,
            radius_max: 20.0,
            ..MetaballsParams::default()
        };
        assert!(at_min.validate(&Canvas::new(100, 100).unwrap()).is_ok());
    }

    #[test]
    fn new_rejects_too_many_sources() {
        let result = Metaballs::from_json(700, 400, 1, &json!({"count": 1_000_000_000_000_u64}));
        assert!(matches!(
            result,
            Err(EngineError::TooManySources { count: 1_000_000_000_000, max: MAX_COUNT })
        ));
        let at_max = MetaballsParams {
            count: MAX_COUNT,
            ..MetaballsParams::default()
        };
        assert_eq!(Metaballs::new(700, 400, 1, at_max).unwrap().sources().len(), MAX_COUNT);
    }

    #[test]
    fn with_sources_rejects_tiny_grid_size() {
        let canvas = Canvas::new(200, 200).unwrap();
        let p = MetaballsParams {
            grid_size: 1e-9,
            ..MetaballsParams::default()
        };
        let result = Metaballs::with_sources(canvas, vec![stationary(100.5, 100.5, 50.0)], p);
        assert!(matches!(result, Err(EngineError::InvalidGridSize(_))));
    }

    #[test]
    fn equal_radius_bounds_give_uniform_radii() {
        let p = MetaballsParams {
            radius_min: 25.0,
            radius_max: 25.0,
            ..MetaballsParams::default()
        };
        let engine = Metaballs::new(300, 200, 9, p).unwrap();
        assert!(engine.sources().iter().all(|s| s.radius() == 25.0));
    }

    #[test]
    fn from_json_uses_defaults_for_empty_json() {
        let engine = Metaballs::from_json(700, 400, 42, &json!({})).unwrap();
        assert_eq!(*engine.settings(), MetaballsParams::default());
    }

    #[test]
    fn from_json_extracts_custom_values() {
        let params = json!({
            "count": 3,
            "radius_min": 10.0,
            "radius_max": 20.0,
            "speed": 1.5,
            "grid_size": 2,
            "threshold": 1.1,
            "saddle": "center_sample",
        });
        let engine = Metaballs::from_json(200, 100, 42, &params).unwrap();
        let p = engine.params();
        assert_eq!(p["count"], 3);
        assert!((p["grid_size"].as_f64().unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((p["threshold"].as_f64().unwrap() - 1.1).abs() < f64::EPSILON);
        assert_eq!(p["saddle"], "center_sample");
        assert_eq!(engine.sources().len(), 3);
    }

    #[test]
    fn from_json_rejects_unknown_saddle_policy() {
        let result = Metaballs::from_json(700, 400, 42, &json!({"saddle": "diagonal"}));
        assert!(matches!(result, Err(EngineError::UnknownSaddlePolicy(_))));
    }

    #[test]
    fn with_sources_overrides_count_and_checks_fit() {
        let canvas = Canvas::new(200, 200).unwrap();
        let engine = Metaballs::with_sources(
            canvas,
            vec![stationary(100.5, 100.5, 50.0)],
            MetaballsParams::default(),
        )
        .unwrap();
        assert_eq!(engine.settings().count, 1);

        let too_big = Metaballs::with_sources(
            canvas,
            vec![stationary(100.0, 100.0, 150.0)],
            MetaballsParams::default(),
        );
        assert!(matches!(too_big, Err(EngineError::SourceDoesNotFit { .. })));
    }

    // ---- Stepping ----

    #[test]
    fn initial_contour_is_built_before_first_step() {
        let engine = mb(DEFAULT_WIDTH, DEFAULT_HEIGHT, 42);
        assert!(!engine.contour().is_empty());
        assert_eq!(engine.frame(), 0);
    }

    #[test]
    fn step_moves_sources_and_counts_frames() {
        let mut engine = mb(DEFAULT_WIDTH, DEFAULT_HEIGHT, 42);
        let before: Vec<DVec2> = engine.sources().iter().map(Source::position).collect();
        engine.step().unwrap();
        engine.step().unwrap();
        assert_eq!(engine.frame(), 2);
        let moved = engine
            .sources()
            .iter()
            .zip(&before)
            .any(|(s, p)| s.position() != *p);
        assert!(moved);
    }

    #[test]
    fn step_recomputes_contour_from_scratch() {
        let canvas = Canvas::new(201, 201).unwrap();
        let source = Source::new(DVec2::new(100.5, 100.5), 30.0, DVec2::new(3.0, 0.0)).unwrap();
        let mut engine =
            Metaballs::with_sources(canvas, vec![source], MetaballsParams::default()).unwrap();
        let centroid = |c: &Contour| {
            let sum: f64 = c.segments.iter().map(|s| s.start.x).sum();
            sum / c.len() as f64
        };
        let x0 = centroid(engine.contour());
        engine.step().unwrap();
        let x1 = centroid(engine.contour());
        assert!((x1 - x0 - 3.0).abs() < 0.5, "contour shifted by {}", x1 - x0);
    }

    #[test]
    fn stationary_single_source_keeps_one_closed_ring() {
        let canvas = Canvas::new(201, 201).unwrap();
        let p = MetaballsParams {
            grid_size: 1.0,
            ..MetaballsParams::default()
        };
        let mut engine =
            Metaballs::with_sources(canvas, vec![stationary(100.5, 100.5, 50.0)], p).unwrap();
        for _ in 0..3 {
            engine.step().unwrap();
            let rings = chain_segments(&engine.contour().segments);
            assert_eq!(rings.len(), 1);
            assert!(rings[0].closed);
        }
    }

    #[test]
    fn same_seed_identical_after_steps() {
        let mut a = mb(320, 240, 7);
        let mut b = mb(320, 240, 7);
        for _ in 0..20 {
            a.step().unwrap();
            b.step().unwrap();
        }
        assert_eq!(a.sources(), b.sources());
        assert_eq!(a.contour(), b.contour());
    }

    #[test]
    fn different_seed_different_scene() {
        let a = mb(320, 240, 1);
        let b = mb(320, 240, 2);
        assert_ne!(a.sources(), b.sources());
    }

    #[test]
    fn param_schema_lists_every_parameter() {
        let engine = mb(320, 240, 1);
        let schema = engine.param_schema();
        let params = engine.params();
        for key in [
            "count",
            "radius_min",
            "radius_max",
            "speed",
            "grid_size",
            "threshold",
            "saddle",
        ] {
            assert!(schema.get(key).is_some(), "schema missing {key}");
            assert!(params.get(key).is_some(), "params missing {key}");
        }
    }

    #[test]
    fn engine_is_object_safe() {
        let boxed: Box<dyn Engine> = Box::new(mb(320, 240, 3));
        assert_eq!(boxed.canvas().width(), 320);
    }

    // ---- Property-based tests ----

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn sources_stay_on_canvas(seed: u64, speed in 0.0_f64..12.0) {
                let p = MetaballsParams {
                    count: 4,
                    radius_min: 10.0,
                    radius_max: 20.0,
                    speed,
                    grid_size: 4.0,
                    ..MetaballsParams::default()
                };
                let mut engine = Metaballs::new(160, 120, seed, p).unwrap();
                for _ in 0..30 {
                    engine.step().unwrap();
                    for s in engine.sources() {
                        let pos = s.position();
                        let r = s.radius();
                        prop_assert!(pos.x >= r && pos.x <= 160.0 - r);
                        prop_assert!(pos.y >= r && pos.y <= 120.0 - r);
                    }
                }
            }

            #[test]
            fn every_frame_yields_finite_segments(seed: u64) {
                let p = MetaballsParams {
                    count: 3,
                    radius_min: 10.0,
                    radius_max: 20.0,
                    grid_size: 3.0,
                    saddle: SaddlePolicy::CenterSample,
                    ..MetaballsParams::default()
                };
                let mut engine = Metaballs::new(120, 90, seed, p).unwrap();
                for _ in 0..5 {
                    engine.step().unwrap();
                    for seg in &engine.contour().segments {
                        prop_assert!(seg.start.is_finite() && seg.end.is_finite());
                    }
                }
            }
        }
    }
}
