//! Pure-computation rasterization of a [`Contour`] into an RGBA8 buffer.
//!
//! Always available (no feature gate); the `png` snapshot path wraps it.
//! A frame is painted in layers: background fill, translucent Perlin wash,
//! canvas border, contour strokes, then an optional box blur.

use glam::DVec2;
use metaballs_core::canvas::Canvas;
use metaballs_core::contour::{Contour, Segment};
use metaballs_core::error::EngineError;
use noise::{NoiseFn, Perlin};

/// Side of one wash tile in pixels.
pub const WASH_TILE: usize = 10;
const WASH_SCALE: f64 = 0.03;
const WASH_OFFSET_START: f64 = 1.0;
const WASH_OFFSET_PER_FRAME: f64 = 0.05;

/// An sRGB colour as bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Parses `#rrggbb` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, EngineError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(EngineError::InvalidColor(format!(
                "expected 6 hex digits, got {hex:?}"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| EngineError::InvalidColor(format!("{hex}: {e}")))
        };
        Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    fn to_f32(self) -> [f32; 3] {
        self.0.map(f32::from)
    }
}

/// How a contour frame is painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub background: Rgb,
    /// Colour of the contour strokes and the border.
    pub stroke: Rgb,
    /// Contour stroke width in pixels.
    pub stroke_width: f64,
    /// Border stroke width, centred on the canvas edge; 0 disables it.
    pub border_width: f64,
    /// Opacity of the Perlin wash; 0 disables it.
    pub wash_alpha: f32,
    pub wash_seed: u32,
    /// Box blur radius in pixels; 0 disables it.
    pub blur_radius: usize,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            background: Rgb([236, 236, 255]),
            stroke: Rgb([20, 20, 60]),
            stroke_width: 10.0,
            border_width: 15.0,
            wash_alpha: 0.5,
            wash_seed: 0,
            blur_radius: 2,
        }
    }
}

impl StrokeStyle {
    /// Strokes and background only, for exact pixel checks.
    pub fn plain() -> Self {
        Self {
            border_width: 0.0,
            wash_alpha: 0.0,
            blur_radius: 0,
            ..Self::default()
        }
    }
}

/// Paints `contour` on a `canvas`-sized RGBA8 buffer (`width * height * 4`
/// bytes, alpha always 255).
///
/// `frame` advances the wash through noise space, so consecutive frames
/// drift the way the live animation does.
pub fn contour_to_rgba(
    contour: &Contour,
    canvas: &Canvas,
    style: &StrokeStyle,
    frame: usize,
) -> Vec<u8> {
    let (w, h) = (canvas.width(), canvas.height());
    let mut rgb = vec![style.background.to_f32(); w * h];

    if style.wash_alpha > 0.0 {
        paint_wash(&mut rgb, w, h, style, frame);
    }

    let mut coverage = vec![0.0_f32; w * h];
    if style.border_width > 0.0 {
        border_coverage(&mut coverage, w, h, style.border_width);
    }
    for segment in &contour.segments {
        stroke_coverage(&mut coverage, w, h, segment, style.stroke_width);
    }
    let ink = style.stroke.to_f32();
    for (px, &c) in rgb.iter_mut().zip(&coverage) {
        if c > 0.0 {
            *px = blend(*px, ink, c);
        }
    }

    if style.blur_radius > 0 {
        box_blur(&mut rgb, w, h, style.blur_radius);
    }

    rgb.iter()
        .flat_map(|px| {
            let [r, g, b] = px.map(|v| v.round().clamp(0.0, 255.0) as u8);
            [r, g, b, 255u8]
        })
        .collect()
}

fn blend(under: [f32; 3], over: [f32; 3], alpha: f32) -> [f32; 3] {
    [0, 1, 2].map(|i| under[i] + (over[i] - under[i]) * alpha)
}

/// Blue-white tiles keyed on 3D Perlin noise `(x·0.03, y·0.03, offset)`.
fn paint_wash(rgb: &mut [[f32; 3]], w: usize, h: usize, style: &StrokeStyle, frame: usize) {
    let perlin = Perlin::new(style.wash_seed);
    let offset = WASH_OFFSET_START + frame as f64 * WASH_OFFSET_PER_FRAME;
    for ty in (0..h).step_by(WASH_TILE) {
        for tx in (0..w).step_by(WASH_TILE) {
            let n = perlin.get([tx as f64 * WASH_SCALE, ty as f64 * WASH_SCALE, offset]);
            let n = ((n + 1.0) * 0.5).clamp(0.0, 1.0) as f32;
            let tint = [200.0 + n * 55.0, 200.0 + n * 55.0, 255.0];
            for y in ty..(ty + WASH_TILE).min(h) {
                for px in &mut rgb[y * w + tx..y * w + (tx + WASH_TILE).min(w)] {
                    *px = blend(*px, tint, style.wash_alpha);
                }
            }
        }
    }
}

/// Anti-aliased coverage of a one-pixel ramp around distance `half_width`.
fn ramp(half_width: f64, distance: f64) -> f32 {
    (half_width + 0.5 - distance).clamp(0.0, 1.0) as f32
}

fn border_coverage(coverage: &mut [f32], w: usize, h: usize, width: f64) {
    let half = width * 0.5;
    for y in 0..h {
        for x in 0..w {
            let cx = x as f64 + 0.5;
            let cy = y as f64 + 0.5;
            let edge = cx.min(w as f64 - cx).min(cy).min(h as f64 - cy);
            let c = &mut coverage[y * w + x];
            *c = c.max(ramp(half, edge));
        }
    }
}

fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > 0.0 {
        ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (a + ab * t).distance(p)
}

fn stroke_coverage(coverage: &mut [f32], w: usize, h: usize, segment: &Segment, width: f64) {
    let half = width * 0.5;
    let reach = half + 1.0;
    let lo = segment.start.min(segment.end) - DVec2::splat(reach);
    let hi = segment.start.max(segment.end) + DVec2::splat(reach);
    let x0 = lo.x.floor().max(0.0) as usize;
    let y0 = lo.y.floor().max(0.0) as usize;
    let x1 = (hi.x.ceil().max(0.0) as usize).min(w);
    let y1 = (hi.y.ceil().max(0.0) as usize).min(h);
    for y in y0..y1 {
        for x in x0..x1 {
            let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let c = ramp(half, distance_to_segment(p, segment.start, segment.end));
            let cell = &mut coverage[y * w + x];
            *cell = cell.max(c);
        }
    }
}

/// Separable box blur with clamped edges.
fn box_blur(rgb: &mut [[f32; 3]], w: usize, h: usize, radius: usize) {
    let mut tmp = vec![[0.0_f32; 3]; rgb.len()];
    let taps = (2 * radius + 1) as f32;

    for y in 0..h {
        let row = &rgb[y * w..(y + 1) * w];
        for x in 0..w {
            let mut sum = [0.0_f32; 3];
            for k in 0..=2 * radius {
                let sx = (x + k).saturating_sub(radius).min(w - 1);
                for (s, v) in sum.iter_mut().zip(row[sx]) {
                    *s += v;
                }
            }
            tmp[y * w + x] = sum.map(|s| s / taps);
        }
    }

    for y in 0..h {
        for x in 0..w {
            let mut sum = [0.0_f32; 3];
            for k in 0..=2 * radius {
                let sy = (y + k).saturating_sub(radius).min(h - 1);
                for (s, v) in sum.iter_mut().zip(tmp[sy * w + x]) {
                    *s += v;
                }
            }
            rgb[y * w + x] = sum.map(|s| s / taps);
        }
    }
}
