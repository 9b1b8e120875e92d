// ============================================================================
// BRUSH — cached stamp rasterizer for the pen and eraser tools
// ============================================================================

use egui::{Pos2, Rect, pos2};
use log::warn;

use crate::config::{BrushConfig, BrushShape};
use crate::ops::geometry;
use crate::raster::{BlendMode, Canvas, Color, Image, Paint, Surface};

/// Stamps larger than this on either edge are never cached; such brushes
/// render as vector primitives on every stamp instead.
pub const MAX_STAMP_EDGE: u32 = 1024;

/// Walk density along a stroke segment, in pixels.
const MAX_STEP: f32 = 0.2;
const MIN_STEP: f32 = 0.01;

/// Cache key for the stamp image. Rotation is deliberately absent: it is
/// applied per-blit around the stamp centre, so rotating alone never
/// rebuilds.
#[derive(Clone, Copy, PartialEq)]
struct StampKey {
    shape: BrushShape,
    stroke_width: f32,
    width_scale: f32,
    height_scale: f32,
}

impl StampKey {
    fn of(cfg: &BrushConfig) -> Self {
        StampKey {
            shape: cfg.shape(),
            stroke_width: cfg.stroke_width(),
            width_scale: cfg.width_scale(),
            height_scale: cfg.height_scale(),
        }
    }
}

/// Builds and blits the brush stamp. One engine serves both the pen and the
/// eraser; the eraser reuses the pen geometry with the erase blend.
#[derive(Default)]
pub struct BrushEngine {
    stamp: Option<Image>,
    key: Option<StampKey>,
}

impl BrushEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached stamp for these settings, rebuilding if the size-affecting
    /// fields changed since the last call. `None` means the brush is too
    /// large to cache and takes the vector path.
    pub fn stamp(&mut self, cfg: &BrushConfig) -> Option<&Image> {
        let key = StampKey::of(cfg);
        if self.key != Some(key) {
            self.key = Some(key);
            self.stamp = build_stamp(cfg);
        }
        self.stamp.as_ref()
    }

    /// Stamp once at `pos` under the configured rotation and opacity.
    pub fn stamp_at(
        &mut self,
        canvas: &mut Canvas<'_>,
        cfg: &BrushConfig,
        pos: Pos2,
        erase: bool,
    ) {
        let blend = if erase {
            BlendMode::Clear
        } else {
            BlendMode::SrcOver
        };
        canvas.save();
        canvas.translate(pos.x, pos.y);
        canvas.rotate(cfg.rotation_deg().to_radians());
        match self.stamp(cfg) {
            Some(stamp) => {
                let paint = Paint::fill(Color::BLACK)
                    .with_alpha(cfg.opacity())
                    .with_blend(blend);
                let (w, h) = (stamp.width() as f32, stamp.height() as f32);
                canvas.translate(-w * 0.5, -h * 0.5);
                canvas.draw_image(stamp, pos2(0.0, 0.0), &paint);
            }
            None => {
                let (rx, ry) = cfg.radii();
                let paint = Paint::fill(Color::BLACK)
                    .with_alpha(cfg.opacity())
                    .with_blend(blend);
                let rect = Rect::from_min_max(pos2(-rx, -ry), pos2(rx, ry));
                match cfg.shape() {
                    BrushShape::Ellipse => canvas.draw_oval(rect, &paint),
                    BrushShape::Rect => canvas.draw_rect(rect, &paint),
                }
            }
        }
        canvas.restore();
    }

    /// Walk a stroke segment and stamp at every sub-step, endpoints
    /// inclusive. A zero-length segment stamps exactly once.
    pub fn stamp_segment(
        &mut self,
        canvas: &mut Canvas<'_>,
        cfg: &BrushConfig,
        from: Pos2,
        to: Pos2,
        erase: bool,
    ) {
        let (rx, ry) = cfg.radii();
        let step = MAX_STEP.min(rx.min(ry)).max(MIN_STEP);
        let dist = geometry::distance(from, to);
        let steps = (dist / step).ceil() as u32;
        for i in 0..=steps {
            let t = i as f32 / steps.max(1) as f32;
            self.stamp_at(canvas, cfg, geometry::lerp(from, to, t), erase);
        }
    }
}

/// Rasterize the brush footprint into an offscreen image: full alpha, black
/// ink, ellipse or rect inscribed in the bounding box. Opacity is applied at
/// blit time so one stamp serves every opacity.
fn build_stamp(cfg: &BrushConfig) -> Option<Image> {
    let (rx, ry) = cfg.radii();
    let w = (rx * 2.0).ceil().max(1.0) as u32;
    let h = (ry * 2.0).ceil().max(1.0) as u32;
    if w > MAX_STAMP_EDGE || h > MAX_STAMP_EDGE {
        return None;
    }
    let mut surface = match Surface::new(w, h) {
        Ok(surface) => surface,
        Err(err) => {
            warn!("brush stamp allocation failed: {err}");
            return None;
        }
    };
    let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(rx * 2.0, ry * 2.0));
    let paint = Paint::fill(Color::BLACK);
    {
        let mut canvas = surface.canvas();
        match cfg.shape() {
            BrushShape::Ellipse => canvas.draw_oval(rect, &paint),
            BrushShape::Rect => canvas.draw_rect(rect, &paint),
        }
    }
    Some(surface.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen(width: f32) -> BrushConfig {
        let mut cfg = BrushConfig::default();
        cfg.set_stroke_width(width);
        cfg
    }

    #[test]
    fn stamp_matches_brush_bounding_box() {
        let mut engine = BrushEngine::new();
        let stamp = engine.stamp(&pen(24.0)).unwrap().clone();
        assert_eq!((stamp.width(), stamp.height()), (24, 24));

        let mut squashed = pen(24.0);
        squashed.set_height_scale(0.5);
        let stamp = engine.stamp(&squashed).unwrap().clone();
        assert_eq!((stamp.width(), stamp.height()), (24, 12));
    }

    #[test]
    fn rotation_changes_reuse_the_cached_stamp() {
        let mut engine = BrushEngine::new();
        let mut cfg = pen(24.0);
        let before = engine.stamp(&cfg).unwrap().clone();
        cfg.set_rotation_deg(45.0);
        let after = engine.stamp(&cfg).unwrap().clone();
        assert!(std::ptr::eq(before.pixels(), after.pixels()));
    }

    #[test]
    fn size_changes_rebuild_the_stamp() {
        let mut engine = BrushEngine::new();
        let mut cfg = pen(24.0);
        let before = engine.stamp(&cfg).unwrap().clone();
        cfg.set_stroke_width(25.0);
        let after = engine.stamp(&cfg).unwrap().clone();
        assert!(!std::ptr::eq(before.pixels(), after.pixels()));
        assert_eq!(after.width(), 25);

        cfg.set_stroke_width(24.0);
        cfg.set_width_scale(2.0);
        let scaled = engine.stamp(&cfg).unwrap().clone();
        assert_eq!(scaled.width(), 48);
    }

    #[test]
    fn vector_fallback_matches_the_cached_stamp_pixels() {
        let cfg = pen(24.0);
        let mut stamped = Surface::new(64, 64).unwrap();
        let mut engine = BrushEngine::new();
        engine.stamp_at(&mut stamped.canvas(), &cfg, pos2(32.0, 32.0), false);

        let mut fallback = Surface::new(64, 64).unwrap();
        let mut bare = BrushEngine {
            stamp: None,
            key: Some(StampKey::of(&cfg)),
        };
        bare.stamp_at(&mut fallback.canvas(), &cfg, pos2(32.0, 32.0), false);

        assert_eq!(stamped.pixels().as_raw(), fallback.pixels().as_raw());
    }

    #[test]
    fn zero_length_segment_stamps_exactly_once() {
        let mut cfg = pen(24.0);
        cfg.set_opacity(0.5);
        let mut surface = Surface::new(64, 64).unwrap();
        let mut engine = BrushEngine::new();
        engine.stamp_segment(
            &mut surface.canvas(),
            &cfg,
            pos2(32.0, 32.0),
            pos2(32.0, 32.0),
            false,
        );
        // A second overlapping stamp would lift the centre alpha past 128.
        let alpha = surface.pixels().get_pixel(32, 32)[3];
        assert!((126..=129).contains(&alpha), "alpha {alpha}");
    }

    #[test]
    fn eraser_stamp_knocks_out_painted_pixels() {
        let cfg = pen(24.0);
        let mut surface = Surface::new(64, 64).unwrap();
        let mut engine = BrushEngine::new();
        engine.stamp_at(&mut surface.canvas(), &cfg, pos2(32.0, 32.0), false);
        assert_eq!(surface.pixels().get_pixel(32, 32)[3], 255);
        engine.stamp_at(&mut surface.canvas(), &cfg, pos2(32.0, 32.0), true);
        assert_eq!(surface.pixels().get_pixel(32, 32)[3], 0);
    }
}
