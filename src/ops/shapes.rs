// ============================================================================
// SHAPES — primitive shape resolution for the drag-to-commit shape tool
// ============================================================================

use egui::{Pos2, Rect, pos2};
use serde::{Deserialize, Serialize};

use crate::ops::geometry;
use crate::raster::{Canvas, Color, Paint};

/// Available shape primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Rect,
    Ellipse,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Rect => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Line, ShapeKind::Rect, ShapeKind::Ellipse]
    }
}

/// Geometry of a shape drag, resolved to drawable form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolvedShape {
    /// Lines render as a filled quad offset by half the stroke width on each
    /// side of the segment, matching the filled-coverage rendering the brush
    /// uses. A zero-length drag degenerates to an empty quad.
    Line([Pos2; 4]),
    Rect(Rect),
    Ellipse(Rect),
}

/// Resolve a drag from `start` to `end` into shape geometry. Rect and ellipse
/// take the per-axis min/max of the two corners, so reversed drags produce
/// the identical shape.
pub fn resolve(kind: ShapeKind, start: Pos2, end: Pos2, stroke_width: f32) -> ResolvedShape {
    match kind {
        ShapeKind::Line => {
            ResolvedShape::Line(geometry::segment_quad(start, end, stroke_width * 0.5))
        }
        ShapeKind::Rect | ShapeKind::Ellipse => {
            let l = start.x.min(end.x);
            let r = start.x.max(end.x);
            let t = start.y.min(end.y);
            let b = start.y.max(end.y);
            let rect = Rect::from_min_max(pos2(l, t), pos2(r, b));
            if kind == ShapeKind::Rect {
                ResolvedShape::Rect(rect)
            } else {
                ResolvedShape::Ellipse(rect)
            }
        }
    }
}

/// Draw the resolved drag geometry. Used for both the live overlay preview
/// and the commit onto the permanent surface.
pub fn draw_shape(
    canvas: &mut Canvas<'_>,
    kind: ShapeKind,
    start: Pos2,
    end: Pos2,
    stroke_width: f32,
    color: Color,
) {
    match resolve(kind, start, end, stroke_width) {
        ResolvedShape::Line(quad) => {
            let path = crate::raster::Path::from_polygon(&quad);
            canvas.draw_path(&path, &Paint::fill(color));
        }
        // A zero-length drag resolves to a point, not a shape. The stroked
        // outline of a point would still ink a dot, so skip it outright.
        ResolvedShape::Rect(rect) if rect.width() == 0.0 && rect.height() == 0.0 => {}
        ResolvedShape::Ellipse(rect) if rect.width() == 0.0 && rect.height() == 0.0 => {}
        ResolvedShape::Rect(rect) => {
            canvas.draw_rect(rect, &Paint::stroke(color, stroke_width));
        }
        ResolvedShape::Ellipse(rect) => {
            canvas.draw_oval(rect, &Paint::stroke(color, stroke_width));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_resolution_is_drag_direction_independent() {
        let forward = resolve(ShapeKind::Rect, pos2(10.0, 10.0), pos2(50.0, 40.0), 2.0);
        let reverse = resolve(ShapeKind::Rect, pos2(50.0, 40.0), pos2(10.0, 10.0), 2.0);
        assert_eq!(forward, reverse);
        let ResolvedShape::Rect(rect) = forward else {
            panic!("expected rect");
        };
        assert_eq!(rect.min, pos2(10.0, 10.0));
        assert_eq!(rect.max, pos2(50.0, 40.0));
    }

    #[test]
    fn ellipse_uses_the_same_normalized_bounds() {
        let a = resolve(ShapeKind::Ellipse, pos2(0.0, 30.0), pos2(20.0, 0.0), 2.0);
        let ResolvedShape::Ellipse(rect) = a else {
            panic!("expected ellipse");
        };
        assert_eq!(rect.min, pos2(0.0, 0.0));
        assert_eq!(rect.max, pos2(20.0, 30.0));
    }

    #[test]
    fn line_quad_spans_half_width_each_side() {
        let r = resolve(ShapeKind::Line, pos2(0.0, 0.0), pos2(10.0, 0.0), 4.0);
        let ResolvedShape::Line(quad) = r else {
            panic!("expected line");
        };
        assert_eq!(quad[0], pos2(0.0, 2.0));
        assert_eq!(quad[2], pos2(10.0, -2.0));
    }

    #[test]
    fn zero_length_drag_draws_nothing() {
        let mut surface = crate::raster::Surface::new(32, 32).unwrap();
        let mut canvas = surface.canvas();
        for &kind in ShapeKind::all() {
            draw_shape(
                &mut canvas,
                kind,
                pos2(16.0, 16.0),
                pos2(16.0, 16.0),
                4.0,
                Color::BLACK,
            );
        }
        drop(canvas);
        assert!(surface.pixels().pixels().all(|p| p[3] == 0));
    }
}
