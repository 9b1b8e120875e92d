// ============================================================================
// SELECTION — lasso cut, floating image, overlay composition, commit/cancel
// ============================================================================

use egui::{Pos2, pos2};
use log::{debug, warn};

use crate::ops::geometry;
use crate::raster::{BlendMode, Canvas, Color, Dash, Image, Paint, Path, Surface};

pub const SELECTION_FILL: Color = Color::rgba(0.1, 0.5, 1.0, 0.15);
pub const SELECTION_STROKE: Color = Color::rgba(0.1, 0.5, 1.0, 1.0);
const OUTLINE_WIDTH: f32 = 2.0;

/// Marching-ants dash for the given wall-clock offset. The phase advances
/// one full 14 px period every 560 ms.
pub fn ants_dash(elapsed_ms: f64) -> Dash {
    Dash {
        on: 8.0,
        off: 6.0,
        phase: ((elapsed_ms / 40.0) % 14.0) as f32,
    }
}

/// Similarity transform accumulated on a floating selection across transform
/// gestures. Rotation is radians and unbounded; it wraps only for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionTransform {
    pub tx: f32,
    pub ty: f32,
    pub scale: f32,
    pub rotation: f32,
}

impl SelectionTransform {
    pub const IDENTITY: SelectionTransform = SelectionTransform {
        tx: 0.0,
        ty: 0.0,
        scale: 1.0,
        rotation: 0.0,
    };
}

impl Default for SelectionTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Integer pixel bounding box of the lasso polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// A region cut out of the permanent surface, floating until it is committed
/// back or cancelled. Dropping the record frees the pixels; commit and
/// cancel consume `self` so a selection can never be applied twice.
pub struct Selection {
    path: Path,
    bounds: PixelBounds,
    image: Image,
    offset: Pos2,
    pub transform: SelectionTransform,
}

/// Live lasso preview: translucent fill plus marching ants over the open
/// polyline, redrawn from scratch on the overlay every move.
pub fn draw_lasso_preview(overlay: &mut Surface, points: &[Pos2], elapsed_ms: f64) {
    let mut canvas = overlay.canvas();
    canvas.clear();
    if points.len() < 2 {
        return;
    }
    let mut path = Path::new();
    path.move_to(points[0]);
    for &p in &points[1..] {
        path.line_to(p);
    }
    canvas.draw_path(&path, &Paint::fill(SELECTION_FILL));
    canvas.draw_path(
        &path,
        &Paint::stroke(SELECTION_STROKE, OUTLINE_WIDTH).with_dash(ants_dash(elapsed_ms)),
    );
}

/// Close the lasso polygon, cut the enclosed pixels off `base` into a
/// floating image, and erase them from `base`. Fewer than three points is a
/// silent no-op. The clip mask and the erase share one polygon coverage
/// rule and the cut is an exact pixel copy, so re-compositing the floating
/// image at identity restores `base` byte for byte.
pub fn finalize_lasso(points: &[Pos2], base: &mut Surface) -> Option<Selection> {
    if points.len() < 3 {
        debug!("lasso discarded with {} points", points.len());
        return None;
    }
    let (bx, by, bw, bh) = geometry::polygon_bounds(points)?;
    let path = Path::from_polygon(points);

    let mut offscreen = match Surface::new(bw, bh) {
        Ok(surface) => surface,
        Err(err) => {
            warn!("selection cut allocation failed: {err}");
            return None;
        }
    };
    let full = base.snapshot();
    {
        let mut canvas = offscreen.canvas();
        canvas.save();
        canvas.translate(-(bx as f32), -(by as f32));
        canvas.clip_path(&path);
        canvas.draw_image(&full, pos2(0.0, 0.0), &Paint::default());
        canvas.restore();
    }
    let image = offscreen.snapshot();

    {
        let mut canvas = base.canvas();
        canvas.draw_path(&path, &Paint::fill(Color::BLACK).with_blend(BlendMode::Clear));
    }

    Some(Selection {
        path,
        bounds: PixelBounds {
            x: bx,
            y: by,
            w: bw,
            h: bh,
        },
        image,
        offset: pos2(bx as f32, by as f32),
        transform: SelectionTransform::IDENTITY,
    })
}

impl Selection {
    pub fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Compose the floating image under the accumulated transform. The frame
    /// pivots about the bounding-box centre: translate out, rotate, scale,
    /// translate back by half the extents. Shared by overlay and commit so
    /// the committed pixels land exactly where the preview showed them.
    fn draw_floating_image(&self, canvas: &mut Canvas<'_>) {
        let hw = self.bounds.w as f32 / 2.0;
        let hh = self.bounds.h as f32 / 2.0;
        canvas.save();
        canvas.translate(
            self.offset.x + self.transform.tx + hw,
            self.offset.y + self.transform.ty + hh,
        );
        canvas.rotate(self.transform.rotation);
        canvas.scale(self.transform.scale, self.transform.scale);
        canvas.translate(-hw, -hh);
        canvas.draw_image(&self.image, pos2(0.0, 0.0), &Paint::default());
        canvas.restore();
    }

    /// Redraw the overlay for this frame: floating image plus the
    /// marching-ants outline along the lasso path, both under the current
    /// transform.
    pub fn draw_overlay(&self, overlay: &mut Surface, elapsed_ms: f64) {
        let mut canvas = overlay.canvas();
        canvas.clear();
        self.draw_floating_image(&mut canvas);

        let cx = self.bounds.x as f32 + self.bounds.w as f32 / 2.0;
        let cy = self.bounds.y as f32 + self.bounds.h as f32 / 2.0;
        canvas.save();
        canvas.translate(self.transform.tx, self.transform.ty);
        canvas.translate(cx, cy);
        canvas.rotate(self.transform.rotation);
        canvas.scale(self.transform.scale, self.transform.scale);
        canvas.translate(-cx, -cy);
        canvas.draw_path(
            &self.path,
            &Paint::stroke(SELECTION_STROKE, OUTLINE_WIDTH).with_dash(ants_dash(elapsed_ms)),
        );
        canvas.restore();
    }

    /// Stamp the floating image onto `base` under its transform and consume
    /// the selection.
    pub fn commit(self, base: &mut Surface) {
        let mut canvas = base.canvas();
        self.draw_floating_image(&mut canvas);
    }

    /// Put the cut pixels back exactly where they came from, discarding the
    /// accumulated transform, and consume the selection.
    pub fn cancel(self, base: &mut Surface) {
        let mut canvas = base.canvas();
        canvas.draw_image(&self.image, self.offset, &Paint::default());
    }
}
