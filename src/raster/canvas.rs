use std::sync::Arc;

use egui::{Pos2, Rect, pos2};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::ops::geometry;

use super::{BlendMode, Image, Paint, PaintStyle, Path, Surface, blend_pixel};

/// Row-major 2×3 affine transform: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
/// Matches the (a, b, c, d, e, f) layout of 2D canvas APIs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub m: [f32; 6],
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn translation(tx: f32, ty: f32) -> Self {
        Transform {
            m: [1.0, 0.0, 0.0, 1.0, tx, ty],
        }
    }

    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Transform {
            m: [cos, sin, -sin, cos, 0.0, 0.0],
        }
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Transform {
            m: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// `self ∘ other`: apply `other` first, then `self`. This is the "local
    /// space" composition 2D canvases use for translate/rotate/scale calls.
    pub fn concat(&self, other: &Transform) -> Transform {
        let [a1, b1, c1, d1, e1, f1] = self.m;
        let [a2, b2, c2, d2, e2, f2] = other.m;
        Transform {
            m: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * e2 + c1 * f2 + e1,
                b1 * e2 + d1 * f2 + f1,
            ],
        }
    }

    #[inline]
    pub fn apply(&self, p: Pos2) -> Pos2 {
        let [a, b, c, d, e, f] = self.m;
        pos2(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Inverse transform, or `None` when degenerate (zero scale).
    pub fn invert(&self) -> Option<Transform> {
        let [a, b, c, d, e, f] = self.m;
        let det = a * d - b * c;
        if det.abs() < 1e-8 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform {
            m: [
                d * inv,
                -b * inv,
                -c * inv,
                a * inv,
                (c * f - d * e) * inv,
                (b * e - a * f) * inv,
            ],
        })
    }

    /// If this transform is a pure whole-pixel translation, return it.
    /// Integer blits take an exact byte-copy path through this check.
    pub(crate) fn as_integer_translation(&self) -> Option<(i32, i32)> {
        let [a, b, c, d, e, f] = self.m;
        const EPS: f32 = 1e-4;
        if (a - 1.0).abs() > EPS || b.abs() > EPS || c.abs() > EPS || (d - 1.0).abs() > EPS {
            return None;
        }
        let (rx, ry) = (e.round(), f.round());
        if (e - rx).abs() > EPS || (f - ry).abs() > EPS {
            return None;
        }
        Some((rx as i32, ry as i32))
    }

    /// Largest per-axis length scaling, used to pad rasterization bounds.
    fn max_scale(&self) -> f32 {
        let [a, b, c, d, ..] = self.m;
        let sx = (a * a + b * b).sqrt();
        let sy = (c * c + d * d).sqrt();
        sx.max(sy)
    }
}

#[derive(Clone)]
struct CanvasState {
    transform: Transform,
    clip: Option<Arc<GrayImage>>,
}

/// A drawing pass over a surface: transform stack, clip, and draw operations.
/// Dropping the canvas forgets transform/clip state; pixel changes stay.
pub struct Canvas<'a> {
    surface: &'a mut Surface,
    state: CanvasState,
    stack: Vec<CanvasState>,
}

impl<'a> Canvas<'a> {
    pub(super) fn new(surface: &'a mut Surface) -> Self {
        Canvas {
            surface,
            state: CanvasState {
                transform: Transform::IDENTITY,
                clip: None,
            },
            stack: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    //  Transform stack
    // ------------------------------------------------------------------

    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    /// Pop back to the last `save`. With nothing saved this is a no-op.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self
            .state
            .transform
            .concat(&Transform::translation(dx, dy));
    }

    pub fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform.concat(&Transform::rotation(radians));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.concat(&Transform::scaling(sx, sy));
    }

    /// Intersect the clip with a polygon path, transformed by the current
    /// transform. Coverage is binary, the same rule `draw_path` fills with,
    /// so clipping and filling the same polygon touch the same pixels.
    pub fn clip_path(&mut self, path: &Path) {
        let w = self.surface.width();
        let h = self.surface.height();
        let mut mask = GrayImage::new(w, h);
        for contour in path.contours() {
            if contour.points.len() < 3 {
                continue;
            }
            let device: Vec<Pos2> = contour
                .points
                .iter()
                .map(|p| self.state.transform.apply(*p))
                .collect();
            scanline_polygon(&device, w, h, |x, y| {
                mask.put_pixel(x, y, Luma([255u8]));
            });
        }
        if let Some(existing) = &self.state.clip {
            for (m, e) in mask.pixels_mut().zip(existing.pixels()) {
                m.0[0] = m.0[0].min(e.0[0]);
            }
        }
        self.state.clip = Some(Arc::new(mask));
    }

    // ------------------------------------------------------------------
    //  Draw operations
    // ------------------------------------------------------------------

    /// Wipe the whole surface to transparent, ignoring transform and clip.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Fill or stroke an axis-aligned rectangle under the current transform.
    pub fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.draw_sdf_shape(rect, paint, false);
    }

    /// Fill or stroke the ellipse inscribed in `rect` under the current
    /// transform.
    pub fn draw_oval(&mut self, rect: Rect, paint: &Paint) {
        self.draw_sdf_shape(rect, paint, true);
    }

    /// Draw a path: filled contours use binary scanline coverage, stroked
    /// contours expand each segment into a filled quad (dashed if requested).
    pub fn draw_path(&mut self, path: &Path, paint: &Paint) {
        match paint.style {
            PaintStyle::Fill => self.fill_path(path, paint),
            PaintStyle::Stroke { width } => self.stroke_path(path, width, paint),
        }
        self.surface.mark_dirty();
    }

    /// Draw an image with its top-left corner at `pos` under the current
    /// transform. A pure whole-pixel translation copies bytes exactly;
    /// anything else inverse-maps with bilinear sampling.
    pub fn draw_image(&mut self, img: &Image, pos: Pos2, paint: &Paint) {
        let t = self
            .state
            .transform
            .concat(&Transform::translation(pos.x, pos.y));

        if paint.blend == BlendMode::SrcOver
            && (paint.alpha - 1.0).abs() < 1e-6
            && let Some((tx, ty)) = t.as_integer_translation()
        {
            self.blit_integer(img, tx, ty);
            self.surface.mark_dirty();
            return;
        }

        self.blit_mapped(img, &t, paint);
        self.surface.mark_dirty();
    }

    // ------------------------------------------------------------------
    //  Internals
    // ------------------------------------------------------------------

    fn clip_allows(clip: &Option<Arc<GrayImage>>, x: u32, y: u32) -> bool {
        match clip {
            Some(mask) => mask.get_pixel(x, y).0[0] > 0,
            None => true,
        }
    }

    /// SDF rasterizer shared by rect and oval: inverse-map each pixel centre
    /// in the transformed bounding box into shape-local space and evaluate
    /// coverage there.
    fn draw_sdf_shape(&mut self, rect: Rect, paint: &Paint, oval: bool) {
        let Some(inverse) = self.state.transform.invert() else {
            return;
        };

        let half_stroke = match paint.style {
            PaintStyle::Stroke { width } => width * 0.5,
            PaintStyle::Fill => 0.0,
        };

        // Device bounding box of the transformed rect, padded for stroke + AA.
        let corners = [
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
        ];
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for c in corners {
            let p = self.state.transform.apply(c);
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let pad = 2.0 + half_stroke * self.state.transform.max_scale();
        let w = self.surface.width();
        let h = self.surface.height();
        let x0 = ((min_x - pad).floor() as i32).max(0);
        let y0 = ((min_y - pad).floor() as i32).max(0);
        let x1 = ((max_x + pad).ceil() as i32).min(w as i32);
        let y1 = ((max_y + pad).ceil() as i32).min(h as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let cx = rect.center().x;
        let cy = rect.center().y;
        let hx = rect.width() * 0.5;
        let hy = rect.height() * 0.5;
        let src_color = paint.color;
        let src_alpha = paint.alpha;
        let blend = paint.blend;
        let aa = paint.anti_alias;
        let stroked = half_stroke > 0.0;
        let clip = self.state.clip.clone();

        let row_bytes = w as usize * 4;
        let buf: &mut [u8] = self.surface.pixels_mut();
        buf[y0 as usize * row_bytes..y1 as usize * row_bytes]
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(row, row_buf)| {
                let y = y0 as u32 + row as u32;
                let py = y as f32 + 0.5;
                for x in x0 as u32..x1 as u32 {
                    if !Self::clip_allows(&clip, x, y) {
                        continue;
                    }
                    let px = x as f32 + 0.5;
                    let local = inverse.apply(pos2(px, py));
                    let d = if oval {
                        sdf_ellipse(local.x - cx, local.y - cy, hx, hy)
                    } else {
                        sdf_box(local.x - cx, local.y - cy, hx, hy)
                    };
                    let d = if stroked { d.abs() - half_stroke } else { d };
                    let coverage = if aa {
                        smoothstep(0.5, -0.5, d)
                    } else if d < 0.0 {
                        1.0
                    } else {
                        0.0
                    };
                    if coverage <= 0.001 {
                        continue;
                    }
                    let idx = x as usize * 4;
                    let dst = Rgba([
                        row_buf[idx],
                        row_buf[idx + 1],
                        row_buf[idx + 2],
                        row_buf[idx + 3],
                    ]);
                    let src = src_color.to_rgba8(src_alpha * coverage);
                    let out = blend_pixel(dst, src, blend);
                    row_buf[idx..idx + 4].copy_from_slice(&out.0);
                }
            });
        self.surface.mark_dirty();
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let w = self.surface.width();
        let h = self.surface.height();
        let transform = self.state.transform;
        let clip = self.state.clip.clone();
        let src = paint.color.to_rgba8(paint.alpha);
        let blend = paint.blend;
        for contour in path.contours() {
            if contour.points.len() < 3 {
                continue;
            }
            let device: Vec<Pos2> = contour.points.iter().map(|p| transform.apply(*p)).collect();
            let pixels = self.surface.pixels_mut();
            scanline_polygon(&device, w, h, |x, y| {
                if Self::clip_allows(&clip, x, y) {
                    let dst = *pixels.get_pixel(x, y);
                    pixels.put_pixel(x, y, blend_pixel(dst, src, blend));
                }
            });
        }
    }

    fn stroke_path(&mut self, path: &Path, width: f32, paint: &Paint) {
        let w = self.surface.width();
        let h = self.surface.height();
        let transform = self.state.transform;
        let clip = self.state.clip.clone();
        let src = paint.color.to_rgba8(paint.alpha);
        let blend = paint.blend;
        let half = (width * 0.5).max(0.5);
        for contour in path.contours() {
            if contour.points.len() < 2 {
                continue;
            }
            let device: Vec<Pos2> = contour.points.iter().map(|p| transform.apply(*p)).collect();
            let segments = match paint.dash {
                Some(dash) => {
                    geometry::dash_polyline(&device, contour.closed, dash.on, dash.off, dash.phase)
                }
                None => {
                    let mut segs: Vec<(Pos2, Pos2)> =
                        device.windows(2).map(|s| (s[0], s[1])).collect();
                    if contour.closed && device.len() > 2 {
                        segs.push((device[device.len() - 1], device[0]));
                    }
                    segs
                }
            };
            for (a, b) in segments {
                let quad = geometry::segment_quad(a, b, half);
                let pixels = self.surface.pixels_mut();
                scanline_polygon(&quad, w, h, |x, y| {
                    if Self::clip_allows(&clip, x, y) {
                        let dst = *pixels.get_pixel(x, y);
                        pixels.put_pixel(x, y, blend_pixel(dst, src, blend));
                    }
                });
            }
        }
    }

    /// Exact whole-pixel blit. Still consults the clip mask; the blend is
    /// src-over, whose opaque/empty fast paths copy bytes verbatim.
    fn blit_integer(&mut self, img: &Image, tx: i32, ty: i32) {
        let w = self.surface.width() as i32;
        let h = self.surface.height() as i32;
        let clip = self.state.clip.clone();
        let pixels = self.surface.pixels_mut();
        for sy in 0..img.height() as i32 {
            let dy = ty + sy;
            if dy < 0 || dy >= h {
                continue;
            }
            for sx in 0..img.width() as i32 {
                let dx = tx + sx;
                if dx < 0 || dx >= w {
                    continue;
                }
                let (dx, dy) = (dx as u32, dy as u32);
                if !Self::clip_allows(&clip, dx, dy) {
                    continue;
                }
                let src = img.get_pixel(sx as u32, sy as u32);
                let dst = *pixels.get_pixel(dx, dy);
                pixels.put_pixel(dx, dy, super::src_over(dst, src));
            }
        }
    }

    /// General image draw: inverse-map destination pixels into image space
    /// and sample bilinearly (or nearest when anti-aliasing is off).
    fn blit_mapped(&mut self, img: &Image, t: &Transform, paint: &Paint) {
        let Some(inverse) = t.invert() else {
            return;
        };
        let iw = img.width();
        let ih = img.height();
        let corners = [
            pos2(0.0, 0.0),
            pos2(iw as f32, 0.0),
            pos2(iw as f32, ih as f32),
            pos2(0.0, ih as f32),
        ];
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for c in corners {
            let p = t.apply(c);
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let w = self.surface.width();
        let h = self.surface.height();
        let x0 = ((min_x - 1.0).floor() as i32).max(0);
        let y0 = ((min_y - 1.0).floor() as i32).max(0);
        let x1 = ((max_x + 1.0).ceil() as i32).min(w as i32);
        let y1 = ((max_y + 1.0).ceil() as i32).min(h as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let clip = self.state.clip.clone();
        let alpha = paint.alpha.clamp(0.0, 1.0);
        let blend = paint.blend;
        let use_aa = paint.anti_alias;
        let source = img.pixels();

        let row_bytes = w as usize * 4;
        let buf: &mut [u8] = self.surface.pixels_mut();
        buf[y0 as usize * row_bytes..y1 as usize * row_bytes]
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(row, row_buf)| {
                let y = y0 as u32 + row as u32;
                let py = y as f32 + 0.5;
                for x in x0 as u32..x1 as u32 {
                    if !Self::clip_allows(&clip, x, y) {
                        continue;
                    }
                    let px = x as f32 + 0.5;
                    let local = inverse.apply(pos2(px, py));
                    if local.x < -0.5
                        || local.y < -0.5
                        || local.x >= iw as f32 + 0.5
                        || local.y >= ih as f32 + 0.5
                    {
                        continue;
                    }
                    let mut src = if use_aa {
                        sample_bilinear(source, local.x - 0.5, local.y - 0.5, iw, ih)
                    } else {
                        let ix = (local.x.max(0.0) as u32).min(iw - 1);
                        let iy = (local.y.max(0.0) as u32).min(ih - 1);
                        *source.get_pixel(ix, iy)
                    };
                    if alpha < 1.0 {
                        src[3] = (src[3] as f32 * alpha).round() as u8;
                    }
                    if src[3] == 0 {
                        continue;
                    }
                    let idx = x as usize * 4;
                    let dst = Rgba([
                        row_buf[idx],
                        row_buf[idx + 1],
                        row_buf[idx + 2],
                        row_buf[idx + 3],
                    ]);
                    let out = blend_pixel(dst, src, blend);
                    row_buf[idx..idx + 4].copy_from_slice(&out.0);
                }
            });
    }
}

/// Scanline polygon fill with binary coverage: for each pixel row, collect
/// edge crossings at the row centre, sort, and fill between pairs. The same
/// rule backs path fills, strokes (per quad), and clip masks, which is what
/// makes cut/erase/restore land on identical pixels.
fn scanline_polygon<F: FnMut(u32, u32)>(points: &[Pos2], width: u32, height: u32, mut set: F) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let mut min_y = f32::MAX;
    let mut max_y = f32::MIN;
    for p in points {
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let y_start = (min_y.floor().max(0.0)) as u32;
    let y_end = (max_y.ceil().max(0.0).min(height as f32)) as u32;

    let mut nodes: Vec<f32> = Vec::new();
    for y in y_start..y_end {
        let yf = y as f32 + 0.5;
        nodes.clear();
        for i in 0..n {
            let j = (i + 1) % n;
            let yi = points[i].y;
            let yj = points[j].y;
            if (yi < yf && yj >= yf) || (yj < yf && yi >= yf) {
                let t = (yf - yi) / (yj - yi);
                nodes.push(points[i].x + t * (points[j].x - points[i].x));
            }
        }
        nodes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mut k = 0;
        while k + 1 < nodes.len() {
            // Pixel-centre rule on both axes. Coverage never leaves the
            // floor/ceil integer bounds of the polygon, which the selection
            // cut depends on.
            let x_start = ((nodes[k] - 0.5).ceil().max(0.0) as u32).min(width);
            let x_end = ((nodes[k + 1] + 0.5).floor().max(0.0) as u32).min(width);
            for x in x_start..x_end {
                set(x, y);
            }
            k += 2;
        }
    }
}

/// SDF for a box centred at origin with half-extents (hx, hy).
#[inline]
fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

/// SDF for an ellipse (approximation): normalise to circle space, then scale
/// the distance back by the local gradient.
#[inline]
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

/// Smoothstep between edge0 and edge1.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Bilinear interpolation sample from an RgbaImage at fractional coords.
/// Clamp-to-edge for out-of-bounds samples so borders don't darken against
/// transparent black.
#[inline]
fn sample_bilinear(img: &RgbaImage, x: f32, y: f32, w: u32, h: u32) -> Rgba<u8> {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let sample = |sx: i32, sy: i32| -> [f32; 4] {
        let cx = sx.clamp(0, w as i32 - 1) as u32;
        let cy = sy.clamp(0, h as i32 - 1) as u32;
        let p = img.get_pixel(cx, cy).0;
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let p00 = sample(x0, y0);
    let p10 = sample(x0 + 1, y0);
    let p01 = sample(x0, y0 + 1);
    let p11 = sample(x0 + 1, y0 + 1);

    let inv_fx = 1.0 - fx;
    let inv_fy = 1.0 - fy;
    let w00 = inv_fx * inv_fy;
    let w10 = fx * inv_fy;
    let w01 = inv_fx * fy;
    let w11 = fx * fy;

    Rgba([
        (p00[0] * w00 + p10[0] * w10 + p01[0] * w01 + p11[0] * w11)
            .round()
            .clamp(0.0, 255.0) as u8,
        (p00[1] * w00 + p10[1] * w10 + p01[1] * w01 + p11[1] * w11)
            .round()
            .clamp(0.0, 255.0) as u8,
        (p00[2] * w00 + p10[2] * w10 + p01[2] * w01 + p11[2] * w11)
            .round()
            .clamp(0.0, 255.0) as u8,
        (p00[3] * w00 + p10[3] * w10 + p01[3] * w01 + p11[3] * w11)
            .round()
            .clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Color;

    #[test]
    fn transform_invert_round_trips() {
        let t = Transform::translation(3.5, -2.0)
            .concat(&Transform::rotation(0.7))
            .concat(&Transform::scaling(2.0, 0.5));
        let inv = t.invert().unwrap();
        let p = pos2(13.0, -7.5);
        let back = inv.apply(t.apply(p));
        assert!((back.x - p.x).abs() < 1e-3);
        assert!((back.y - p.y).abs() < 1e-3);
    }

    #[test]
    fn integer_translation_detection() {
        assert_eq!(
            Transform::translation(4.0, -3.0).as_integer_translation(),
            Some((4, -3))
        );
        assert_eq!(
            Transform::translation(4.25, 0.0).as_integer_translation(),
            None
        );
        assert_eq!(Transform::rotation(0.3).as_integer_translation(), None);
    }

    #[test]
    fn fill_rect_covers_interior_only() {
        let mut surface = Surface::new(8, 8).unwrap();
        let mut canvas = surface.canvas();
        canvas.draw_rect(
            Rect::from_min_max(pos2(2.0, 2.0), pos2(6.0, 6.0)),
            &Paint::fill(Color::BLACK),
        );
        drop(canvas);
        assert_eq!(surface.pixels().get_pixel(4, 4).0, [0, 0, 0, 255]);
        assert_eq!(surface.pixels().get_pixel(0, 0).0[3], 0);
        assert_eq!(surface.pixels().get_pixel(7, 7).0[3], 0);
    }

    #[test]
    fn stroke_rect_leaves_centre_empty() {
        let mut surface = Surface::new(32, 32).unwrap();
        let mut canvas = surface.canvas();
        canvas.draw_rect(
            Rect::from_min_max(pos2(4.0, 4.0), pos2(28.0, 28.0)),
            &Paint::stroke(Color::BLACK, 2.0),
        );
        drop(canvas);
        assert!(surface.pixels().get_pixel(16, 16).0[3] == 0);
        assert!(surface.pixels().get_pixel(16, 4).0[3] > 0);
    }

    #[test]
    fn clip_restricts_fill() {
        let mut surface = Surface::new(16, 16).unwrap();
        let mut canvas = surface.canvas();
        let clip = Path::from_polygon(&[
            pos2(0.0, 0.0),
            pos2(8.0, 0.0),
            pos2(8.0, 16.0),
            pos2(0.0, 16.0),
        ]);
        canvas.clip_path(&clip);
        canvas.draw_rect(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(16.0, 16.0)),
            &Paint::fill(Color::BLACK),
        );
        drop(canvas);
        assert!(surface.pixels().get_pixel(3, 8).0[3] > 0);
        assert_eq!(surface.pixels().get_pixel(12, 8).0[3], 0);
    }

    #[test]
    fn integer_blit_copies_bytes() {
        let mut src = Surface::new(3, 2).unwrap();
        src.pixels_mut().put_pixel(0, 0, Rgba([7, 13, 19, 201]));
        src.pixels_mut().put_pixel(2, 1, Rgba([250, 0, 90, 130]));
        let img = src.snapshot();

        let mut dst = Surface::new(8, 8).unwrap();
        let mut canvas = dst.canvas();
        canvas.draw_image(&img, pos2(3.0, 2.0), &Paint::default());
        drop(canvas);
        assert_eq!(dst.pixels().get_pixel(3, 2).0, [7, 13, 19, 201]);
        assert_eq!(dst.pixels().get_pixel(5, 3).0, [250, 0, 90, 130]);
        assert_eq!(dst.pixels().get_pixel(4, 2).0[3], 0);
    }

    #[test]
    fn scanline_fill_shifts_exactly_with_integer_offsets() {
        let tri = [pos2(2.3, 1.1), pos2(11.7, 4.6), pos2(4.2, 10.9)];
        let mut base: Vec<(u32, u32)> = Vec::new();
        scanline_polygon(&tri, 32, 32, |x, y| base.push((x, y)));

        let shifted_tri: Vec<Pos2> = tri.iter().map(|p| pos2(p.x + 5.0, p.y + 7.0)).collect();
        let mut shifted: Vec<(u32, u32)> = Vec::new();
        scanline_polygon(&shifted_tri, 32, 32, |x, y| shifted.push((x, y)));

        let expect: Vec<(u32, u32)> = base.iter().map(|&(x, y)| (x + 5, y + 7)).collect();
        assert_eq!(shifted, expect);
    }

    #[test]
    fn erase_blend_clears_polygon_interior() {
        let mut surface = Surface::new(16, 16).unwrap();
        let mut canvas = surface.canvas();
        canvas.draw_rect(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(16.0, 16.0)),
            &Paint {
                anti_alias: false,
                ..Paint::fill(Color::WHITE)
            },
        );
        let poly = Path::from_polygon(&[
            pos2(4.0, 4.0),
            pos2(12.0, 4.0),
            pos2(12.0, 12.0),
            pos2(4.0, 12.0),
        ]);
        canvas.draw_path(
            &poly,
            &Paint {
                blend: BlendMode::Clear,
                ..Paint::fill(Color::BLACK)
            },
        );
        drop(canvas);
        assert_eq!(surface.pixels().get_pixel(8, 8).0, [0, 0, 0, 0]);
        assert_eq!(surface.pixels().get_pixel(1, 1).0, [255, 255, 255, 255]);
    }
}
