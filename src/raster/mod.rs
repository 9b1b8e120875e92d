// ============================================================================
// RASTER ENGINE — software 2D surfaces, paints, images, compositing
// ============================================================================

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use thiserror::Error;

mod canvas;
mod path;

pub use canvas::{Canvas, Transform};
pub use path::Path;

/// Hard ceiling on surface size (width × height), matching what a desktop
/// machine can reasonably hold as straight RGBA8.
const MAX_SURFACE_PIXELS: u64 = 256_000_000;

/// Errors from surface and image allocation.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("surface dimensions {0}×{1} are invalid")]
    InvalidDimensions(u32, u32),
    #[error("surface dimensions {0}×{1} exceed the 256 megapixel limit")]
    TooLarge(u32, u32),
}

/// Straight-alpha RGBA color, components in 0..=1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    /// Convert to 8-bit straight RGBA with an extra alpha multiplier applied.
    pub(crate) fn to_rgba8(self, extra_alpha: f32) -> Rgba<u8> {
        let to8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba([
            to8(self.r),
            to8(self.g),
            to8(self.b),
            to8(self.a * extra_alpha.clamp(0.0, 1.0)),
        ])
    }
}

/// Compositing rule applied when paint meets the destination surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Normal painting: source over destination.
    #[default]
    SrcOver,
    /// Destructive erase: source coverage knocks out destination alpha.
    Clear,
}

/// Whether a path/shape is filled or stroked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintStyle {
    Fill,
    Stroke { width: f32 },
}

/// Dash pattern for stroked paths. Lengths are device-space pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
    pub phase: f32,
}

/// Everything needed to apply pigment: color, alpha, style, blend, dashing.
#[derive(Clone, Copy, Debug)]
pub struct Paint {
    pub color: Color,
    /// Extra alpha multiplier on top of `color.a`, 0..=1.
    pub alpha: f32,
    pub style: PaintStyle,
    pub blend: BlendMode,
    /// Stroke-only: dash the outline instead of drawing it solid.
    pub dash: Option<Dash>,
    pub anti_alias: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Paint {
            color: Color::BLACK,
            alpha: 1.0,
            style: PaintStyle::Fill,
            blend: BlendMode::SrcOver,
            dash: None,
            anti_alias: true,
        }
    }
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Paint {
            color,
            ..Paint::default()
        }
    }

    pub fn stroke(color: Color, width: f32) -> Self {
        Paint {
            color,
            style: PaintStyle::Stroke { width },
            ..Paint::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_dash(mut self, dash: Dash) -> Self {
        self.dash = Some(dash);
        self
    }
}

/// An immutable pixel snapshot. Cheap to clone — pixel data is shared.
#[derive(Clone)]
pub struct Image {
    data: Arc<RgbaImage>,
}

impl Image {
    pub(crate) fn from_pixels(pixels: RgbaImage) -> Self {
        Image {
            data: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.data.get_pixel(x, y)
    }

    pub(crate) fn pixels(&self) -> &RgbaImage {
        &self.data
    }
}

/// A mutable RGBA8 drawing target. Two of these make up the stage: the
/// permanent artwork surface and the ephemeral overlay.
pub struct Surface {
    pixels: RgbaImage,
    generation: u64,
}

impl Surface {
    /// Allocate a transparent surface. Fails on zero or oversized dimensions
    /// instead of clamping, so callers can degrade gracefully.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions(width, height));
        }
        if width as u64 * height as u64 > MAX_SURFACE_PIXELS {
            return Err(RasterError::TooLarge(width, height));
        }
        Ok(Surface {
            pixels: RgbaImage::new(width, height),
            generation: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Monotonic change counter. Bumped by every mutating operation so the
    /// shell knows when its uploaded texture is stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.generation += 1;
    }

    /// Snapshot the current pixels into an immutable, shareable image.
    pub fn snapshot(&self) -> Image {
        Image::from_pixels(self.pixels.clone())
    }

    /// Wipe the surface back to fully transparent.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
        self.mark_dirty();
    }

    /// Resize, preserving existing content anchored at the top-left.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        if width == self.width() && height == self.height() {
            return Ok(());
        }
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions(width, height));
        }
        if width as u64 * height as u64 > MAX_SURFACE_PIXELS {
            return Err(RasterError::TooLarge(width, height));
        }
        let mut next = RgbaImage::new(width, height);
        let copy_w = width.min(self.width());
        let copy_h = height.min(self.height());
        for y in 0..copy_h {
            for x in 0..copy_w {
                next.put_pixel(x, y, *self.pixels.get_pixel(x, y));
            }
        }
        self.pixels = next;
        self.mark_dirty();
        Ok(())
    }

    /// Begin a drawing pass. The canvas borrows the surface mutably; transform
    /// and clip state live on the canvas and reset when it is dropped.
    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(self)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}

/// Simple alpha-composite: src over dst, straight alpha.
///
/// The exact fast paths matter: a fully opaque source, or any source over a
/// fully transparent destination, copies source bytes verbatim. Selection
/// cut/restore relies on that to be lossless.
#[inline]
pub(crate) fn src_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 || dst[3] == 0 {
        return src;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }
    let inv = 1.0 / out_a;
    Rgba([
        ((src[0] as f32 * sa + dst[0] as f32 * da * (1.0 - sa)) * inv)
            .round()
            .clamp(0.0, 255.0) as u8,
        ((src[1] as f32 * sa + dst[1] as f32 * da * (1.0 - sa)) * inv)
            .round()
            .clamp(0.0, 255.0) as u8,
        ((src[2] as f32 * sa + dst[2] as f32 * da * (1.0 - sa)) * inv)
            .round()
            .clamp(0.0, 255.0) as u8,
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Destructive erase: source alpha knocks out destination alpha.
/// Full source coverage leaves a fully transparent pixel.
#[inline]
pub(crate) fn clear_out(dst: Rgba<u8>, src_a: u8) -> Rgba<u8> {
    if src_a == 0 {
        return dst;
    }
    if src_a == 255 {
        return Rgba([0, 0, 0, 0]);
    }
    let keep = 1.0 - src_a as f32 / 255.0;
    let a = (dst[3] as f32 * keep).round().clamp(0.0, 255.0) as u8;
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([dst[0], dst[1], dst[2], a])
}

#[inline]
pub(crate) fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>, blend: BlendMode) -> Rgba<u8> {
    match blend {
        BlendMode::SrcOver => src_over(dst, src),
        BlendMode::Clear => clear_out(dst, src[3]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_rejects_degenerate_dimensions() {
        assert!(matches!(
            Surface::new(0, 64),
            Err(RasterError::InvalidDimensions(0, 64))
        ));
        assert!(matches!(
            Surface::new(64, 0),
            Err(RasterError::InvalidDimensions(64, 0))
        ));
        assert!(matches!(
            Surface::new(20_000, 20_000),
            Err(RasterError::TooLarge(..))
        ));
        assert!(Surface::new(64, 64).is_ok());
    }

    #[test]
    fn src_over_copies_exactly_onto_transparent() {
        let src = Rgba([12, 200, 7, 180]);
        assert_eq!(src_over(Rgba([0, 0, 0, 0]), src), src);
        let opaque = Rgba([1, 2, 3, 255]);
        assert_eq!(src_over(Rgba([90, 90, 90, 90]), opaque), opaque);
        let dst = Rgba([9, 8, 7, 6]);
        assert_eq!(src_over(dst, Rgba([255, 255, 255, 0])), dst);
    }

    #[test]
    fn clear_out_removes_full_coverage() {
        assert_eq!(clear_out(Rgba([10, 20, 30, 255]), 255), Rgba([0, 0, 0, 0]));
        let dst = Rgba([10, 20, 30, 200]);
        assert_eq!(clear_out(dst, 0), dst);
        let half = clear_out(dst, 128);
        assert!(half[3] < 200 && half[3] > 0);
    }

    #[test]
    fn resize_preserves_top_left_content() {
        let mut surface = Surface::new(4, 4).unwrap();
        surface
            .pixels_mut()
            .put_pixel(1, 1, Rgba([50, 60, 70, 255]));
        surface.resize(8, 3).unwrap();
        assert_eq!(surface.width(), 8);
        assert_eq!(surface.height(), 3);
        assert_eq!(*surface.pixels().get_pixel(1, 1), Rgba([50, 60, 70, 255]));
        assert_eq!(*surface.pixels().get_pixel(7, 2), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn generation_tracks_mutation() {
        let mut surface = Surface::new(4, 4).unwrap();
        let g0 = surface.generation();
        surface.clear();
        assert!(surface.generation() > g0);
    }
}
