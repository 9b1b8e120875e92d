// ============================================================================
// CONFIG — per-tool settings records with clamped setters
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::ops::shapes::ShapeKind;

pub const MIN_STROKE_WIDTH: f32 = 1.0;
pub const MAX_STROKE_WIDTH: f32 = 200.0;
pub const MIN_AXIS_SCALE: f32 = 0.1;
pub const MAX_AXIS_SCALE: f32 = 4.0;
pub const MIN_DAMPING: f32 = 0.01;
pub const MAX_DAMPING: f32 = 0.1;

/// The active drawing tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    Pen,
    Eraser,
    Shape,
    Select,
    Transform,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Eraser => "Eraser",
            Tool::Shape => "Shape",
            Tool::Select => "Select",
            Tool::Transform => "Transform",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pen,
            Tool::Eraser,
            Tool::Shape,
            Tool::Select,
            Tool::Transform,
        ]
    }
}

/// Footprint of the brush stamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrushShape {
    Ellipse,
    Rect,
}

impl BrushShape {
    pub fn label(&self) -> &'static str {
        match self {
            BrushShape::Ellipse => "Ellipse",
            BrushShape::Rect => "Rectangle",
        }
    }

    pub fn all() -> &'static [BrushShape] {
        &[BrushShape::Ellipse, BrushShape::Rect]
    }
}

/// Settings for a stamping tool (pen and eraser each own one). Fields are
/// private so every mutation goes through a clamping setter; the drawing core
/// only ever reads these.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrushConfig {
    shape: BrushShape,
    stroke_width: f32,
    rotation_deg: f32,
    opacity: f32,
    width_scale: f32,
    height_scale: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            shape: BrushShape::Ellipse,
            stroke_width: 24.0,
            rotation_deg: 0.0,
            opacity: 1.0,
            width_scale: 1.0,
            height_scale: 1.0,
        }
    }
}

impl BrushConfig {
    pub fn shape(&self) -> BrushShape {
        self.shape
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    /// Alpha fraction in [0, 1] applied once per stamp.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn width_scale(&self) -> f32 {
        self.width_scale
    }

    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }

    /// Elliptical half-extents of the stamp in pixels.
    pub fn radii(&self) -> (f32, f32) {
        let half = self.stroke_width * 0.5;
        (half * self.width_scale, half * self.height_scale)
    }

    pub fn set_shape(&mut self, shape: BrushShape) {
        self.shape = shape;
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
    }

    /// Rotation wraps into [0, 360).
    pub fn set_rotation_deg(&mut self, degrees: f32) {
        self.rotation_deg = degrees.rem_euclid(360.0);
    }

    pub fn set_opacity(&mut self, fraction: f32) {
        self.opacity = fraction.clamp(0.0, 1.0);
    }

    pub fn set_width_scale(&mut self, scale: f32) {
        self.width_scale = scale.clamp(MIN_AXIS_SCALE, MAX_AXIS_SCALE);
    }

    pub fn set_height_scale(&mut self, scale: f32) {
        self.height_scale = scale.clamp(MIN_AXIS_SCALE, MAX_AXIS_SCALE);
    }
}

/// Settings for the drag-to-commit shape tool.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeToolConfig {
    kind: ShapeKind,
    stroke_width: f32,
}

impl Default for ShapeToolConfig {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Line,
            stroke_width: 2.0,
        }
    }
}

impl ShapeToolConfig {
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn set_kind(&mut self, kind: ShapeKind) {
        self.kind = kind;
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
    }
}

/// Stroke smoother tuning. Damping is kept inside the documented stable
/// range; the oversampling factor and inverse mass are fixed constants of
/// the integrator itself.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    damping: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { damping: 0.05 }
    }
}

impl SmoothingConfig {
    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(MIN_DAMPING, MAX_DAMPING);
    }
}

/// Every tool's settings in one place, owned by the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub pen: BrushConfig,
    pub eraser: BrushConfig,
    pub shape: ShapeToolConfig,
    pub smoothing: SmoothingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_width_setter_clamps_to_documented_range() {
        let mut cfg = BrushConfig::default();
        cfg.set_stroke_width(0.0);
        assert_eq!(cfg.stroke_width(), MIN_STROKE_WIDTH);
        cfg.set_stroke_width(1000.0);
        assert_eq!(cfg.stroke_width(), MAX_STROKE_WIDTH);
    }

    #[test]
    fn rotation_wraps_modulo_full_turn() {
        let mut cfg = BrushConfig::default();
        cfg.set_rotation_deg(365.0);
        assert!((cfg.rotation_deg() - 5.0).abs() < 1e-4);
        cfg.set_rotation_deg(-90.0);
        assert!((cfg.rotation_deg() - 270.0).abs() < 1e-4);
    }

    #[test]
    fn radii_derive_from_width_and_axis_scales() {
        let mut cfg = BrushConfig::default();
        cfg.set_stroke_width(24.0);
        cfg.set_width_scale(2.0);
        cfg.set_height_scale(0.5);
        let (rx, ry) = cfg.radii();
        assert_eq!(rx, 24.0);
        assert_eq!(ry, 6.0);
    }

    #[test]
    fn damping_stays_inside_stable_range() {
        let mut cfg = SmoothingConfig::default();
        cfg.set_damping(0.0);
        assert_eq!(cfg.damping(), MIN_DAMPING);
        cfg.set_damping(0.5);
        assert_eq!(cfg.damping(), MAX_DAMPING);
    }
}
