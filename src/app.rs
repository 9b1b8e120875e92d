// ============================================================================
// APP — eframe shell: tool column, settings strip, stage, input routing
// ============================================================================

use egui::{
    Color32, ColorImage, ComboBox, CursorIcon, Key, Pos2, Rect, Sense, Slider, TextureFilter,
    TextureHandle, TextureOptions, pos2, vec2,
};
use image::Rgba;
use log::warn;

use crate::config::{
    BrushConfig, BrushShape, MAX_AXIS_SCALE, MAX_DAMPING, MAX_STROKE_WIDTH, MIN_AXIS_SCALE,
    MIN_DAMPING, MIN_STROKE_WIDTH, Tool,
};
use crate::gesture::PointerId;
use crate::ops::shapes::ShapeKind;
use crate::session::DrawingSession;

/// Pointer-map key for the mouse. Platform touch ids count up from zero, so
/// the top of the range cannot collide.
const MOUSE_POINTER_ID: PointerId = u64::MAX;

/// The surfaces are transparent where unpainted; the shell composites them
/// over paper white for display.
const PAPER: [u8; 3] = [255, 255, 255];

pub struct InkstageApp {
    session: DrawingSession,

    // Stage texture, re-uploaded only when a surface generation moves.
    stage_tex: Option<TextureHandle>,
    uploaded: Option<(u64, u64)>,

    // Pointer routing state. `active_touches` counts every live touch in the
    // window so synthesized mouse events can be ignored; `stage_touches`
    // holds only the ids that started on the stage and were handed to the
    // session.
    active_touches: usize,
    stage_touches: Vec<PointerId>,
    mouse_down: bool,
}

impl InkstageApp {
    pub fn new(cc: &eframe::CreationContext<'_>, session: DrawingSession) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            session,
            stage_tex: None,
            uploaded: None,
            active_touches: 0,
            stage_touches: Vec::new(),
            mouse_down: false,
        }
    }

    // ------------------------------------------------------------------------
    // Keyboard shortcuts
    // ------------------------------------------------------------------------

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let tool_keys = [
            (Key::Num1, Tool::Pen),
            (Key::Num2, Tool::Eraser),
            (Key::Num3, Tool::Shape),
            (Key::Num4, Tool::Select),
            (Key::Num5, Tool::Transform),
        ];
        for (key, tool) in tool_keys {
            if ctx.input(|i| i.key_pressed(key)) {
                self.session.set_tool(tool);
            }
        }

        let mut width_step = 0.0;
        if ctx.input(|i| i.key_pressed(Key::Minus)) {
            width_step -= 1.0;
        }
        if ctx.input(|i| i.key_pressed(Key::PlusEquals)) {
            width_step += 1.0;
        }
        if width_step != 0.0 {
            let tool = self.session.tool();
            let settings = self.session.settings_mut();
            match tool {
                Tool::Pen => {
                    let w = settings.pen.stroke_width();
                    settings.pen.set_stroke_width(w + width_step);
                }
                Tool::Eraser => {
                    let w = settings.eraser.stroke_width();
                    settings.eraser.set_stroke_width(w + width_step);
                }
                Tool::Shape => {
                    let w = settings.shape.stroke_width();
                    settings.shape.set_stroke_width(w + width_step);
                }
                Tool::Select | Tool::Transform => {}
            }
        }

        if ctx.input(|i| i.key_pressed(Key::Enter)) {
            self.session.commit_selection();
        }
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.session.cancel_selection();
        }
    }

    // ------------------------------------------------------------------------
    // Stage texture
    // ------------------------------------------------------------------------

    /// Flatten base and overlay over paper white into one display image.
    fn composite_stage(&self) -> ColorImage {
        let base = self.session.base().pixels();
        let overlay = self.session.overlay().pixels();
        let size = [base.width() as usize, base.height() as usize];
        let mut flat = Vec::with_capacity(size[0] * size[1]);
        for (below, above) in base.pixels().zip(overlay.pixels()) {
            let rgb = over_opaque(over_opaque(PAPER, *below), *above);
            flat.push(Color32::from_rgb(rgb[0], rgb[1], rgb[2]));
        }
        ColorImage { size, pixels: flat }
    }

    fn upload_stage(&mut self, ctx: &egui::Context) {
        let generations = (
            self.session.base().generation(),
            self.session.overlay().generation(),
        );
        if self.stage_tex.is_some() && self.uploaded == Some(generations) {
            return;
        }
        let image = self.composite_stage();
        let texture_options = TextureOptions {
            magnification: TextureFilter::Nearest,
            minification: TextureFilter::Linear,
            ..Default::default()
        };
        // Reuse the handle so re-uploads replace the texture in place.
        if let Some(ref mut tex) = self.stage_tex {
            tex.set(image, texture_options);
        } else {
            self.stage_tex = Some(ctx.load_texture("stage", image, texture_options));
        }
        self.uploaded = Some(generations);
    }

    // ------------------------------------------------------------------------
    // Pointer routing
    // ------------------------------------------------------------------------

    /// Translate raw egui pointer and touch events into session dispatches.
    /// Touch ids key the pointer map directly; the mouse gets a reserved id.
    /// While any touch is live, the matching synthesized mouse events are
    /// dropped so a gesture is never driven twice.
    fn route_pointer_events(&mut self, ctx: &egui::Context, stage_rect: Rect, dpr: f32) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            match event {
                egui::Event::Touch { id, phase, pos, .. } => {
                    let p = to_stage(stage_rect, dpr, pos);
                    match phase {
                        egui::TouchPhase::Start => {
                            self.active_touches += 1;
                            if stage_rect.contains(pos) {
                                if !self.stage_touches.contains(&id.0) {
                                    self.stage_touches.push(id.0);
                                }
                                self.session.pointer_down(id.0, p);
                            }
                        }
                        egui::TouchPhase::Move => {
                            if self.stage_touches.contains(&id.0) {
                                self.session.pointer_move(id.0, p);
                            }
                        }
                        egui::TouchPhase::End => {
                            self.active_touches = self.active_touches.saturating_sub(1);
                            if let Some(slot) =
                                self.stage_touches.iter().position(|&t| t == id.0)
                            {
                                self.stage_touches.remove(slot);
                                self.session.pointer_up(id.0, p);
                            }
                        }
                        egui::TouchPhase::Cancel => {
                            self.active_touches = self.active_touches.saturating_sub(1);
                            if let Some(slot) =
                                self.stage_touches.iter().position(|&t| t == id.0)
                            {
                                self.stage_touches.remove(slot);
                                self.session.pointer_leave();
                            }
                        }
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    if self.active_touches > 0 {
                        continue;
                    }
                    if pressed {
                        if stage_rect.contains(pos) {
                            self.mouse_down = true;
                            self.session
                                .pointer_down(MOUSE_POINTER_ID, to_stage(stage_rect, dpr, pos));
                        }
                    } else if self.mouse_down {
                        self.mouse_down = false;
                        self.session
                            .pointer_up(MOUSE_POINTER_ID, to_stage(stage_rect, dpr, pos));
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    if self.active_touches > 0 || !self.mouse_down {
                        continue;
                    }
                    if stage_rect.contains(pos) {
                        self.session
                            .pointer_move(MOUSE_POINTER_ID, to_stage(stage_rect, dpr, pos));
                    } else {
                        // Dragging off the stage ends the gesture at the last
                        // point that was still on it.
                        self.mouse_down = false;
                        self.session.pointer_leave();
                    }
                }
                egui::Event::PointerGone => {
                    self.mouse_down = false;
                    self.session.pointer_leave();
                }
                _ => {}
            }
        }
    }
}

impl eframe::App for InkstageApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        // --- Settings strip (contents follow the active tool) ---
        egui::TopBottomPanel::top("settings_strip").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                let tool = self.session.tool();
                match tool {
                    Tool::Pen | Tool::Eraser => {
                        let settings = self.session.settings_mut();
                        let cfg = if tool == Tool::Pen {
                            &mut settings.pen
                        } else {
                            &mut settings.eraser
                        };
                        brush_controls(ui, cfg);

                        let mut damping = settings.smoothing.damping();
                        if ui
                            .add(Slider::new(&mut damping, MIN_DAMPING..=MAX_DAMPING).text("Damping"))
                            .changed()
                        {
                            settings.smoothing.set_damping(damping);
                        }
                    }
                    Tool::Shape => {
                        let shape = &mut self.session.settings_mut().shape;

                        let mut kind = shape.kind();
                        ComboBox::from_label("Shape")
                            .selected_text(kind.label())
                            .show_ui(ui, |ui| {
                                for &k in ShapeKind::all() {
                                    ui.selectable_value(&mut kind, k, k.label());
                                }
                            });
                        if kind != shape.kind() {
                            shape.set_kind(kind);
                        }

                        let mut width = shape.stroke_width();
                        if ui
                            .add(
                                Slider::new(&mut width, MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH)
                                    .text("Width"),
                            )
                            .changed()
                        {
                            shape.set_stroke_width(width);
                        }
                    }
                    Tool::Select => {
                        ui.label("Drag a loop around the pixels to cut them loose.");
                        selection_actions(ui, &mut self.session);
                    }
                    Tool::Transform => {
                        ui.label("Drag to move the selection; a second pointer scales and rotates.");
                        selection_actions(ui, &mut self.session);
                    }
                }
            });
            ui.add_space(4.0);
        });

        // --- Status line ---
        egui::TopBottomPanel::bottom("status_line").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.session.tool().label());
                ui.separator();
                ui.label(format!(
                    "{} x {} px",
                    self.session.width(),
                    self.session.height()
                ));
                if let Some(sel) = self.session.selection() {
                    ui.separator();
                    let b = sel.bounds();
                    ui.label(format!("Selection {}x{} at ({}, {})", b.w, b.h, b.x, b.y));
                }
            });
        });

        // --- Tool column ---
        egui::SidePanel::left("tool_column")
            .resizable(false)
            .exact_width(96.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                for &tool in Tool::all() {
                    let active = self.session.tool() == tool;
                    if ui.selectable_label(active, tool.label()).clicked() {
                        self.session.set_tool(tool);
                    }
                }
            });

        // --- Stage (fills the remaining space) ---
        egui::CentralPanel::default()
            .frame(egui::Frame {
                fill: Color32::from_gray(34),
                ..Default::default()
            })
            .show(ctx, |ui| {
                let avail = ui.available_rect_before_wrap();
                let dpr = stage_dpr(ctx);

                // The surfaces track the panel's physical size. Content keeps
                // its top-left anchoring across resizes.
                let want_w = ((avail.width() * dpr).floor().max(1.0)) as u32;
                let want_h = ((avail.height() * dpr).floor().max(1.0)) as u32;
                if (want_w, want_h) != (self.session.width(), self.session.height()) {
                    if let Err(err) = self.session.resize(want_w, want_h) {
                        warn!("stage resize to {want_w}x{want_h} failed: {err}");
                    }
                }

                // Stage rect derives from the surfaces, not the panel, so a
                // refused resize still maps input onto real pixels.
                let display = vec2(
                    self.session.width() as f32 / dpr,
                    self.session.height() as f32 / dpr,
                );
                let stage_rect = Rect::from_min_size(avail.min, display);
                let _ = ui
                    .allocate_rect(stage_rect, Sense::click_and_drag())
                    .on_hover_cursor(CursorIcon::Crosshair);

                self.route_pointer_events(ctx, stage_rect, dpr);
                self.session.tick();
                self.upload_stage(ctx);

                if let Some(ref tex) = self.stage_tex {
                    ui.painter().image(
                        tex.id(),
                        stage_rect,
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
            });

        // Marching ants and the lasso preview animate on wall time.
        if self.session.animates() {
            ctx.request_repaint();
        }
    }
}

// ----------------------------------------------------------------------------
// Widget helpers
// ----------------------------------------------------------------------------

/// Shared slider strip for the pen and eraser. Every edit goes through the
/// config's clamping setters.
fn brush_controls(ui: &mut egui::Ui, cfg: &mut BrushConfig) {
    let mut shape = cfg.shape();
    ComboBox::from_label("Brush")
        .selected_text(shape.label())
        .show_ui(ui, |ui| {
            for &s in BrushShape::all() {
                ui.selectable_value(&mut shape, s, s.label());
            }
        });
    if shape != cfg.shape() {
        cfg.set_shape(shape);
    }

    let mut width = cfg.stroke_width();
    if ui
        .add(Slider::new(&mut width, MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH).text("Width"))
        .changed()
    {
        cfg.set_stroke_width(width);
    }

    let mut rotation = cfg.rotation_deg();
    if ui
        .add(Slider::new(&mut rotation, 0.0..=359.0).text("Rotation").suffix("°"))
        .changed()
    {
        cfg.set_rotation_deg(rotation);
    }

    let mut opacity = (cfg.opacity() * 100.0).round();
    if ui
        .add(Slider::new(&mut opacity, 0.0..=100.0).text("Opacity").suffix("%"))
        .changed()
    {
        cfg.set_opacity(opacity / 100.0);
    }

    let mut width_scale = cfg.width_scale();
    if ui
        .add(Slider::new(&mut width_scale, MIN_AXIS_SCALE..=MAX_AXIS_SCALE).text("W scale"))
        .changed()
    {
        cfg.set_width_scale(width_scale);
    }

    let mut height_scale = cfg.height_scale();
    if ui
        .add(Slider::new(&mut height_scale, MIN_AXIS_SCALE..=MAX_AXIS_SCALE).text("H scale"))
        .changed()
    {
        cfg.set_height_scale(height_scale);
    }
}

fn selection_actions(ui: &mut egui::Ui, session: &mut DrawingSession) {
    let has = session.has_selection();
    if ui.add_enabled(has, egui::Button::new("Commit")).clicked() {
        session.commit_selection();
    }
    if ui.add_enabled(has, egui::Button::new("Cancel")).clicked() {
        session.cancel_selection();
    }
}

// ----------------------------------------------------------------------------
// Coordinate and pixel helpers
// ----------------------------------------------------------------------------

/// Device pixel ratio for stage mapping, clamped to a sane range.
fn stage_dpr(ctx: &egui::Context) -> f32 {
    ctx.pixels_per_point().clamp(1.0, 3.0)
}

/// Window point to stage pixel coordinate.
fn to_stage(stage_rect: Rect, dpr: f32, pos: Pos2) -> Pos2 {
    pos2((pos.x - stage_rect.min.x) * dpr, (pos.y - stage_rect.min.y) * dpr)
}

/// Straight-alpha composite over an opaque backdrop, staying in u8.
fn over_opaque(dst: [u8; 3], src: Rgba<u8>) -> [u8; 3] {
    let a = src[3] as u32;
    if a == 0 {
        return dst;
    }
    if a == 255 {
        return [src[0], src[1], src[2]];
    }
    let na = 255 - a;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * na + 127) / 255) as u8;
    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_mapping_scales_by_device_ratio() {
        let rect = Rect::from_min_size(pos2(100.0, 50.0), vec2(400.0, 300.0));
        let p = to_stage(rect, 2.0, pos2(110.0, 60.0));
        assert_eq!(p, pos2(20.0, 20.0));
    }

    #[test]
    fn opaque_composite_keeps_exact_endpoints() {
        let white = [255, 255, 255];
        assert_eq!(over_opaque(white, Rgba([0, 0, 0, 0])), white);
        assert_eq!(over_opaque(white, Rgba([10, 20, 30, 255])), [10, 20, 30]);
        // Half-transparent black over white lands mid-gray.
        let mid = over_opaque(white, Rgba([0, 0, 0, 128]));
        assert!(mid[0] >= 126 && mid[0] <= 129, "got {}", mid[0]);
    }
}
