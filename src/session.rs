// ============================================================================
// SESSION — gesture dispatch and tool state over the two stage surfaces
// ============================================================================

use std::time::Instant;

use egui::Pos2;

use crate::brush::BrushEngine;
use crate::config::{Tool, ToolSettings};
use crate::gesture::{ActivePointers, Gesture, GestureKind, PointerId, TransformSeed};
use crate::ops::shapes;
use crate::ops::smoothing::StrokeSmoother;
use crate::raster::{Color, RasterError, Surface};
use crate::selection::{self, Selection};

/// One open drawing surface and everything acting on it: tool settings, the
/// brush engine, live pointers, the in-flight gesture, and the single
/// floating-selection slot. All methods take stage coordinates; the shell
/// does the device-pixel mapping.
pub struct DrawingSession {
    base: Surface,
    overlay: Surface,
    settings: ToolSettings,
    tool: Tool,
    brush: BrushEngine,
    pointers: ActivePointers,
    gesture: Option<Gesture>,
    selection: Option<Selection>,
    last_point: Option<Pos2>,
    epoch: Instant,
}

impl DrawingSession {
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Ok(DrawingSession {
            base: Surface::new(width, height)?,
            overlay: Surface::new(width, height)?,
            settings: ToolSettings::default(),
            tool: Tool::Pen,
            brush: BrushEngine::new(),
            pointers: ActivePointers::new(),
            gesture: None,
            selection: None,
            last_point: None,
            epoch: Instant::now(),
        })
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    /// The permanent artwork surface.
    pub fn base(&self) -> &Surface {
        &self.base
    }

    /// The ephemeral preview/selection overlay.
    pub fn overlay(&self) -> &Surface {
        &self.overlay
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    /// Whether the shell should keep repainting so the marching ants move.
    pub fn animates(&self) -> bool {
        self.selection.is_some()
            || matches!(&self.gesture, Some(g) if matches!(g.kind, GestureKind::Lasso))
    }

    fn elapsed_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Switch tools. The overlay and any in-flight gesture are dropped.
    /// Leaving the selection tools commits a floating selection rather than
    /// silently losing it.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        if !matches!(tool, Tool::Select | Tool::Transform) {
            self.commit_selection();
        }
        self.tool = tool;
        self.gesture = None;
        self.pointers.clear();
        self.overlay.clear();
        let elapsed = self.elapsed_ms();
        if let Some(sel) = &self.selection {
            sel.draw_overlay(&mut self.overlay, elapsed);
        }
    }

    /// Stamp the floating selection onto the artwork under its current
    /// transform. No-op without one.
    pub fn commit_selection(&mut self) {
        if let Some(sel) = self.selection.take() {
            sel.commit(&mut self.base);
            self.overlay.clear();
            self.gesture = None;
        }
    }

    /// Put the floating selection back where it was cut from, untransformed.
    /// No-op without one.
    pub fn cancel_selection(&mut self) {
        if let Some(sel) = self.selection.take() {
            sel.cancel(&mut self.base);
            self.overlay.clear();
            self.gesture = None;
        }
    }

    /// Resize both surfaces, preserving artwork anchored top-left. A
    /// floating selection is committed first so its pixels are not stranded
    /// outside the new stage.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        if width == self.base.width() && height == self.base.height() {
            return Ok(());
        }
        self.commit_selection();
        self.gesture = None;
        self.pointers.clear();
        self.base.resize(width, height)?;
        self.overlay.resize(width, height)?;
        Ok(())
    }

    /// Per-frame upkeep: redraw whichever overlay is showing marching ants
    /// so the dash phase advances. Pointer events drive everything else.
    pub fn tick(&mut self) {
        let elapsed = self.elapsed_ms();
        if let Some(gesture) = &self.gesture
            && matches!(gesture.kind, GestureKind::Lasso)
        {
            selection::draw_lasso_preview(&mut self.overlay, &gesture.points, elapsed);
            return;
        }
        if let Some(sel) = &self.selection {
            sel.draw_overlay(&mut self.overlay, elapsed);
        }
    }

    // ------------------------------------------------------------------
    //  Pointer dispatch
    // ------------------------------------------------------------------

    /// A pointer pressed at `pos`. Every press starts a fresh gesture for
    /// the active tool, even while other pointers are already down.
    pub fn pointer_down(&mut self, id: PointerId, pos: Pos2) {
        self.pointers.insert(id, pos);
        self.last_point = Some(pos);
        self.begin_gesture(id, pos);
    }

    /// A pointer moved while pressed. The pointer map is updated before the
    /// tool sees the event, so multi-pointer reads are current.
    pub fn pointer_move(&mut self, id: PointerId, pos: Pos2) {
        if self.gesture.is_none() {
            return;
        }
        self.pointers.insert(id, pos);
        self.advance_gesture(pos);
        self.last_point = Some(pos);
    }

    /// A pointer released at `pos`. The gesture finalizes only when the last
    /// pressed pointer lifts.
    pub fn pointer_up(&mut self, id: PointerId, pos: Pos2) {
        self.pointers.remove(id);
        if self.pointers.is_empty() {
            self.finalize_gesture(pos);
        }
    }

    /// The pointer left the stage mid-gesture: finalize with the last known
    /// point and forget all pressed pointers.
    pub fn pointer_leave(&mut self) {
        if self.gesture.is_some()
            && let Some(p) = self.last_point
        {
            self.finalize_gesture(p);
        }
        self.pointers.clear();
    }

    fn begin_gesture(&mut self, id: PointerId, pos: Pos2) {
        match self.tool {
            Tool::Pen | Tool::Eraser => {
                let erase = self.tool == Tool::Eraser;
                let cfg = if erase {
                    self.settings.eraser
                } else {
                    self.settings.pen
                };
                // Place the initial dot: one zero-travel stamp at the press.
                let mut canvas = self.base.canvas();
                self.brush.stamp_segment(&mut canvas, &cfg, pos, pos, erase);
                drop(canvas);
                self.gesture = Some(Gesture::new(
                    id,
                    pos,
                    GestureKind::Stroke(StrokeSmoother::new(pos)),
                ));
            }
            Tool::Shape => {
                self.overlay.clear();
                self.gesture = Some(Gesture::new(id, pos, GestureKind::Shape));
            }
            Tool::Select => {
                // A fresh lasso over a floating selection commits it first;
                // only one selection exists at a time.
                self.commit_selection();
                self.overlay.clear();
                self.gesture = Some(Gesture::new(id, pos, GestureKind::Lasso));
            }
            Tool::Transform => {
                // Seed is captured lazily on the first move, on top of the
                // transform accumulated so far.
                self.gesture = Some(Gesture::new(id, pos, GestureKind::Transform(None)));
            }
        }
    }

    fn advance_gesture(&mut self, pos: Pos2) {
        let elapsed = self.elapsed_ms();
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        gesture.last = pos;
        match &mut gesture.kind {
            GestureKind::Stroke(smoother) => {
                let erase = self.tool == Tool::Eraser;
                let cfg = if erase {
                    self.settings.eraser
                } else {
                    self.settings.pen
                };
                let damping = self.settings.smoothing.damping();
                let mut from = smoother.position();
                let mut canvas = self.base.canvas();
                for to in smoother.advance(pos, damping) {
                    self.brush.stamp_segment(&mut canvas, &cfg, from, to, erase);
                    from = to;
                }
            }
            GestureKind::Shape => {
                let cfg = self.settings.shape;
                let mut canvas = self.overlay.canvas();
                canvas.clear();
                shapes::draw_shape(
                    &mut canvas,
                    cfg.kind(),
                    gesture.start,
                    pos,
                    cfg.stroke_width(),
                    Color::BLACK,
                );
            }
            GestureKind::Lasso => {
                gesture.push_sample(pos);
                selection::draw_lasso_preview(&mut self.overlay, &gesture.points, elapsed);
            }
            GestureKind::Transform(seed) => {
                let Some(sel) = self.selection.as_mut() else {
                    return;
                };
                if seed.is_none() {
                    *seed = TransformSeed::capture(sel.transform, &self.pointers);
                }
                if let Some(seed) = seed {
                    sel.transform = seed.resolve(&self.pointers);
                }
                sel.draw_overlay(&mut self.overlay, elapsed);
            }
        }
    }

    fn finalize_gesture(&mut self, pos: Pos2) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        match gesture.kind {
            // The stroke was painted during the moves; the release point is
            // deliberately not chased.
            GestureKind::Stroke(_) => {}
            GestureKind::Shape => {
                let cfg = self.settings.shape;
                let mut canvas = self.base.canvas();
                shapes::draw_shape(
                    &mut canvas,
                    cfg.kind(),
                    gesture.start,
                    pos,
                    cfg.stroke_width(),
                    Color::BLACK,
                );
                drop(canvas);
                self.overlay.clear();
            }
            GestureKind::Lasso => {
                let elapsed = self.elapsed_ms();
                match selection::finalize_lasso(&gesture.points, &mut self.base) {
                    Some(sel) => {
                        sel.draw_overlay(&mut self.overlay, elapsed);
                        self.selection = Some(sel);
                    }
                    None => self.overlay.clear(),
                }
            }
            // The accumulated transform lives on the selection; nothing to
            // finish.
            GestureKind::Transform(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn tool_switch_clears_gesture_and_overlay() {
        let mut session = DrawingSession::new(64, 64).unwrap();
        session.set_tool(Tool::Shape);
        session.pointer_down(1, pos2(5.0, 5.0));
        session.pointer_move(1, pos2(30.0, 30.0));
        assert!(session.overlay().pixels().pixels().any(|p| p[3] != 0));
        session.set_tool(Tool::Pen);
        assert!(session.overlay().pixels().pixels().all(|p| p[3] == 0));
        // The abandoned gesture must not finalize later.
        session.pointer_up(1, pos2(40.0, 40.0));
        assert!(session.base().pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn shape_commit_waits_for_release() {
        let mut session = DrawingSession::new(64, 64).unwrap();
        session.set_tool(Tool::Shape);
        session.pointer_down(1, pos2(10.0, 10.0));
        session.pointer_move(1, pos2(40.0, 40.0));
        assert!(session.base().pixels().pixels().all(|p| p[3] == 0));
        session.pointer_up(1, pos2(40.0, 40.0));
        assert!(session.base().pixels().pixels().any(|p| p[3] != 0));
        assert!(session.overlay().pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn pointer_leave_finalizes_with_last_known_point() {
        let mut session = DrawingSession::new(64, 64).unwrap();
        session.set_tool(Tool::Shape);
        session.settings_mut().shape.set_kind(crate::ops::shapes::ShapeKind::Rect);
        session.pointer_down(1, pos2(10.0, 10.0));
        session.pointer_move(1, pos2(30.0, 20.0));
        session.pointer_leave();
        // Rect outline committed between (10,10) and (30,20).
        assert!(session.base().pixels().get_pixel(20, 10)[3] > 0);
        assert!(session.base().pixels().get_pixel(20, 15)[3] == 0);
    }

    #[test]
    fn eraser_down_removes_paint_immediately() {
        let mut session = DrawingSession::new(64, 64).unwrap();
        session.pointer_down(1, pos2(32.0, 32.0));
        session.pointer_up(1, pos2(32.0, 32.0));
        assert_eq!(session.base().pixels().get_pixel(32, 32)[3], 255);
        session.set_tool(Tool::Eraser);
        session.pointer_down(2, pos2(32.0, 32.0));
        session.pointer_up(2, pos2(32.0, 32.0));
        assert_eq!(session.base().pixels().get_pixel(32, 32)[3], 0);
    }
}
