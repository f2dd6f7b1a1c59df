// ============================================================================
// DOCUMENT — canvas + overlay + history + tools behind one event surface
// ============================================================================

use image::Rgba;

use crate::canvas::{Canvas, Surface, premultiply};
use crate::components::history::History;
use crate::components::tools::{
    Handler, PointerEvent, ToolAction, ToolCtx, ToolKind, ToolOutcome, ToolSlot, handlers_for,
};
use crate::error::EditError;
use crate::geometry::{DamageRing, Rect};
use crate::overlay::Overlay;
use crate::ops::transform::Transform;
use crate::screen::ScreenCache;

/// Independent tool-context slots remembered by the document.
pub const TOOL_SLOT_COUNT: usize = 3;

/// Slope threshold for drag snapping: below it the drag locks to an axis,
/// above its reciprocal to the other axis, between them to the 45°
/// diagonal. The ratio and the 2 px minimum are behavioral contracts.
pub const MOVE_LOCK_SLOPE: f32 = 0.4142;
pub const MOVE_LOCK_MIN_PX: i32 = 2;

/// Input modes, exclusive of tool state. Pointer/key legality and the
/// enter/exit side effects hang off the mode, not the tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Interact,
    ColorEdit,
    Console,
    TransformPreview,
    TextEntry,
}

/// Which pointer callback a delivered event maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PointerPhase {
    Press,
    Drag,
    Release,
    Motion,
}

/// The single-document editing context. All mutation funnels through here:
/// pointer events, command intents, undo/redo. One event is fully processed
/// (dispatch → primitive → damage → optional commit → screen refresh)
/// before the next is accepted; there is no internal concurrency.
pub struct Document {
    canvas: Canvas,
    overlay: Overlay,
    history: History,
    screen: ScreenCache,
    slots: [ToolSlot; TOOL_SLOT_COUNT],
    current_slot: usize,
    mode: InputMode,
    /// Straight-alpha background color (resize fill, cut-clear).
    background: Rgba<u8>,
    /// Anchor recorded by the text tool; consumed by placed bitmaps.
    text_anchor: Option<(i32, i32)>,
    /// Transform-preview drag gesture: press position + transform at press.
    preview_drag: Option<((i32, i32), Transform)>,
    /// Recent preview damage, so a moving preview erases its old position.
    preview_ring: DamageRing,
}

impl Document {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        let canvas = Canvas::new(width, height, premultiply(background));
        let mut overlay = Overlay::new(canvas.width(), canvas.height());
        let mut screen = ScreenCache::new(canvas.width(), canvas.height());
        screen.refresh(&canvas, &mut overlay, canvas.bounds());
        Self {
            canvas,
            overlay,
            history: History::default(),
            screen,
            slots: Default::default(),
            current_slot: 0,
            mode: InputMode::default(),
            background,
            text_anchor: None,
            preview_drag: None,
            preview_ring: DamageRing::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn screen(&self) -> &Surface {
        self.screen.surface()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    pub fn set_background(&mut self, color: Rgba<u8>) {
        self.background = color;
    }

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    pub fn slot(&self) -> &ToolSlot {
        &self.slots[self.current_slot]
    }

    pub fn slot_mut(&mut self) -> &mut ToolSlot {
        &mut self.slots[self.current_slot]
    }

    pub fn slot_at(&self, index: usize) -> Option<&ToolSlot> {
        self.slots.get(index)
    }

    /// Switch the active tool-context slot; settings of the previous slot
    /// stay remembered. A pending preview is baked first (slot switches are
    /// user actions, same as a mode switch away).
    pub fn set_current_slot(&mut self, index: usize) -> Result<(), EditError> {
        if index >= TOOL_SLOT_COUNT {
            return Err(EditError::InvalidParameter(format!(
                "tool slot {index} out of range (0..{TOOL_SLOT_COUNT})"
            )));
        }
        self.set_mode(InputMode::Interact);
        self.current_slot = index;
        Ok(())
    }

    /// Change the active slot's tool. Any pending overlay preview is
    /// cancelled — switching tools abandons, it does not commit.
    pub fn set_tool(&mut self, kind: ToolKind) -> Rect {
        let damage = self.cancel_overlay();
        self.slots[self.current_slot].set_kind(kind);
        damage
    }

    pub fn text_anchor(&self) -> Option<(i32, i32)> {
        self.text_anchor
    }

    // ------------------------------------------------------------------
    // Input modes
    // ------------------------------------------------------------------

    /// Switch input mode, running exit effects for the mode being left:
    /// leaving TransformPreview or TextEntry bakes the pending overlay into
    /// the canvas. Returns the resulting damage.
    pub fn set_mode(&mut self, mode: InputMode) -> Rect {
        if mode == self.mode {
            return Rect::EMPTY;
        }
        let damage = match self.mode {
            InputMode::TransformPreview | InputMode::TextEntry => self.commit_overlay(),
            _ => Rect::EMPTY,
        };
        self.mode = mode;
        self.preview_drag = None;
        if mode != InputMode::TextEntry {
            self.text_anchor = None;
        }
        damage
    }

    // ------------------------------------------------------------------
    // Pointer dispatch
    // ------------------------------------------------------------------

    pub fn pointer_pressed(&mut self, e: PointerEvent) -> Rect {
        self.dispatch(PointerPhase::Press, e)
    }

    pub fn pointer_dragged(&mut self, e: PointerEvent) -> Rect {
        self.dispatch(PointerPhase::Drag, e)
    }

    pub fn pointer_released(&mut self, e: PointerEvent) -> Rect {
        self.dispatch(PointerPhase::Release, e)
    }

    pub fn pointer_moved(&mut self, e: PointerEvent) -> Rect {
        self.dispatch(PointerPhase::Motion, e)
    }

    fn dispatch(&mut self, phase: PointerPhase, e: PointerEvent) -> Rect {
        match self.mode {
            InputMode::Interact => self.dispatch_tool(phase, e),
            InputMode::TransformPreview => self.preview_pointer(phase, e),
            // Color editing, the console and text entry consume pointer
            // input outside the core.
            InputMode::ColorEdit | InputMode::Console | InputMode::TextEntry => Rect::EMPTY,
        }
    }

    fn dispatch_tool(&mut self, phase: PointerPhase, e: PointerEvent) -> Rect {
        let handlers = handlers_for(self.slots[self.current_slot].kind());
        let handler: Option<Handler> = match phase {
            PointerPhase::Press => handlers.press,
            PointerPhase::Drag => handlers.drag,
            PointerPhase::Release => handlers.release,
            PointerPhase::Motion => handlers.motion,
        };
        let Some(handler) = handler else {
            return Rect::EMPTY;
        };

        let slot = &mut self.slots[self.current_slot];
        let mut ctx = ToolCtx {
            canvas: &mut self.canvas,
            overlay: &mut self.overlay,
            history: &mut self.history,
            background: self.background,
        };
        let out = handler(slot, &mut ctx, &e);
        self.apply_outcome(out, &e)
    }

    fn apply_outcome(&mut self, out: ToolOutcome, e: &PointerEvent) -> Rect {
        let mut damage = out.damage;
        match out.action {
            ToolAction::None => {}
            ToolAction::CommitOverlay => {
                damage = damage.expand(&self.overlay.commit(&mut self.canvas, &mut self.history));
            }
            ToolAction::EnterTransformPreview => {
                self.mode = InputMode::TransformPreview;
                self.preview_drag = None;
                self.preview_ring.reset();
            }
            ToolAction::EnterTextEntry => {
                self.text_anchor = Some(e.pos());
                self.mode = InputMode::TextEntry;
            }
        }
        self.refresh_screen(damage)
    }

    // ------------------------------------------------------------------
    // Transform preview interaction
    // ------------------------------------------------------------------

    fn preview_pointer(&mut self, phase: PointerPhase, e: PointerEvent) -> Rect {
        match phase {
            PointerPhase::Press => {
                self.preview_drag = Some((e.pos(), *self.overlay.transform()));
                Rect::EMPTY
            }
            PointerPhase::Drag => {
                let Some((origin, base)) = self.preview_drag else {
                    return Rect::EMPTY;
                };
                let (mut dx, mut dy) = (e.x - origin.0, e.y - origin.1);
                if e.modifier {
                    (dx, dy) = move_lock(dx, dy);
                }
                let mut next = base;
                next.translate = (base.translate.0 + dx, base.translate.1 + dy);
                self.overlay.set_transform(next);
                self.refresh_preview()
            }
            PointerPhase::Release => {
                self.preview_drag = None;
                Rect::EMPTY
            }
            PointerPhase::Motion => Rect::EMPTY,
        }
    }

    /// Fold a scale/rotate/translate step into the pending preview
    /// (command-layer entry point, e.g. keyboard rotate).
    pub fn transform_step(&mut self, step: Transform) -> Result<Rect, EditError> {
        if self.mode != InputMode::TransformPreview {
            return Err(EditError::BadState("no transform preview is active"));
        }
        self.overlay.apply_transform(&step);
        Ok(self.refresh_preview())
    }

    /// Refresh the screen over the union of the previous and current
    /// preview footprint.
    fn refresh_preview(&mut self) -> Rect {
        let resampled = self
            .overlay
            .preview_resampled()
            .map(|(_, r)| r)
            .unwrap_or(Rect::EMPTY);
        let rect = resampled.expand(&self.overlay.bound());
        let refresh = self.preview_ring.push(rect);
        self.refresh_screen(refresh)
    }

    // ------------------------------------------------------------------
    // Commit / cancel / undo / redo
    // ------------------------------------------------------------------

    /// Bake the overlay into the canvas (one history entry) and drop back
    /// to Interact when a preview was pending.
    pub fn commit_overlay(&mut self) -> Rect {
        let stale = self.preview_ring.push(Rect::EMPTY);
        let damage = self.overlay.commit(&mut self.canvas, &mut self.history);
        if self.mode == InputMode::TransformPreview {
            self.mode = InputMode::Interact;
        }
        self.preview_drag = None;
        self.preview_ring.reset();
        self.refresh_screen(damage.expand(&stale))
    }

    /// Abandon the overlay without mutating the canvas (a cut source is
    /// restored). Returns the refreshed region.
    pub fn cancel_overlay(&mut self) -> Rect {
        let stale = self.preview_ring.push(Rect::EMPTY);
        let damage = self.overlay.cancel(&mut self.canvas);
        if self.mode == InputMode::TransformPreview {
            self.mode = InputMode::Interact;
        }
        self.preview_drag = None;
        self.preview_ring.reset();
        self.refresh_screen(damage.expand(&stale))
    }

    /// Undo the newest committed step. A pending preview is abandoned
    /// first. `None` when the history is empty.
    pub fn undo(&mut self) -> Option<Rect> {
        self.cancel_overlay();
        let damage = self.history.undo(&mut self.canvas)?;
        Some(self.after_history_replay(damage))
    }

    /// Redo the most recently undone step. `None` when nothing to redo.
    pub fn redo(&mut self) -> Option<Rect> {
        self.cancel_overlay();
        let damage = self.history.redo(&mut self.canvas)?;
        Some(self.after_history_replay(damage))
    }

    fn after_history_replay(&mut self, damage: Rect) -> Rect {
        // A resize replay changes dimensions; dependent surfaces follow.
        self.overlay.match_canvas(&self.canvas);
        self.screen.match_canvas(&self.canvas);
        self.refresh_screen(damage)
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// Resize the document. Old content keeps its top-left anchoring, new
    /// area fills with the background color; one resize history entry.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Rect, EditError> {
        if width == 0 || height == 0 || width > 16_384 || height > 16_384 {
            return Err(EditError::InvalidParameter(format!(
                "resize to {width}×{height} rejected (limit 16384)"
            )));
        }
        self.cancel_overlay();
        let before = self.canvas.resize(width, height, premultiply(self.background));
        self.history.record_resize(before);
        self.overlay.match_canvas(&self.canvas);
        self.screen.match_canvas(&self.canvas);
        log::info!("canvas resized to {width}×{height}");
        Ok(self.refresh_screen(self.canvas.bounds()))
    }

    /// Replace the document content with a decoded surface (load). The
    /// undo history does not survive into the new document.
    pub fn replace_with(&mut self, surface: Surface) -> Rect {
        self.cancel_overlay();
        self.canvas.replace_surface(surface);
        self.history.clear();
        self.overlay.match_canvas(&self.canvas);
        self.screen.match_canvas(&self.canvas);
        self.refresh_screen(self.canvas.bounds())
    }

    /// Blend an externally shaped text bitmap into the overlay at the
    /// recorded anchor. Only legal during text entry; the bitmap commits
    /// when the mode is left.
    pub fn place_text_bitmap(&mut self, bitmap: &Surface) -> Result<Rect, EditError> {
        if self.mode != InputMode::TextEntry {
            return Err(EditError::BadState("not in text entry mode"));
        }
        let Some((ax, ay)) = self.text_anchor else {
            return Err(EditError::BadState("no text anchor recorded"));
        };
        // Re-rendered text replaces the previous attempt at the anchor.
        let stale = self.overlay.clear();
        let damage = self.overlay.surface_mut().blend_at(bitmap, ax, ay);
        self.overlay.add_content(damage);
        Ok(self.refresh_screen(damage.expand(&stale)))
    }

    fn refresh_screen(&mut self, damage: Rect) -> Rect {
        if damage.is_empty() {
            return Rect::EMPTY;
        }
        self.screen.refresh(&self.canvas, &mut self.overlay, damage)
    }
}

/// Snap a drag vector to the nearest axis or 45° diagonal. Below the 2 px
/// minimum the vector passes through unchanged.
pub fn move_lock(dx: i32, dy: i32) -> (i32, i32) {
    let adx = dx.abs();
    let ady = dy.abs();
    if adx.max(ady) < MOVE_LOCK_MIN_PX {
        return (dx, dy);
    }
    if adx == 0 {
        return (0, dy);
    }
    let slope = ady as f32 / adx as f32;
    if slope < MOVE_LOCK_SLOPE {
        (dx, 0)
    } else if slope > 1.0 / MOVE_LOCK_SLOPE {
        (0, dy)
    } else {
        let m = adx.max(ady);
        (m * dx.signum(), m * dy.signum())
    }
}
