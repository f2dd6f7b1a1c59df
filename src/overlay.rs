// ============================================================================
// OVERLAY — the transient "not yet committed" surface and its compositor
// ============================================================================

use image::Rgba;

use crate::canvas::{Canvas, Surface};
use crate::components::history::History;
use crate::error::EditError;
use crate::geometry::Rect;
use crate::ops::transform::{Transform, resample_surface};

/// Compositor phases. `Preview` holds a cut/copied region being moved,
/// scaled or rotated interactively; the canvas is untouched until commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayPhase {
    Idle,
    Accumulating,
    Preview,
}

/// A canvas-sized transient surface. Content outside `bound` is fully
/// transparent; the bound only ever grows while a stroke accumulates and is
/// reset when the overlay clears.
pub struct Overlay {
    surface: Surface,
    bound: Rect,
    phase: OverlayPhase,
    transform: Transform,
    /// Canvas pixels destroyed by a cut selection, restored on cancel and
    /// folded into the history patch on commit.
    pre_cut: Option<(Rect, Surface)>,
    /// Lazily built resample of the content through `transform`; dropped
    /// whenever the transform changes.
    preview_cache: Option<(Surface, Rect)>,
}

impl Overlay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: Surface::new(width, height),
            bound: Rect::EMPTY,
            phase: OverlayPhase::Idle,
            transform: Transform::identity(),
            pre_cut: None,
            preview_cache: None,
        }
    }

    /// Recreate the surface to track a canvas resize/load. Any transient
    /// content is discarded.
    pub fn match_canvas(&mut self, canvas: &Canvas) {
        if self.surface.width() != canvas.width() || self.surface.height() != canvas.height() {
            self.surface = Surface::new(canvas.width(), canvas.height());
            self.bound = Rect::EMPTY;
            self.phase = OverlayPhase::Idle;
            self.transform = Transform::identity();
            self.pre_cut = None;
            self.preview_cache = None;
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Mutable pixel access for tools. Callers report the touched region
    /// through [`Overlay::add_content`].
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn bound(&self) -> Rect {
        self.bound
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Start a fresh stroke: clears any leftover content and enters
    /// `Accumulating`.
    pub fn begin_stroke(&mut self) -> Rect {
        let cleared = self.clear();
        self.phase = OverlayPhase::Accumulating;
        cleared
    }

    /// Grow the content bound by a damage rectangle a tool just drew.
    pub fn add_content(&mut self, rect: Rect) {
        self.bound = self.bound.expand(&rect.bound(&self.surface.bounds()));
        if self.phase == OverlayPhase::Idle && !self.bound.is_empty() {
            self.phase = OverlayPhase::Accumulating;
        }
    }

    /// Reset to fully transparent / `Idle`. Returns the region that held
    /// content (screen refresh hint).
    pub fn clear(&mut self) -> Rect {
        let mut touched = self.bound;
        if !self.bound.is_empty() {
            self.surface.clear_rect(self.bound);
        }
        if let Some((_, cached_rect)) = &self.preview_cache {
            touched = touched.expand(cached_rect);
        }
        self.bound = Rect::EMPTY;
        self.phase = OverlayPhase::Idle;
        self.transform = Transform::identity();
        self.pre_cut = None;
        self.preview_cache = None;
        touched
    }

    // ------------------------------------------------------------------
    // Transform preview
    // ------------------------------------------------------------------

    /// Capture `rect` of the canvas into the overlay and enter the
    /// transform preview. `cut` clears the source region to `background`
    /// (the pre-cut pixels are kept for cancel/undo); the copy variant
    /// leaves the source intact. Returns the canvas+overlay damage.
    pub fn capture_region(
        &mut self,
        canvas: &mut Canvas,
        rect: Rect,
        cut: bool,
        background: Rgba<u8>,
    ) -> Result<Rect, EditError> {
        let r = rect.bound(&canvas.bounds());
        if r.is_empty() {
            return Err(EditError::BadState("selection is outside the canvas"));
        }
        self.clear();
        self.surface.copy_region(&canvas.surface, r, r.left, r.top);
        self.bound = r;
        if cut {
            self.pre_cut = Some((r, canvas.surface.snapshot_rect(r)));
            canvas.surface.fill_rect(r, background);
        }
        self.phase = OverlayPhase::Preview;
        self.transform = Transform::identity();
        self.preview_cache = None;
        Ok(r)
    }

    /// Promote already-accumulated overlay content (e.g. a placed text
    /// bitmap) into the transform preview.
    pub fn enter_preview(&mut self) -> Result<(), EditError> {
        if self.bound.is_empty() {
            return Err(EditError::BadState("overlay has no content to transform"));
        }
        self.phase = OverlayPhase::Preview;
        self.transform = Transform::identity();
        self.preview_cache = None;
        Ok(())
    }

    /// Fold another interactive step into the accumulated transform.
    pub fn apply_transform(&mut self, step: &Transform) {
        self.transform = self.transform.combined(step);
        self.preview_cache = None;
    }

    /// Replace the accumulated transform outright.
    pub fn set_transform(&mut self, t: Transform) {
        self.transform = t;
        self.preview_cache = None;
    }

    /// The resampled preview (built lazily). Only meaningful in `Preview`;
    /// the screen compositor blends this instead of the raw overlay.
    pub fn preview_resampled(&mut self) -> Option<(&Surface, Rect)> {
        if self.phase != OverlayPhase::Preview {
            return None;
        }
        if self.preview_cache.is_none() {
            let resampled = resample_surface(&self.surface, self.bound, &self.transform);
            self.preview_cache = Some(resampled);
        }
        self.preview_cache
            .as_ref()
            .map(|(s, r)| (s, *r))
    }

    // ------------------------------------------------------------------
    // Commit / cancel
    // ------------------------------------------------------------------

    /// Bake the overlay into the canvas: push one history patch captured
    /// from the canvas BEFORE the blend (covering a cut source region too),
    /// blend by the standard rule, clear. Returns the canvas damage (empty
    /// when there was nothing to commit).
    pub fn commit(&mut self, canvas: &mut Canvas, history: &mut History) -> Rect {
        match self.phase {
            OverlayPhase::Idle => Rect::EMPTY,
            OverlayPhase::Accumulating => {
                let r = self.bound.bound(&canvas.bounds());
                if r.is_empty() {
                    self.clear();
                    return Rect::EMPTY;
                }
                history.record_patch(canvas, r);
                canvas.surface.blend(&self.surface, r);
                self.clear();
                r
            }
            OverlayPhase::Preview => {
                let (resampled, dst) = resample_surface(&self.surface, self.bound, &self.transform);
                let cut = self.pre_cut.take();
                if dst.is_empty() {
                    // Degenerate transform or content pushed fully
                    // off-canvas: nothing to blend, but a cut source must
                    // still become a real (undoable) mutation.
                    if let Some((cut_rect, before)) = cut {
                        history.record(crate::components::history::HistoryEntry::Patch {
                            x: cut_rect.left,
                            y: cut_rect.top,
                            pixels: before,
                        });
                        self.clear();
                        return cut_rect;
                    }
                    self.clear();
                    return Rect::EMPTY;
                }

                // History region: blend target plus the cut source.
                let mut region = dst;
                if let Some((cut_rect, _)) = &cut {
                    region = region.expand(cut_rect);
                }
                let mut snapshot = canvas.surface.snapshot_rect(region);
                if let Some((cut_rect, before)) = &cut {
                    // Stitch the pre-cut pixels back in so undo restores
                    // the canvas exactly as it was before the cut.
                    snapshot.blit(before, cut_rect.left - region.left, cut_rect.top - region.top);
                }
                history.record(crate::components::history::HistoryEntry::Patch {
                    x: region.left,
                    y: region.top,
                    pixels: snapshot,
                });

                canvas.surface.blend(&resampled, dst);
                self.clear();
                region
            }
        }
    }

    /// Abandon the pending content without touching the canvas — except to
    /// restore a cut source region, so no partial state survives. Returns
    /// the region needing a screen refresh.
    pub fn cancel(&mut self, canvas: &mut Canvas) -> Rect {
        let mut damage = Rect::EMPTY;
        if let Some((cut_rect, before)) = self.pre_cut.take() {
            canvas.surface.blit(&before, cut_rect.left, cut_rect.top);
            damage = cut_rect;
        }
        damage.expand(&self.clear())
    }
}
