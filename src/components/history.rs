// ============================================================================
// HISTORY — linear undo/redo double stack of owned pixel snapshots
// ============================================================================

use crate::canvas::{Canvas, Surface};
use crate::geometry::Rect;

/// Default cap on retained undo steps; the oldest entries are pruned past it.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// One undoable step. Every entry owns an independent deep copy of the
/// pixels it restores — snapshots are never shared with the live canvas.
pub enum HistoryEntry {
    /// Pre-mutation pixels of a sub-rectangle anchored at `(x, y)`.
    Patch { x: i32, y: i32, pixels: Surface },
    /// Full pre-resize surface; dimension changes cannot be patched.
    Resize { pixels: Surface },
}

impl HistoryEntry {
    /// Capture the canvas's CURRENT content over the same region, so the
    /// inverse operation can be replayed later.
    fn counterpart(&self, canvas: &Canvas) -> HistoryEntry {
        match self {
            HistoryEntry::Patch { x, y, pixels } => HistoryEntry::Patch {
                x: *x,
                y: *y,
                pixels: canvas
                    .surface
                    .snapshot_rect(Rect::from_size(*x, *y, pixels.width(), pixels.height())),
            },
            HistoryEntry::Resize { .. } => HistoryEntry::Resize {
                pixels: canvas.surface.clone(),
            },
        }
    }

    /// Write the stored pixels back onto the canvas. Returns the damaged
    /// region (the full new bounds for a resize).
    fn replay(self, canvas: &mut Canvas) -> Rect {
        match self {
            HistoryEntry::Patch { x, y, pixels } => canvas.surface.blit(&pixels, x, y),
            HistoryEntry::Resize { pixels } => {
                canvas.replace_surface(pixels);
                canvas.bounds()
            }
        }
    }

    fn byte_size(&self) -> usize {
        let s = match self {
            HistoryEntry::Patch { pixels, .. } => pixels,
            HistoryEntry::Resize { pixels } => pixels,
        };
        s.width() as usize * s.height() as usize * 4
    }
}

/// Undo ("past") and redo ("future") stacks. Any new recording clears the
/// future stack; undo/redo on an empty stack report "nothing to do" by
/// returning `None`.
pub struct History {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Push a pre-mutation entry. Call BEFORE mutating the canvas.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        self.undo.push(entry);
        if self.undo.len() > self.max_entries {
            let drop = self.undo.len() - self.max_entries;
            self.undo.drain(..drop);
        }
    }

    /// Snapshot `rect` from the canvas and record it as a patch entry.
    /// Empty (or fully clipped) rectangles record nothing.
    pub fn record_patch(&mut self, canvas: &Canvas, rect: Rect) {
        let r = rect.bound(&canvas.bounds());
        if r.is_empty() {
            return;
        }
        self.record(HistoryEntry::Patch {
            x: r.left,
            y: r.top,
            pixels: canvas.surface.snapshot_rect(r),
        });
    }

    /// Record a full pre-resize snapshot.
    pub fn record_resize(&mut self, before: Surface) {
        self.record(HistoryEntry::Resize { pixels: before });
    }

    /// Step back once. Captures the current content for redo first, then
    /// replays the popped snapshot. `None` when there is nothing to undo.
    pub fn undo(&mut self, canvas: &mut Canvas) -> Option<Rect> {
        let entry = self.undo.pop()?;
        self.redo.push(entry.counterpart(canvas));
        Some(entry.replay(canvas))
    }

    /// Step forward once; the mirror of [`History::undo`].
    pub fn redo(&mut self, canvas: &mut Canvas) -> Option<Rect> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.counterpart(canvas));
        Some(entry.replay(canvas))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    /// Bytes held across both stacks.
    pub fn memory_usage(&self) -> usize {
        self.undo
            .iter()
            .chain(self.redo.iter())
            .map(|e| e.byte_size())
            .sum()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
