// ============================================================================
// SCREEN CACHE — derived composite of canvas ⊕ overlay, damage-driven
// ============================================================================

use rayon::prelude::*;

use crate::canvas::{Canvas, Surface, blend_pixel};
use crate::geometry::Rect;
use crate::overlay::{Overlay, OverlayPhase};

/// Render-only composite the presentation layer reads. Never a source of
/// truth: any region can be rebuilt from canvas + overlay at any time, and
/// [`ScreenCache::refresh`] rebuilds exactly the damaged region.
pub struct ScreenCache {
    surface: Surface,
}

impl ScreenCache {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: Surface::new(width, height),
        }
    }

    /// The composited pixels (premultiplied), canvas-sized.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Track a canvas resize. Contents are stale until the caller refreshes.
    pub fn match_canvas(&mut self, canvas: &Canvas) {
        if self.surface.width() != canvas.width() || self.surface.height() != canvas.height() {
            self.surface = Surface::new(canvas.width(), canvas.height());
        }
    }

    /// Recomposite the damaged region: canvas pixels, then the overlay —
    /// raw while a stroke accumulates, resampled while a transform preview
    /// is pending. Rows are processed in parallel. Returns the region
    /// actually rebuilt.
    pub fn refresh(&mut self, canvas: &Canvas, overlay: &mut Overlay, damage: Rect) -> Rect {
        let r = damage.bound(&canvas.bounds()).bound(&self.surface.bounds());
        if r.is_empty() {
            return Rect::EMPTY;
        }

        // Resolve the overlay source before the row loop borrows `self`.
        let (ov_surface, ov_rect): (Option<&Surface>, Rect) = match overlay.phase() {
            OverlayPhase::Idle => (None, Rect::EMPTY),
            OverlayPhase::Accumulating => {
                let b = overlay.bound();
                (Some(overlay.surface()), b)
            }
            OverlayPhase::Preview => match overlay.preview_resampled() {
                Some((s, pr)) => (Some(s), pr),
                None => (None, Rect::EMPTY),
            },
        };
        let ov_rect = ov_rect.bound(&r);

        let canvas_raw = canvas.surface.as_image().as_raw();
        let ov_raw = ov_surface.map(|s| s.as_image().as_raw());
        let row_bytes = self.surface.width() as usize * 4;
        let x0 = r.left as usize * 4;
        let x1 = (r.right as usize + 1) * 4;

        self.surface
            .as_image_mut()
            .par_chunks_mut(row_bytes)
            .enumerate()
            .skip(r.top as usize)
            .take(r.height() as usize)
            .for_each(|(y, row)| {
                let off = y * row_bytes;
                row[x0..x1].copy_from_slice(&canvas_raw[off + x0..off + x1]);

                if let Some(ov) = ov_raw {
                    let y = y as i32;
                    if y >= ov_rect.top && y <= ov_rect.bottom {
                        for x in ov_rect.left..=ov_rect.right {
                            let i = x as usize * 4;
                            let s = image::Rgba([ov[off + i], ov[off + i + 1], ov[off + i + 2], ov[off + i + 3]]);
                            if s[3] != 0 {
                                let d = image::Rgba([row[i], row[i + 1], row[i + 2], row[i + 3]]);
                                let out = blend_pixel(d, s);
                                row[i..i + 4].copy_from_slice(&out.0);
                            }
                        }
                    }
                }
            });
        r
    }
}
