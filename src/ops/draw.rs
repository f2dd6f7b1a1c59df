// ============================================================================
// LINE WALKER — integer Bresenham with stride control
// ============================================================================

use crate::geometry::Rect;

/// Hard ceiling on walked steps. Far beyond any line that can touch a real
/// surface; a walk that hits it is truncated instead of spinning.
const MAX_LINE_STEPS: u64 = 1 << 20;

/// Walk the Bresenham line from `a` to `b`, invoking `plot` at every
/// `spacing`-th step (`spacing` is clamped to ≥ 1; 1 plots every point).
/// `draw_first` controls whether `a` itself is plotted — stroke continuation
/// passes false so the shared point is not stamped twice.
///
/// The loop is bounded by the walk length (capped at [`MAX_LINE_STEPS`]), so
/// pathological inputs terminate. Returns the union of the damage reported
/// by each callback invocation.
pub fn walk_line<F>(a: (i32, i32), b: (i32, i32), spacing: u32, draw_first: bool, mut plot: F) -> Rect
where
    F: FnMut(i32, i32) -> Rect,
{
    let spacing = spacing.max(1);
    // i64 deltas: the walk must survive coordinates anywhere in i32 range.
    let dx = (b.0 as i64 - a.0 as i64).abs();
    let sx: i64 = if a.0 < b.0 { 1 } else { -1 };
    let dy = -(b.1 as i64 - a.1 as i64).abs();
    let sy: i64 = if a.1 < b.1 { 1 } else { -1 };

    let mut x = a.0 as i64;
    let mut y = a.1 as i64;
    let bx = b.0 as i64;
    let by = b.1 as i64;
    let mut err = dx + dy;
    let mut damage = Rect::EMPTY;

    if draw_first {
        damage = damage.expand(&plot(a.0, a.1));
    }

    // One Bresenham iteration per axis-advance; dx - dy = |dx| + |dy|.
    let max_steps = ((dx - dy) as u64).min(MAX_LINE_STEPS);
    if (dx - dy) as u64 > MAX_LINE_STEPS {
        log::debug!("walk_line: {} steps truncated to {MAX_LINE_STEPS}", dx - dy);
    }
    let mut since_plot = 0u32;
    for _ in 0..max_steps {
        if x == bx && y == by {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        since_plot += 1;
        if since_plot >= spacing {
            since_plot = 0;
            damage = damage.expand(&plot(x as i32, y as i32));
        }
    }
    damage
}
