// ============================================================================
// FIGURES — regular-polygon outline and frame/flood interior fill
// ============================================================================

use image::Rgba;
use std::f32::consts::PI;

use crate::canvas::{Surface, premultiply};
use crate::geometry::Rect;
use crate::ops::brush::{BrushCache, BrushParams, BrushShape, stamp_at};
use crate::ops::draw::walk_line;
use crate::ops::fill::flood_fill;

/// Inner-frame inset per pixel of outline width (tan 22.5°). The ratio and
/// the 2 px floor are behavioral contracts; changing them changes which
/// thin-outline fills leak.
pub const FRAME_INSET_RATIO: f32 = 0.4142;
pub const FRAME_INSET_MIN: i32 = 2;

/// Below this outline width the frame+fill strategy collapses to two
/// parallel 1 px rings.
pub const THIN_OUTLINE_WIDTH: u32 = 2;

/// Number of sides used when a figure should read as a circle.
pub const CIRCLE_SIDES: u32 = 36;

/// Draw a regular N-gon between `anchor` and `opposite`.
///
/// With `centered` false the two points are opposite corners of the figure's
/// span and the center is their midpoint; with `centered` true the anchor IS
/// the center and `opposite` sets the radius. Even-N figures present a flat
/// side to the span (circumradius = half-span / cos(π/N)); odd-N figures
/// present a vertex against the opposite flat (half-span · 2 / (1 + cos(π/N))).
///
/// Returns the damage rectangle; empty for degenerate input (sides < 3 or a
/// zero-size span).
#[allow(clippy::too_many_arguments)]
pub fn draw_regular_polygon(
    dst: &mut Surface,
    cache: &mut BrushCache,
    anchor: (i32, i32),
    opposite: (i32, i32),
    sides: u32,
    line_width: u32,
    color: Rgba<u8>,
    filled: bool,
    centered: bool,
) -> Rect {
    if sides < 3 {
        return Rect::EMPTY;
    }
    let center = if centered {
        (anchor.0 as f32, anchor.1 as f32)
    } else {
        (
            (anchor.0 + opposite.0) as f32 / 2.0,
            (anchor.1 + opposite.1) as f32 / 2.0,
        )
    };
    let ex = opposite.0 as f32 - center.0;
    let ey = opposite.1 as f32 - center.1;
    let extent = (ex * ex + ey * ey).sqrt();
    if extent < 0.5 {
        return Rect::EMPTY;
    }

    let half_angle = PI / sides as f32;
    let radius = if centered {
        extent
    } else if sides % 2 == 0 {
        extent / half_angle.cos()
    } else {
        extent * 2.0 / (1.0 + half_angle.cos())
    };
    // Even N: flat side up (vertices offset by the half angle); odd N: apex up.
    let angle0 = if sides % 2 == 0 {
        -PI / 2.0 + half_angle
    } else {
        -PI / 2.0
    };

    let line_width = line_width.max(1);
    let mut damage;
    if filled {
        if line_width < THIN_OUTLINE_WIDTH {
            // Two parallel 1 px rings seal the boundary for the fill.
            damage = outline_pass(dst, cache, center, radius, sides, angle0, 1, color);
            if radius > 1.5 {
                damage = damage.expand(&outline_pass(
                    dst, cache, center, radius - 1.0, sides, angle0, 1, color,
                ));
            }
        } else {
            damage = outline_pass(dst, cache, center, radius, sides, angle0, line_width, color);
            let inset = FRAME_INSET_MIN.max((line_width as f32 * FRAME_INSET_RATIO).round() as i32);
            let inner = radius - inset as f32;
            if inner > 1.0 {
                damage = damage.expand(&outline_pass(
                    dst, cache, center, inner, sides, angle0, line_width, color,
                ));
            }
        }
        let seed = (center.0.round() as i32, center.1.round() as i32);
        damage = damage.expand(&flood_fill(dst, seed, premultiply(color)));
    } else {
        damage = outline_pass(dst, cache, center, radius, sides, angle0, line_width, color);
    }
    damage
}

/// Stamp one closed ring of N edges with a hard circular tip.
#[allow(clippy::too_many_arguments)]
fn outline_pass(
    dst: &mut Surface,
    cache: &mut BrushCache,
    center: (f32, f32),
    radius: f32,
    sides: u32,
    angle0: f32,
    line_width: u32,
    color: Rgba<u8>,
) -> Rect {
    let params = BrushParams {
        shape: BrushShape::Circle,
        width: line_width,
        color,
        hardness: 1.0,
    };
    let vertex = |i: u32| -> (i32, i32) {
        let a = angle0 + i as f32 * 2.0 * PI / sides as f32;
        (
            (center.0 + radius * a.cos()).round() as i32,
            (center.1 + radius * a.sin()).round() as i32,
        )
    };

    let mut damage = Rect::EMPTY;
    for i in 0..sides {
        let a = vertex(i);
        let b = vertex((i + 1) % sides);
        // The ring is closed, so each edge's start is the previous edge's
        // end; skipping the first point avoids double-stamping vertices.
        let edge = walk_line(a, b, 1, false, |x, y| stamp_at(dst, cache, &params, x, y));
        damage = damage.expand(&edge);
    }
    damage
}
