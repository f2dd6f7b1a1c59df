// ============================================================================
// BRUSH STAMPS — alpha-falloff tip synthesis and the per-tool stamp cache
// ============================================================================

use image::Rgba;

use crate::canvas::{Surface, premultiply};
use crate::geometry::Rect;

/// Brush tip shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushShape {
    /// Single pixel regardless of width.
    Point,
    /// Filled square, hard edge.
    Square,
    /// Filled circle, hard edge.
    Circle,
    /// Circle with a hardness-controlled soft falloff.
    SoftCircle,
    /// Sparse random dot pattern ("spray"); never cached.
    Spray,
}

/// Parameters that shape a stamp. The whole set is the cache key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushParams {
    pub shape: BrushShape,
    /// Tip diameter in pixels (≥ 1).
    pub width: u32,
    /// Straight-alpha paint color.
    pub color: Rgba<u8>,
    /// 0.0 (softest / sparsest) to 1.0 (hard / dense).
    pub hardness: f32,
}

impl Default for BrushParams {
    fn default() -> Self {
        Self {
            shape: BrushShape::Circle,
            width: 4,
            color: Rgba([0, 0, 0, 255]),
            hardness: 0.75,
        }
    }
}

/// Ease-out cubic: fast rise, gentle settle at 1.
#[inline]
fn ease_out_cubic(x: f32) -> f32 {
    let inv = 1.0 - x.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Ease-in exponential, 0 at 0 and 1 at 1.
#[inline]
fn ease_in_expo(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else {
        2f32.powf(10.0 * (x.clamp(0.0, 1.0) - 1.0))
    }
}

/// Deterministic positional hash used to seed per-dot randomness for the
/// spray tip. Same construction as a Wang-style integer mix; cheap and
/// reproducible across runs.
#[inline]
fn stamp_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = x
        .wrapping_mul(374761393)
        .wrapping_add(y.wrapping_mul(668265263))
        .wrapping_add(seed.wrapping_mul(1013904223));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[inline]
fn hash01(x: u32, y: u32, seed: u32) -> f32 {
    (stamp_hash(x, y, seed) >> 8) as f32 / 16_777_216.0
}

// ============================================================================
// STAMP CACHE
// ============================================================================

/// Memoized tip stamp owned by a tool slot.
///
/// The stamp is rebuilt when any field of [`BrushParams`] changes; the Spray
/// shape is rebuilt on every use with a fresh seed so consecutive stamps
/// scatter differently.
pub struct BrushCache {
    key: Option<BrushParams>,
    stamp: Surface,
    /// Monotonic counter seeding the spray scatter.
    counter: u32,
}

impl Default for BrushCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BrushCache {
    pub fn new() -> Self {
        Self {
            key: None,
            stamp: Surface::new(1, 1),
            counter: 0,
        }
    }

    /// Drop the memoized stamp (e.g. after an external invalidation).
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    /// Return the stamp for `params`, rebuilding only when the key changed.
    fn stamp_for(&mut self, params: &BrushParams) -> &Surface {
        let must_rebuild = params.shape == BrushShape::Spray || self.key.as_ref() != Some(params);
        if must_rebuild {
            self.counter = self.counter.wrapping_add(1);
            self.stamp = build_stamp(params, self.counter);
            self.key = Some(*params);
        }
        &self.stamp
    }
}

/// Synthesize a premultiplied tip stamp of `width × width` pixels.
fn build_stamp(params: &BrushParams, seed: u32) -> Surface {
    let size = params.width.max(1);
    let mut stamp = Surface::new(size, size);
    let radius = size as f32 / 2.0;
    let center = (size as f32 - 1.0) / 2.0;
    let hardness = params.hardness.clamp(0.0, 1.0);

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let t = (dx * dx + dy * dy).sqrt() / radius.max(0.5);

            let weight = match params.shape {
                BrushShape::Point => {
                    if x == size / 2 && y == size / 2 {
                        1.0
                    } else {
                        0.0
                    }
                }
                BrushShape::Square => 1.0,
                BrushShape::Circle => {
                    if t <= 1.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
                BrushShape::SoftCircle => soft_circle_weight(t, hardness),
                BrushShape::Spray => {
                    // Dot lands when the positional hash clears an
                    // ease-in-exponential density threshold; hardness scales
                    // overall density with a floor so 0.0 still paints.
                    let p = ease_in_expo(1.0 - t) * hardness.max(0.05);
                    if t <= 1.0 && hash01(x, y, seed) < p {
                        1.0
                    } else {
                        0.0
                    }
                }
            };

            if weight > 0.0 {
                let a = (params.color[3] as f32 * weight).round().clamp(0.0, 255.0) as u8;
                if a > 0 {
                    let c = premultiply(Rgba([params.color[0], params.color[1], params.color[2], a]));
                    stamp.put(x as i32, y as i32, c);
                }
            }
        }
    }
    stamp
}

/// Radial weight for the soft circle: solid out to `hardness · radius`, then
/// an ease-out-cubic fade to the rim.
fn soft_circle_weight(t: f32, hardness: f32) -> f32 {
    if t >= 1.0 {
        return 0.0;
    }
    if t <= hardness {
        return 1.0;
    }
    let span = (1.0 - hardness).max(1e-4);
    ease_out_cubic(1.0 - (t - hardness) / span)
}

/// Composite one stamp centered at `(cx, cy)` onto `dst` with the standard
/// paint-with-transparency rule, clipped to the surface. Returns the clipped
/// bounding rectangle actually touched (empty when fully off-surface).
pub fn stamp_at(
    dst: &mut Surface,
    cache: &mut BrushCache,
    params: &BrushParams,
    cx: i32,
    cy: i32,
) -> Rect {
    let size = params.width.max(1) as i32;
    let left = cx - size / 2;
    let top = cy - size / 2;
    let target = Rect::from_size(left, top, size as u32, size as u32).bound(&dst.bounds());
    if target.is_empty() {
        return Rect::EMPTY;
    }

    let stamp = cache.stamp_for(params);
    for y in target.top..=target.bottom {
        for x in target.left..=target.right {
            if let Some(px) = stamp.get(x - left, y - top) {
                if px[3] != 0 {
                    dst.put_blended(x, y, px);
                }
            }
        }
    }
    target
}
