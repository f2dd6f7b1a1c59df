// ============================================================================
// AFFINE PIPELINE — 3×3 matrices, the user transform, gather resampling
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::Surface;
use crate::geometry::Rect;

/// Row-major 3×3 matrix over homogeneous 2D points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3(pub [[f32; 3]; 3]);

impl Mat3 {
    pub fn identity() -> Self {
        Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Mat3([[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]])
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Mat3([[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn rotation(theta: f32) -> Self {
        let (s, c) = theta.sin_cos();
        Mat3([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// `self · rhs` — `rhs` is applied to a point first.
    pub fn mul(&self, rhs: &Mat3) -> Mat3 {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [[0.0f32; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Mat3(out)
    }

    /// Closed-form inverse; `None` when the determinant vanishes
    /// (degenerate scale), so callers turn the operation into a no-op.
    pub fn invert(&self) -> Option<Mat3> {
        let m = &self.0;
        let (a, b, c) = (m[0][0], m[0][1], m[0][2]);
        let (d, e, f) = (m[1][0], m[1][1], m[1][2]);
        let (g, h, i) = (m[2][0], m[2][1], m[2][2]);

        let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Mat3([
            [(e * i - f * h) * inv, (c * h - b * i) * inv, (b * f - c * e) * inv],
            [(f * g - d * i) * inv, (a * i - c * g) * inv, (c * d - a * f) * inv],
            [(d * h - e * g) * inv, (b * g - a * h) * inv, (a * e - b * d) * inv],
        ]))
    }

    /// Map a point through the matrix (homogeneous divide included).
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let m = &self.0;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        let w = if w.abs() < 1e-12 { 1.0 } else { w };
        (
            (m[0][0] * x + m[0][1] * y + m[0][2]) / w,
            (m[1][0] * x + m[1][1] * y + m[1][2]) / w,
        )
    }
}

// ============================================================================
// TRANSFORM — the user-facing move/scale/rotate accumulator
// ============================================================================

/// Accumulated interactive transform: integer translation, non-uniform
/// scale, rotation in radians.
///
/// `combined` merges two transforms by multiplying scales and summing
/// rotations/translations — an approximation that holds because rendering
/// always flattens to a single matrix; the real composition order is the
/// matrix product in [`Transform::matrix`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translate: (i32, i32),
    pub scale: (f32, f32),
    pub rotate: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translate: (0, 0),
            scale: (1.0, 1.0),
            rotate: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translate == (0, 0)
            && (self.scale.0 - 1.0).abs() < 1e-6
            && (self.scale.1 - 1.0).abs() < 1e-6
            && self.rotate.abs() < 1e-6
    }

    pub fn combined(&self, other: &Transform) -> Transform {
        Transform {
            translate: (
                self.translate.0 + other.translate.0,
                self.translate.1 + other.translate.1,
            ),
            scale: (self.scale.0 * other.scale.0, self.scale.1 * other.scale.1),
            rotate: self.rotate + other.rotate,
        }
    }

    /// Flatten to `translate · scale · rotate` (rotation hits a point first).
    pub fn matrix(&self) -> Mat3 {
        Mat3::translation(self.translate.0 as f32, self.translate.1 as f32)
            .mul(&Mat3::scaling(self.scale.0, self.scale.1))
            .mul(&Mat3::rotation(self.rotate))
    }

    /// The flattened matrix pivoted at `pivot`:
    /// `T(pivot) · M · T(−pivot)`, i.e. the point is moved to the pivot
    /// origin, transformed, and moved back.
    pub fn matrix_about(&self, pivot: (f32, f32)) -> Mat3 {
        Mat3::translation(pivot.0, pivot.1)
            .mul(&self.matrix())
            .mul(&Mat3::translation(-pivot.0, -pivot.1))
    }
}

// ============================================================================
// RESAMPLING — gather model: destination pixels pull from inverse-mapped src
// ============================================================================

/// Forward-map an inclusive rectangle and return the bounding box of the
/// result, clipped to `clip`.
pub fn map_rect_bounds(m: &Mat3, rect: Rect, clip: Rect) -> Rect {
    if rect.is_empty() {
        return Rect::EMPTY;
    }
    let corners = [
        (rect.left as f32, rect.top as f32),
        (rect.right as f32 + 1.0, rect.top as f32),
        (rect.left as f32, rect.bottom as f32 + 1.0),
        (rect.right as f32 + 1.0, rect.bottom as f32 + 1.0),
    ];
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (x, y) in corners {
        let (mx, my) = m.apply(x, y);
        min_x = min_x.min(mx);
        min_y = min_y.min(my);
        max_x = max_x.max(mx);
        max_y = max_y.max(my);
    }
    Rect::new(
        min_x.floor() as i32,
        min_y.floor() as i32,
        max_x.ceil() as i32 - 1,
        max_y.ceil() as i32 - 1,
    )
    .bound(&clip)
}

/// Resample the content of `src` inside `content` through `transform`,
/// pivoted at the content's top-left corner, into a fresh surface of the
/// same dimensions (transparent elsewhere).
///
/// Destination pixels gather: each one maps through the INVERSE matrix and
/// bilinearly samples the source, with everything outside `content` treated
/// as transparent. Returns the surface and the clipped destination bound;
/// empty bound (and an untouched surface) when the transform is degenerate.
pub fn resample_surface(src: &Surface, content: Rect, transform: &Transform) -> (Surface, Rect) {
    let mut out_img = RgbaImage::new(src.width(), src.height());
    let content = content.bound(&src.bounds());
    if content.is_empty() {
        return (Surface::from_premultiplied(out_img), Rect::EMPTY);
    }

    let pivot = (content.left as f32, content.top as f32);
    let forward = transform.matrix_about(pivot);
    let Some(inverse) = forward.invert() else {
        log::debug!("resample_surface: degenerate transform, skipping");
        return (Surface::from_premultiplied(out_img), Rect::EMPTY);
    };

    let dst_rect = map_rect_bounds(&forward, content, src.bounds());
    if dst_rect.is_empty() {
        return (Surface::from_premultiplied(out_img), Rect::EMPTY);
    }

    let src_raw = src.as_image().as_raw();
    let src_stride = src.width() as usize * 4;
    let row_bytes = src_stride;

    // Clamped bilinear sample, transparent outside the content rectangle.
    let sample = |sx: i32, sy: i32| -> [f32; 4] {
        if !content.contains(sx, sy) {
            [0.0; 4]
        } else {
            let idx = sy as usize * src_stride + sx as usize * 4;
            [
                src_raw[idx] as f32,
                src_raw[idx + 1] as f32,
                src_raw[idx + 2] as f32,
                src_raw[idx + 3] as f32,
            ]
        }
    };

    out_img
        .par_chunks_mut(row_bytes)
        .enumerate()
        .skip(dst_rect.top as usize)
        .take(dst_rect.height() as usize)
        .for_each(|(dy, row)| {
            for dx in dst_rect.left..=dst_rect.right {
                let (sx, sy) = inverse.apply(dx as f32, dy as f32);
                let x0 = sx.floor() as i32;
                let y0 = sy.floor() as i32;
                if x0 < content.left - 1
                    || y0 < content.top - 1
                    || x0 > content.right
                    || y0 > content.bottom
                {
                    continue;
                }
                let fx = sx - x0 as f32;
                let fy = sy - y0 as f32;

                let tl = sample(x0, y0);
                let tr = sample(x0 + 1, y0);
                let bl = sample(x0, y0 + 1);
                let br = sample(x0 + 1, y0 + 1);

                let px = dx as usize * 4;
                for c in 0..4 {
                    let top = tl[c] + (tr[c] - tl[c]) * fx;
                    let bot = bl[c] + (br[c] - bl[c]) * fx;
                    row[px + c] = (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    (Surface::from_premultiplied(out_img), dst_rect)
}
