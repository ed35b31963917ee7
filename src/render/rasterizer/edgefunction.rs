//! Homogeneous triangle setup and edge-function scan conversion.
//!
//! # Algorithm Overview
//!
//! Clip-space vertices are mapped to raster space *without* the perspective divide,
//! giving for each vertex the homogeneous triple `(x, y, w)`. Those three triples
//! form the columns of a 3x3 matrix `M`:
//!
//! ```text
//!     | x0 x1 x2 |
//! M = | y0 y1 y2 |
//!     | w0 w1 w2 |
//! ```
//!
//! - `det(M) == 0`: zero-area triangle
//! - `det(M) > 0`: back-facing (clockwise in NDC with y up)
//! - `det(M) < 0`: front-facing, rasterized
//!
//! Row `i` of `M⁻¹` is an affine function `E_i(px, py) = a·px + b·py + c` that is
//! zero on the edge opposite vertex `i` and positive on the triangle's side of it.
//! More precisely `E_i(p) = λ_i(p) / w(p)` where `λ_i` is the perspective-correct
//! barycentric weight of vertex `i`. Summing the rows weighted by a per-vertex
//! attribute therefore yields `attr / w`, linear in raster space; dividing by the
//! interpolated `1 / w` recovers the perspective-correct attribute.
//!
//! # Scan Conversion
//!
//! Only pixels inside the clamped screen-space bounding box are visited. Within a row
//! each edge function is evaluated once at the leftmost sample and then advanced by
//! its `a` coefficient per pixel.
//!
//! # References
//!
//! - Olano & Greer, "Triangle Scan Conversion using 2D Homogeneous Coordinates" (1997)
//! - Juan Pineda, "A Parallel Algorithm for Polygon Rasterization" (1988)

use std::ops::Range;

use super::shader::FragmentInput;
use crate::math::{Mat3, Vec2, Vec3, Vec4};

/// Map a clip-space position to homogeneous raster coordinates.
///
/// `x` and `y` are scaled to the viewport (y flipped so row 0 is the top) but *not*
/// divided by `w`; `z` and `w` are kept as-is.
#[inline]
pub fn to_raster(clip: Vec4, width: f32, height: f32) -> Vec4 {
    Vec4::new(
        width * (clip.x + clip.w) / 2.0,
        height * (clip.w - clip.y) / 2.0,
        clip.z,
        clip.w,
    )
}

/// Center of pixel `(x, y)`.
#[inline]
pub fn pixel_center(x: u32, y: u32) -> (f32, f32) {
    (x as f32 + 0.5, y as f32 + 0.5)
}

/// One normalized edge function `a·px + b·py + c`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeFunction {
    coefficients: Vec3,
    /// Whether a sample exactly on the edge (value 0) counts as inside.
    owns_ties: bool,
}

impl EdgeFunction {
    /// Builds an edge from a row of the inverted vertex matrix.
    ///
    /// The row is divided by `|a| + |b|`. Scaling keeps the sign of every
    /// evaluation, so coverage is unchanged while magnitudes stay comparable across
    /// tiny and huge triangles.
    pub fn new(row: Vec3) -> Self {
        let coefficients = row / (row.x.abs() + row.y.abs());
        let owns_ties = if coefficients.x != 0.0 {
            coefficients.x > 0.0
        } else {
            coefficients.y >= 0.0
        };
        Self {
            coefficients,
            owns_ties,
        }
    }

    pub fn coefficients(&self) -> Vec3 {
        self.coefficients
    }

    #[inline]
    pub fn eval(&self, px: f32, py: f32) -> f32 {
        self.coefficients.eval(px, py)
    }

    /// Inside test with the shared-edge tie-break.
    ///
    /// Positive is inside, negative outside. A zero value is inside iff `a > 0`, or
    /// `a == 0 && b >= 0`. Two triangles sharing an edge see it with opposite
    /// coefficients, so exactly one of them owns samples lying on it.
    #[inline]
    pub fn is_inside(&self, value: f32) -> bool {
        value > 0.0 || (value == 0.0 && self.owns_ties)
    }
}

/// Inclusive pixel bounding box, always inside `[0, width) x [0, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Bounds {
    /// Screen-space box of the projected vertices `(x/w, y/w)`, clamped to the
    /// viewport. Returns `None` if the clamped box is empty.
    ///
    /// Assumes every `w` is positive.
    pub fn from_raster(raster: &[Vec4; 3], width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let xs = raster.map(|v| v.x / v.w);
        let ys = raster.map(|v| v.y / v.w);

        let min_x = xs[0].min(xs[1]).min(xs[2]).floor().max(0.0);
        let min_y = ys[0].min(ys[1]).min(ys[2]).floor().max(0.0);
        let max_x = xs[0].max(xs[1]).max(xs[2]).ceil().min((width - 1) as f32);
        let max_y = ys[0].max(ys[1]).max(ys[2]).ceil().min((height - 1) as f32);

        if !(min_x <= max_x && min_y <= max_y) {
            return None;
        }

        Some(Self {
            min_x: min_x as u32,
            min_y: min_y as u32,
            max_x: max_x as u32,
            max_y: max_y as u32,
        })
    }

    /// Rows of this box that fall within `rows`.
    #[inline]
    pub fn clip_rows(&self, rows: &Range<u32>) -> Range<u32> {
        rows.start.max(self.min_y)..rows.end.min(self.max_y + 1)
    }
}

/// Per-triangle coefficients produced by triangle setup.
#[derive(Clone, Copy, Debug)]
pub struct TriangleSetup {
    edges: [EdgeFunction; 3],
    one_over_w: Vec3,
    depth: Vec3,
    normal: [Vec3; 3],
    uv: [Vec3; 2],
    bounds: Bounds,
}

impl TriangleSetup {
    /// Sets up a triangle from its clip-space positions and vertex attributes.
    ///
    /// Returns `None` when the triangle produces no work:
    /// - a vertex has `w <= 0` (behind the eye; there is no near-plane clipping)
    /// - `det(M) >= 0` (degenerate or back-facing)
    /// - its bounding box misses the viewport
    pub fn new(
        clip: [Vec4; 3],
        normals: [Vec3; 3],
        uvs: [Vec2; 3],
        width: u32,
        height: u32,
    ) -> Option<Self> {
        if !clip.iter().all(|c| c.w > 0.0) {
            return None;
        }

        let raster = clip.map(|c| to_raster(c, width as f32, height as f32));
        let m = Mat3::from_cols(
            Vec3::new(raster[0].x, raster[0].y, raster[0].w),
            Vec3::new(raster[1].x, raster[1].y, raster[1].w),
            Vec3::new(raster[2].x, raster[2].y, raster[2].w),
        );

        let det = m.determinant();
        if !(det < 0.0) {
            return None;
        }

        let bounds = Bounds::from_raster(&raster, width, height)?;

        let inv = m.inverse_with_determinant(det);
        let edges = [
            EdgeFunction::new(inv.row(0)),
            EdgeFunction::new(inv.row(1)),
            EdgeFunction::new(inv.row(2)),
        ];

        // Σ attr_i · row_i(M⁻¹)
        let interp = inv.transpose();
        let attribute = |a: [f32; 3]| interp * Vec3::new(a[0], a[1], a[2]);

        Some(Self {
            edges,
            one_over_w: attribute([1.0; 3]),
            depth: attribute([clip[0].z, clip[1].z, clip[2].z]),
            normal: [
                attribute(normals.map(|n| n.x)),
                attribute(normals.map(|n| n.y)),
                attribute(normals.map(|n| n.z)),
            ],
            uv: [attribute(uvs.map(|t| t.x)), attribute(uvs.map(|t| t.y))],
            bounds,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn edges(&self) -> &[EdgeFunction; 3] {
        &self.edges
    }

    /// Direct (non-incremental) coverage test of pixel `(x, y)`.
    pub fn covers(&self, x: u32, y: u32) -> bool {
        let (px, py) = pixel_center(x, y);
        self.edges.iter().all(|e| e.is_inside(e.eval(px, py)))
    }

    /// Visits every covered pixel of the bounding box within `rows`, row by row from
    /// left to right.
    pub fn scan(&self, rows: Range<u32>, mut visit: impl FnMut(u32, u32)) {
        let [e0, e1, e2] = self.edges;
        let (a0, a1, a2) = (
            e0.coefficients.x,
            e1.coefficients.x,
            e2.coefficients.x,
        );
        let start_x = self.bounds.min_x as f32 + 0.5;

        for y in self.bounds.clip_rows(&rows) {
            let py = y as f32 + 0.5;
            let mut v0 = e0.eval(start_x, py);
            let mut v1 = e1.eval(start_x, py);
            let mut v2 = e2.eval(start_x, py);
            let mut entered = false;

            for x in self.bounds.min_x..=self.bounds.max_x {
                if e0.is_inside(v0) && e1.is_inside(v1) && e2.is_inside(v2) {
                    entered = true;
                    visit(x, y);
                } else if entered {
                    // Coverage along a row is one contiguous span.
                    break;
                }
                v0 += a0;
                v1 += a1;
                v2 += a2;
            }
        }
    }

    /// Interpolated `w` and clip-space depth at a sample.
    #[inline]
    pub fn w_and_depth(&self, px: f32, py: f32) -> (f32, f32) {
        let w = 1.0 / self.one_over_w.eval(px, py);
        (w, self.depth.eval(px, py) * w)
    }

    /// Perspective-correct normal and UV at a sample, given its interpolated `w`.
    #[inline]
    pub fn attributes(&self, px: f32, py: f32, w: f32) -> FragmentInput {
        FragmentInput {
            normal: Vec3::new(
                self.normal[0].eval(px, py),
                self.normal[1].eval(px, py),
                self.normal[2].eval(px, py),
            ) * w,
            uv: Vec2::new(self.uv[0].eval(px, py), self.uv[1].eval(px, py)) * w,
        }
    }

    /// Everything interpolated at a sample: `(w, depth, attributes)`.
    pub fn interpolate(&self, px: f32, py: f32) -> (f32, f32, FragmentInput) {
        let (w, depth) = self.w_and_depth(px, py);
        (w, depth, self.attributes(px, py, w))
    }
}
