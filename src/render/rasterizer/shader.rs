//! Programmable stages of the pipeline.
//!
//! The vertex stage maps object-space positions to clip space; normals and UVs are
//! passed through untouched (no normal matrix is applied, which is only exact for
//! meshes without non-uniform scaling). The fragment stage turns perspective-correct
//! interpolated attributes into a color.

use crate::math::{Mat4, Vec2, Vec3, Vec4};
use crate::texture::Texture;

/// Transform an object-space position to clip space: `view_projection * (p, 1)`.
#[inline]
pub fn vertex_shader(position: Vec3, view_projection: &Mat4) -> Vec4 {
    *view_projection * Vec4::from_vec3(position, 1.0)
}

/// Attributes interpolated at one covered pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentInput {
    pub normal: Vec3,
    pub uv: Vec2,
}

/// Per-fragment color computation.
///
/// Shaders are shared by every tile worker, hence `Sync`.
pub trait FragmentShader: Sync {
    /// Compute the RGB color (in `[0, 1]`) of a fragment.
    fn shade(&self, input: &FragmentInput) -> Vec3;
}

/// Nearest-neighbor texture lookup with wrap addressing.
pub struct TextureShader<'a> {
    texture: &'a Texture,
}

impl<'a> TextureShader<'a> {
    pub fn new(texture: &'a Texture) -> Self {
        Self { texture }
    }
}

impl FragmentShader for TextureShader<'_> {
    #[inline]
    fn shade(&self, input: &FragmentInput) -> Vec3 {
        self.texture.sample(input.uv)
    }
}

/// Visualizes the interpolated normal as `n * 0.5 + 0.5`.
pub struct NormalShader;

impl FragmentShader for NormalShader {
    #[inline]
    fn shade(&self, input: &FragmentInput) -> Vec3 {
        input.normal * 0.5 + Vec3::splat(0.5)
    }
}
