//! The draw pipeline.
//!
//! A draw call runs three stages:
//!
//! 1. **Vertex stage**: every vertex of the scene is transformed to clip space once,
//!    in parallel, into a scratch buffer owned by the rasterizer.
//! 2. **Triangle setup** (per mesh): each triangle is culled or turned into a
//!    [`TriangleSetup`], in parallel, keeping submission order.
//! 3. **Scan conversion** (per mesh): the framebuffer is split into disjoint bands of
//!    rows. Each band is owned by one worker, which walks every set-up triangle in
//!    submission order and depth-tests the covered pixels that fall inside it.
//!
//! Since no two workers ever touch the same pixel, the output is identical to
//! drawing every triangle sequentially, whatever the band height.

mod edgefunction;
mod shader;

pub use edgefunction::{pixel_center, to_raster, Bounds, EdgeFunction, TriangleSetup};
pub use shader::{vertex_shader, FragmentInput, FragmentShader, NormalShader, TextureShader};

use std::path::Path;

use rayon::prelude::*;

use super::framebuffer::{FrameBuffer, Tile};
use crate::camera::Camera;
use crate::config::{RenderConfig, ShadingMode};
use crate::error::{Error, Result};
use crate::math::Vec4;
use crate::scene::Scene;

/// Default height of one framebuffer band, in rows.
pub const DEFAULT_TILE_ROWS: u32 = 32;

/// Counters for one [`Rasterizer::rasterize_scene`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub meshes: usize,
    /// Triangles submitted.
    pub triangles: usize,
    /// Triangles rejected by setup: back-facing, degenerate, behind the eye or
    /// entirely off-screen.
    pub culled: usize,
    /// Fragments that passed the depth test and were shaded.
    pub fragments: usize,
}

/// Owns a scene, a camera and the buffers the scene is drawn into.
pub struct Rasterizer {
    scene: Scene,
    camera: Camera,
    framebuffer: FrameBuffer,
    tile_rows: u32,
    shading: ShadingMode,

    // Scratch buffers reused by every draw call.
    clip_positions: Vec<Vec4>,
    setups: Vec<TriangleSetup>,
}

impl Rasterizer {
    /// Takes ownership of `scene` and `camera` and allocates a `width` x `height`
    /// framebuffer.
    ///
    /// Fails if the scene does not validate or the resolution is zero.
    pub fn new(scene: Scene, camera: Camera, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "resolution must be non-zero, got {}x{}",
                width, height
            )));
        }
        scene.validate()?;

        let max_triangles = scene
            .meshes()
            .iter()
            .map(|mesh| mesh.triangle_count())
            .max()
            .unwrap_or(0);

        Ok(Self {
            clip_positions: vec![Vec4::ZERO; scene.vertices().len()],
            setups: Vec::with_capacity(max_triangles),
            scene,
            camera,
            framebuffer: FrameBuffer::new(width, height),
            tile_rows: DEFAULT_TILE_ROWS,
            shading: ShadingMode::default(),
        })
    }

    /// Builds the rasterizer and camera described by `config`.
    pub fn from_config(scene: Scene, config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        let mut rasterizer = Self::new(
            scene,
            Camera::from_config(config),
            config.target_width,
            config.target_height,
        )?;
        rasterizer.tile_rows = config.tile_rows;
        rasterizer.shading = config.shading;
        Ok(rasterizer)
    }

    /// Transforms and rasterizes every mesh of the scene into the framebuffer.
    ///
    /// Buffers are not cleared first; call [`clear`](Self::clear) between frames.
    pub fn rasterize_scene(&mut self) -> DrawStats {
        let Self {
            scene,
            camera,
            framebuffer,
            tile_rows,
            shading,
            clip_positions,
            setups,
        } = self;

        let mut stats = DrawStats::default();
        if scene.meshes().is_empty() {
            log::warn!("rasterize_scene called on a scene without meshes");
            return stats;
        }

        let view_projection = *camera.view_projection();
        clip_positions
            .par_iter_mut()
            .zip(scene.vertices().par_iter())
            .for_each(|(clip, vertex)| *clip = vertex_shader(vertex.position, &view_projection));

        let scene: &Scene = scene;
        let clip_positions: &[Vec4] = clip_positions;

        let (width, height) = (framebuffer.width(), framebuffer.height());

        for (index, mesh) in scene.meshes().iter().enumerate() {
            let triangles = mesh.triangle_count();

            setups.clear();
            setups.par_extend((0..triangles).into_par_iter().filter_map(|triangle| {
                let [i0, i1, i2] = scene.triangle_indices(mesh, triangle);
                let v = scene.vertices();
                TriangleSetup::new(
                    [clip_positions[i0], clip_positions[i1], clip_positions[i2]],
                    [v[i0].normal, v[i1].normal, v[i2].normal],
                    [v[i0].uv, v[i1].uv, v[i2].uv],
                    width,
                    height,
                )
            }));

            let fragments = match shading {
                ShadingMode::Texture => match scene.texture(&mesh.texture) {
                    Some(texture) => {
                        shade_tiles(framebuffer, *tile_rows, setups, &TextureShader::new(texture))
                    }
                    None => {
                        log::error!("mesh {}: texture `{}` vanished", index, mesh.texture);
                        0
                    }
                },
                ShadingMode::Normals => shade_tiles(framebuffer, *tile_rows, setups, &NormalShader),
            };

            log::debug!(
                "mesh {}: {} triangles, {} culled, {} fragments",
                index,
                triangles,
                triangles - setups.len(),
                fragments
            );

            stats.meshes += 1;
            stats.triangles += triangles;
            stats.culled += triangles - setups.len();
            stats.fragments += fragments;
        }

        log::info!(
            "drew {} meshes at {}x{}: {} triangles ({} culled), {} fragments",
            stats.meshes,
            width,
            height,
            stats.triangles,
            stats.culled,
            stats.fragments
        );

        stats
    }

    /// Resets the framebuffer to black and every depth to +infinity.
    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    /// Sets the height of one work band in rows. Zero is treated as one.
    pub fn set_tile_rows(&mut self, rows: u32) {
        self.tile_rows = rows.max(1);
    }

    pub fn set_shading(&mut self, shading: ShadingMode) {
        self.shading = shading;
    }

    pub fn tile_rows(&self) -> u32 {
        self.tile_rows
    }

    pub fn shading(&self) -> ShadingMode {
        self.shading
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera access. Call [`Camera::setup`] after changing parameters.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.framebuffer.save_png(path)
    }
}

/// Scan-converts `setups` into every band of the framebuffer in parallel and
/// returns the number of shaded fragments.
fn shade_tiles<S: FragmentShader>(
    framebuffer: &mut FrameBuffer,
    tile_rows: u32,
    setups: &[TriangleSetup],
    shader: &S,
) -> usize {
    framebuffer
        .tiles_mut(tile_rows)
        .map(|mut tile| shade_tile(&mut tile, setups, shader))
        .sum()
}

fn shade_tile<S: FragmentShader>(tile: &mut Tile<'_>, setups: &[TriangleSetup], shader: &S) -> usize {
    let rows = tile.rows();
    let mut fragments = 0;

    for setup in setups {
        let bounds = setup.bounds();
        if bounds.max_y < rows.start || bounds.min_y >= rows.end {
            continue;
        }

        setup.scan(rows.clone(), |x, y| {
            let (px, py) = pixel_center(x, y);
            let (w, depth) = setup.w_and_depth(px, py);
            if tile.test_and_set(x, y, depth, || shader.shade(&setup.attributes(px, py, w))) {
                fragments += 1;
            }
        });
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Vec2, Vec3};
    use crate::render::DEPTH_CLEAR;
    use crate::scene::{Mesh, Vertex};
    use crate::texture::Texture;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    /// Two triangles covering all of clip space at depth `z`, counter-clockwise.
    fn quad(z: f32, normal: Vec3) -> Vec<Vertex> {
        [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .iter()
            .map(|&(x, y)| Vertex::new(Vec3::new(x, y, z), normal, Vec2::new(0.5, 0.5)))
            .collect()
    }

    fn quad_scene(rgb: [u8; 3]) -> Scene {
        let mut textures = HashMap::new();
        textures.insert("solid".to_string(), Texture::solid(rgb));
        Scene::new(
            quad(0.5, Vec3::new(0.0, 0.0, 1.0)),
            vec![0, 1, 2, 0, 2, 3],
            vec![Mesh::new(0, 6, "solid")],
            textures,
        )
    }

    fn identity_camera() -> Camera {
        Camera::from_view_projection(Mat4::identity())
    }

    #[test]
    fn full_quad_covers_every_pixel_once() {
        let mut rasterizer = Rasterizer::new(quad_scene([0, 255, 0]), identity_camera(), 16, 8).unwrap();
        let stats = rasterizer.rasterize_scene();

        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.triangles, 2);
        assert_eq!(stats.culled, 0);
        assert_eq!(stats.fragments, 16 * 8);

        let fb = rasterizer.framebuffer();
        assert!(fb.colors().iter().all(|&c| c == Vec3::new(0.0, 1.0, 0.0)));
        for &d in fb.depths() {
            assert_relative_eq!(d, 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn reversed_winding_is_culled() {
        let mut textures = HashMap::new();
        textures.insert("solid".to_string(), Texture::solid([255, 255, 255]));
        let scene = Scene::new(
            quad(0.5, Vec3::ZERO),
            vec![0, 2, 1, 0, 3, 2],
            vec![Mesh::new(0, 6, "solid")],
            textures,
        );

        let mut rasterizer = Rasterizer::new(scene, identity_camera(), 8, 8).unwrap();
        let stats = rasterizer.rasterize_scene();

        assert_eq!(stats.culled, 2);
        assert_eq!(stats.fragments, 0);
        assert!(rasterizer.framebuffer().depths().iter().all(|&d| d == DEPTH_CLEAR));
    }

    #[test]
    fn band_height_does_not_change_output() {
        let scene = || {
            let mut textures = HashMap::new();
            textures.insert("a".to_string(), Texture::solid([200, 10, 10]));
            textures.insert("b".to_string(), Texture::solid([10, 10, 200]));
            let mut vertices = vec![
                Vertex::new(Vec3::new(-0.9, -0.7, 0.6), Vec3::ZERO, Vec2::ZERO),
                Vertex::new(Vec3::new(0.8, -0.9, 0.2), Vec3::ZERO, Vec2::ZERO),
                Vertex::new(Vec3::new(0.1, 0.95, 0.4), Vec3::ZERO, Vec2::ZERO),
            ];
            vertices.extend([
                Vertex::new(Vec3::new(-0.95, 0.9, 0.3), Vec3::ZERO, Vec2::ZERO),
                Vertex::new(Vec3::new(-0.2, -0.95, 0.5), Vec3::ZERO, Vec2::ZERO),
                Vertex::new(Vec3::new(0.9, 0.3, 0.35), Vec3::ZERO, Vec2::ZERO),
            ]);
            Scene::new(
                vertices,
                vec![0, 1, 2, 3, 4, 5],
                vec![Mesh::new(0, 3, "a"), Mesh::new(3, 3, "b")],
                textures,
            )
        };

        let render = |rows: u32| {
            let mut rasterizer = Rasterizer::new(scene(), identity_camera(), 37, 23).unwrap();
            rasterizer.set_tile_rows(rows);
            let stats = rasterizer.rasterize_scene();
            let fb = rasterizer.framebuffer();
            (stats, fb.colors().to_vec(), fb.depths().to_vec())
        };

        let reference = render(1000);
        assert!(reference.0.fragments > 0);
        for rows in [1, 3, 7, 32] {
            assert_eq!(render(rows), reference);
        }
    }

    #[test]
    fn normal_shading_visualizes_normals() {
        let mut rasterizer = Rasterizer::new(quad_scene([0, 0, 0]), identity_camera(), 4, 4).unwrap();
        rasterizer.set_shading(ShadingMode::Normals);
        rasterizer.rasterize_scene();

        for &c in rasterizer.framebuffer().colors() {
            assert_relative_eq!(c.x, 0.5, epsilon = 1e-5);
            assert_relative_eq!(c.y, 0.5, epsilon = 1e-5);
            assert_relative_eq!(c.z, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn clear_restores_initial_state() {
        let mut rasterizer = Rasterizer::new(quad_scene([255, 0, 0]), identity_camera(), 4, 4).unwrap();
        rasterizer.rasterize_scene();
        rasterizer.clear();

        let fb = rasterizer.framebuffer();
        assert!(fb.colors().iter().all(|&c| c == Vec3::ZERO));
        assert!(fb.depths().iter().all(|&d| d == DEPTH_CLEAR));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let result = Rasterizer::new(quad_scene([0, 0, 0]), identity_camera(), 0, 10);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn config_sets_resolution_and_schedule() {
        let config = RenderConfig {
            target_width: 20,
            target_height: 10,
            tile_rows: 4,
            shading: ShadingMode::Normals,
            ..RenderConfig::default()
        };
        let rasterizer = Rasterizer::from_config(quad_scene([0, 0, 0]), &config).unwrap();

        assert_eq!(rasterizer.framebuffer().width(), 20);
        assert_eq!(rasterizer.framebuffer().height(), 10);
        assert_eq!(rasterizer.tile_rows(), 4);
        assert_eq!(rasterizer.shading(), ShadingMode::Normals);
    }
}
