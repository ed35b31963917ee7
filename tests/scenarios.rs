use std::collections::HashMap;

use approx::assert_relative_eq;
use softrast::math::{Mat4, Vec2, Vec3, Vec4};
use softrast::render::{TriangleSetup, DEPTH_CLEAR};
use softrast::{Camera, Error, Mesh, Rasterizer, Scene, Texture, Vertex};

/// Object position that the identity camera maps onto raster point `(rx, ry)`.
fn at(rx: f32, ry: f32, z: f32, width: u32, height: u32) -> Vec3 {
    Vec3::new(
        2.0 * rx / width as f32 - 1.0,
        1.0 - 2.0 * ry / height as f32,
        z,
    )
}

fn vertex(position: Vec3) -> Vertex {
    Vertex::new(position, Vec3::new(0.0, 0.0, 1.0), Vec2::new(0.5, 0.5))
}

fn identity_camera() -> Camera {
    Camera::from_view_projection(Mat4::identity())
}

fn solid_textures(entries: &[(&str, [u8; 3])]) -> HashMap<String, Texture> {
    entries
        .iter()
        .map(|&(name, rgb)| (name.to_string(), Texture::solid(rgb)))
        .collect()
}

fn rgb(c: [u8; 3]) -> Vec3 {
    Vec3::new(c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0)
}

#[test]
fn only_pixels_passing_inside_tests_are_written() {
    let (w, h) = (24, 18);
    let positions = [
        at(2.3, 15.1, 0.4, w, h),
        at(21.7, 12.2, 0.4, w, h),
        at(9.4, 1.6, 0.4, w, h),
    ];
    let scene = Scene::new(
        positions.iter().copied().map(vertex).collect(),
        vec![0, 1, 2],
        vec![Mesh::new(0, 3, "white")],
        solid_textures(&[("white", [255, 255, 255])]),
    );

    let mut rasterizer = Rasterizer::new(scene, identity_camera(), w, h).unwrap();
    let stats = rasterizer.rasterize_scene();

    let setup = TriangleSetup::new(
        positions.map(|p| Vec4::from_vec3(p, 1.0)),
        [Vec3::ZERO; 3],
        [Vec2::ZERO; 3],
        w,
        h,
    )
    .unwrap();

    let mut scanned = vec![false; (w * h) as usize];
    setup.scan(0..h, |x, y| scanned[(y * w + x) as usize] = true);

    let fb = rasterizer.framebuffer();
    let mut covered = 0;
    for y in 0..h {
        for x in 0..w {
            let written = fb.depth(x, y) != Some(DEPTH_CLEAR);
            assert_eq!(written, scanned[(y * w + x) as usize], "pixel ({}, {})", x, y);

            // Away from the edges the incremental walk and direct evaluation agree.
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let margin = setup
                .edges()
                .iter()
                .map(|e| e.eval(px, py).abs())
                .fold(f32::INFINITY, f32::min);
            if margin > 1e-3 {
                assert_eq!(written, setup.covers(x, y), "pixel ({}, {})", x, y);
            }

            if written {
                covered += 1;
                assert_eq!(fb.color(x, y), Some(Vec3::ONE));
            } else {
                assert_eq!(fb.color(x, y), Some(Vec3::ZERO));
            }
        }
    }
    assert!(covered > 0);
    assert_eq!(stats.fragments, covered);
}

#[test]
fn nearer_triangle_wins_in_either_draw_order() {
    let (w, h) = (16, 16);
    let near = [0, 200, 0];
    let far = [200, 0, 0];

    let quad = |z: f32| {
        vec![
            vertex(at(0.0, 16.0, z, w, h)),
            vertex(at(16.0, 16.0, z, w, h)),
            vertex(at(16.0, 0.0, z, w, h)),
            vertex(at(0.0, 0.0, z, w, h)),
        ]
    };

    for near_first in [true, false] {
        let mut vertices = quad(0.2);
        vertices.extend(quad(0.7));
        let near_mesh = Mesh::new(0, 6, "near");
        let far_mesh = Mesh::new(6, 6, "far");
        let meshes = if near_first {
            vec![near_mesh, far_mesh]
        } else {
            vec![far_mesh, near_mesh]
        };

        let scene = Scene::new(
            vertices,
            vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7],
            meshes,
            solid_textures(&[("near", near), ("far", far)]),
        );

        let mut rasterizer = Rasterizer::new(scene, identity_camera(), w, h).unwrap();
        rasterizer.rasterize_scene();

        let fb = rasterizer.framebuffer();
        for y in 0..h {
            for x in 0..w {
                assert_eq!(fb.color(x, y), Some(rgb(near)));
                assert_relative_eq!(fb.depth(x, y).unwrap(), 0.2, epsilon = 1e-5);
            }
        }
    }
}

#[test]
fn full_viewport_square_is_uniform() {
    let (w, h) = (64, 48);
    let texel = [37, 142, 250];
    let vertices = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
        .iter()
        .map(|&(x, y)| vertex(Vec3::new(x, y, 0.5)))
        .collect();
    let scene = Scene::new(
        vertices,
        vec![0, 1, 2, 0, 2, 3],
        vec![Mesh::new(0, 6, "texel")],
        solid_textures(&[("texel", texel)]),
    );

    let mut rasterizer = Rasterizer::new(scene, identity_camera(), w, h).unwrap();
    let stats = rasterizer.rasterize_scene();
    assert_eq!(stats.fragments, (w * h) as usize);

    let fb = rasterizer.framebuffer();
    assert!(fb.colors().iter().all(|&c| c == rgb(texel)));
    for &depth in fb.depths() {
        assert_relative_eq!(depth, 0.5, epsilon = 1e-5);
    }
}

#[test]
fn empty_scene_leaves_buffers_untouched() {
    let mut rasterizer = Rasterizer::new(Scene::empty(), identity_camera(), 10, 10).unwrap();
    let stats = rasterizer.rasterize_scene();

    assert_eq!(stats.meshes, 0);
    assert_eq!(stats.fragments, 0);
    let fb = rasterizer.framebuffer();
    assert!(fb.colors().iter().all(|&c| c == Vec3::ZERO));
    assert!(fb.depths().iter().all(|&d| d == DEPTH_CLEAR));
}

#[test]
fn shared_edge_is_covered_exactly_once() {
    let (w, h) = (8, 8);
    // The diagonal x + y = 8 passes through the centers of pixels with x + y = 7.
    let corners = [
        at(0.0, 0.0, 0.5, w, h),
        at(0.0, 8.0, 0.5, w, h),
        at(8.0, 0.0, 0.5, w, h),
        at(8.0, 8.0, 0.5, w, h),
    ];
    let triangles = [[0, 1, 2], [2, 1, 3]];

    let mut coverage = vec![0u32; (w * h) as usize];
    for tri in triangles {
        let setup = TriangleSetup::new(
            tri.map(|i| Vec4::from_vec3(corners[i], 1.0)),
            [Vec3::ZERO; 3],
            [Vec2::ZERO; 3],
            w,
            h,
        )
        .unwrap();
        setup.scan(0..h, |x, y| coverage[(y * w + x) as usize] += 1);
    }
    assert!(coverage.iter().all(|&n| n == 1), "{:?}", coverage);

    let scene = Scene::new(
        corners.iter().copied().map(vertex).collect(),
        vec![0, 1, 2, 2, 1, 3],
        vec![Mesh::new(0, 6, "white")],
        solid_textures(&[("white", [255, 255, 255])]),
    );
    let mut rasterizer = Rasterizer::new(scene, identity_camera(), w, h).unwrap();
    let stats = rasterizer.rasterize_scene();
    assert_eq!(stats.fragments, (w * h) as usize);
}

#[test]
fn triangle_behind_eye_is_skipped() {
    let camera = Camera::new(0.1, 100.0, Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 60.0, 1.0);
    let vertices = vec![
        vertex(Vec3::new(-1.0, -1.0, 10.0)),
        vertex(Vec3::new(1.0, -1.0, 0.0)),
        vertex(Vec3::new(0.0, 1.0, 0.0)),
    ];
    let scene = Scene::new(
        vertices,
        vec![0, 1, 2],
        vec![Mesh::new(0, 3, "white")],
        solid_textures(&[("white", [255, 255, 255])]),
    );

    let mut rasterizer = Rasterizer::new(scene, camera, 32, 32).unwrap();
    let stats = rasterizer.rasterize_scene();
    assert_eq!(stats.culled, 1);
    assert!(rasterizer.framebuffer().depths().iter().all(|&d| d == DEPTH_CLEAR));
}

#[test]
fn out_of_range_index_is_rejected() {
    let scene = Scene::new(
        vec![vertex(Vec3::ZERO); 3],
        vec![0, 1, 3],
        vec![Mesh::new(0, 3, "white")],
        solid_textures(&[("white", [255, 255, 255])]),
    );

    match Rasterizer::new(scene, identity_camera(), 4, 4) {
        Err(Error::InvalidMeshData { mesh, index, vertex_count }) => {
            assert_eq!((mesh, index, vertex_count), (0, 3, 3));
        }
        other => panic!("expected InvalidMeshData, got {:?}", other.err()),
    }
}

#[test]
fn unknown_texture_is_rejected() {
    let scene = Scene::new(
        vec![vertex(Vec3::ZERO); 3],
        vec![0, 1, 2],
        vec![Mesh::new(0, 3, "brick")],
        solid_textures(&[("white", [255, 255, 255])]),
    );

    match Rasterizer::new(scene, identity_camera(), 4, 4) {
        Err(Error::MissingTexture { mesh, name }) => {
            assert_eq!(mesh, 0);
            assert_eq!(name, "brick");
        }
        other => panic!("expected MissingTexture, got {:?}", other.err()),
    }
}
