//! Wavefront OBJ loading.
//!
//! Every OBJ object/group becomes one [`Mesh`] in a single [`Scene`]. Vertices are
//! deduplicated on their (position, normal, uv) index triple so that corners shared
//! by several faces end up as one entry in the vertex buffer.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::math::{Vec2, Vec3};
use crate::scene::{Mesh, Scene, Vertex};
use crate::texture::Texture;

/// Source indices identifying one unique vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VertexKey {
    position: u32,
    normal: Option<u32>,
    uv: Option<u32>,
}

/// Load an OBJ file (and its MTL diffuse textures) into a scene.
///
/// Texture paths are resolved relative to the OBJ file's directory. Each distinct
/// texture is decoded once. A model without a material, or whose material has no
/// diffuse texture, is an error.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let path = path.as_ref();
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        },
    )?;
    let materials = materials?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut meshes = Vec::with_capacity(models.len());
    let mut textures = HashMap::new();

    for model in &models {
        let texture_name = model
            .mesh
            .material_id
            .and_then(|id| materials.get(id))
            .and_then(|material| material.diffuse_texture.clone())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::MissingMaterial {
                model: model.name.clone(),
            })?;

        if let Entry::Vacant(slot) = textures.entry(texture_name.clone()) {
            let texture = Texture::from_file(base_dir.join(&texture_name))?;
            log::debug!(
                "decoded texture `{}` ({}x{}, {} channels)",
                texture_name,
                texture.width(),
                texture.height(),
                texture.channels()
            );
            slot.insert(texture);
        }

        let index_offset = indices.len() as u32;
        append_model(&model.mesh, &mut vertices, &mut indices);
        meshes.push(Mesh::new(
            index_offset,
            indices.len() as u32 - index_offset,
            texture_name,
        ));
    }

    log::info!(
        "loaded {}: {} meshes, {} vertices, {} triangles, {} textures",
        path.display(),
        meshes.len(),
        vertices.len(),
        indices.len() / 3,
        textures.len()
    );

    Ok(Scene::new(vertices, indices, meshes, textures))
}

/// Appends one model's triangles, reusing vertices with identical source indices.
fn append_model(mesh: &tobj::Mesh, vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>) {
    let mut unique: HashMap<VertexKey, u32> = HashMap::new();

    for (i, &position) in mesh.indices.iter().enumerate() {
        let key = VertexKey {
            position,
            normal: mesh.normal_indices.get(i).copied(),
            uv: mesh.texcoord_indices.get(i).copied(),
        };

        let index = *unique.entry(key).or_insert_with(|| {
            vertices.push(build_vertex(mesh, key));
            (vertices.len() - 1) as u32
        });
        indices.push(index);
    }
}

fn build_vertex(mesh: &tobj::Mesh, key: VertexKey) -> Vertex {
    let p = 3 * key.position as usize;
    let position = Vec3::new(
        mesh.positions[p],
        mesh.positions[p + 1],
        mesh.positions[p + 2],
    );

    let normal = key.normal.map_or(Vec3::ZERO, |n| {
        let n = 3 * n as usize;
        Vec3::new(mesh.normals[n], mesh.normals[n + 1], mesh.normals[n + 2])
    });

    // Flip V to a top-left texture origin.
    let uv = key.uv.map_or(Vec2::ZERO, |t| {
        let t = 2 * t as usize;
        Vec2::new(
            mesh.texcoords[t].abs(),
            (1.0 - mesh.texcoords[t + 1]).abs(),
        )
    });

    Vertex::new(position, normal, uv)
}
