//! Scene data model: one shared vertex buffer, one shared index buffer, the meshes
//! that slice it, and the textures they reference by name.
//!
//! A [`Scene`] is move-only. Its textures live exactly as long as the scene, and
//! handing it to a [`Rasterizer`](crate::render::Rasterizer) transfers ownership.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::math::{Vec2, Vec3};
use crate::texture::Texture;

/// Object-space vertex attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub const fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A triangle list inside the shared index buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mesh {
    /// Offset into the shared index buffer.
    pub index_offset: u32,
    /// Number of indices; always a multiple of 3.
    pub index_count: u32,
    /// Key into the scene's texture table.
    pub texture: String,
}

impl Mesh {
    pub fn new(index_offset: u32, index_count: u32, texture: impl Into<String>) -> Self {
        Self {
            index_offset,
            index_count,
            texture: texture.into(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count as usize / 3
    }

    fn index_range(&self) -> std::ops::Range<usize> {
        let start = self.index_offset as usize;
        start..start + self.index_count as usize
    }
}

pub struct Scene {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    meshes: Vec<Mesh>,
    textures: HashMap<String, Texture>,
}

impl Scene {
    pub fn new(
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        meshes: Vec<Mesh>,
        textures: HashMap<String, Texture>,
    ) -> Self {
        Self {
            vertices,
            indices,
            meshes,
            textures,
        }
    }

    /// A scene with no geometry.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), HashMap::new())
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    /// Index triple of triangle `triangle` of `mesh`.
    ///
    /// Only meaningful on a validated scene.
    #[inline]
    pub(crate) fn triangle_indices(&self, mesh: &Mesh, triangle: usize) -> [usize; 3] {
        let base = mesh.index_offset as usize + triangle * 3;
        [
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        ]
    }

    /// Checks every precondition the rasterizer relies on.
    ///
    /// - each mesh range lies inside the index buffer and holds whole triangles
    /// - each referenced index is smaller than the vertex count
    /// - each mesh's texture key is present in the texture table
    pub fn validate(&self) -> Result<()> {
        for (mesh_idx, mesh) in self.meshes.iter().enumerate() {
            let range = mesh.index_range();
            if mesh.index_count % 3 != 0 || range.end > self.indices.len() {
                return Err(Error::MalformedMesh {
                    mesh: mesh_idx,
                    offset: mesh.index_offset,
                    count: mesh.index_count,
                    index_count: self.indices.len(),
                });
            }

            if let Some(&index) = self.indices[range]
                .iter()
                .find(|&&i| i as usize >= self.vertices.len())
            {
                return Err(Error::InvalidMeshData {
                    mesh: mesh_idx,
                    index,
                    vertex_count: self.vertices.len(),
                });
            }

            if !self.textures.contains_key(&mesh.texture) {
                return Err(Error::MissingTexture {
                    mesh: mesh_idx,
                    name: mesh.texture.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::empty()
    }
}
