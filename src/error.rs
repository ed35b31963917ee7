//! Error type shared by scene loading, validation and configuration.
//!
//! Every variant is terminal for the operation that produced it; nothing in the
//! pipeline retries or recovers a partial scene.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("mesh {mesh}: index {index} is out of range for {vertex_count} vertices")]
    InvalidMeshData {
        mesh: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh {mesh}: index range {offset}..{offset}+{count} is not a triangle list within {index_count} indices")]
    MalformedMesh {
        mesh: usize,
        offset: u32,
        count: u32,
        index_count: usize,
    },

    #[error("mesh {mesh} references texture `{name}` which is not loaded")]
    MissingTexture { mesh: usize, name: String },

    #[error("model `{model}` has no material with a diffuse texture")]
    MissingMaterial { model: String },

    #[error("texture {width}x{height} with {channels} channels cannot hold {len} bytes")]
    InvalidTexture {
        width: u32,
        height: u32,
        channels: u32,
        len: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("failed to parse configuration: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
