//! A CPU-only triangle rasterizer.
//!
//! Scenes of indexed, textured triangle meshes are transformed by a camera and
//! scan-converted with homogeneous edge functions into a color framebuffer and a
//! depth buffer. No GPU is involved at any stage.
//!
//! # Quick Start
//!
//! ```ignore
//! use softrast::prelude::*;
//!
//! let config = RenderConfig::default();
//! let scene = load_obj("assets/model.obj")?;
//! let mut rasterizer = Rasterizer::from_config(scene, &config)?;
//! rasterizer.rasterize_scene();
//! rasterizer.save_png("render.png")?;
//! ```

pub mod camera;
pub mod config;
pub mod error;
pub mod math;
pub mod obj;
pub mod render;
pub mod scene;
pub mod texture;

pub use camera::Camera;
pub use config::{RenderConfig, ShadingMode};
pub use error::{Error, Result};
pub use obj::load_obj;
pub use render::{DrawStats, FrameBuffer, Rasterizer};
pub use scene::{Mesh, Scene, Vertex};
pub use texture::Texture;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use softrast::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::config::{RenderConfig, ShadingMode};
    pub use crate::error::{Error, Result};
    pub use crate::obj::load_obj;
    pub use crate::scene::{Mesh, Scene, Vertex};
    pub use crate::texture::Texture;

    // Math
    pub use crate::math::{Mat4, Vec2, Vec3, Vec4};

    // Rendering
    pub use crate::render::{DrawStats, FragmentShader, FrameBuffer, Rasterizer};
}
