//! Render configuration.
//!
//! [`RenderConfig`] replaces the compile-time resolution and camera constants: it is
//! built in code or read from a RON document, validated once, and handed to
//! [`Camera::from_config`](crate::camera::Camera::from_config) and
//! [`Rasterizer::from_config`](crate::render::Rasterizer::from_config).
//!
//! ```text
//! (
//!     target_width: 1920,
//!     target_height: 1080,
//!     eye_position: (x: 0.0, y: 5.0, z: 10.0),
//!     field_of_view: 45.0,
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::Vec3;

/// Fragment stage selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    /// Nearest-neighbor texture lookup (the default).
    #[default]
    Texture,
    /// Interpolated normal remapped to `[0, 1]`, for debugging geometry.
    Normals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub target_width: u32,
    pub target_height: u32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub eye_position: Vec3,
    pub look_target: Vec3,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    /// Height in pixel rows of one band of the framebuffer owned by a worker.
    pub tile_rows: u32,
    pub shading: ShadingMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_width: 1280,
            target_height: 720,
            near_plane: 0.1,
            far_plane: 100.0,
            eye_position: Vec3::new(0.0, 3.75, 6.5),
            look_target: Vec3::ZERO,
            field_of_view: 30.0,
            tile_rows: 32,
            shading: ShadingMode::Texture,
        }
    }
}

impl RenderConfig {
    /// Parse a configuration from RON text. Missing fields take their defaults.
    pub fn from_ron_str(s: &str) -> Result<Self> {
        let config: RenderConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "resolution {}x{} must be non-zero",
                self.target_width, self.target_height
            )));
        }
        if !(self.near_plane > 0.0 && self.far_plane > self.near_plane) {
            return Err(Error::InvalidConfig(format!(
                "clip planes must satisfy 0 < near ({}) < far ({})",
                self.near_plane, self.far_plane
            )));
        }
        if !(self.field_of_view > 0.0 && self.field_of_view < 180.0) {
            return Err(Error::InvalidConfig(format!(
                "field of view {} is outside (0, 180) degrees",
                self.field_of_view
            )));
        }
        if self.tile_rows == 0 {
            return Err(Error::InvalidConfig("tile_rows must be at least 1".into()));
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.target_width as f32 / self.target_height as f32
    }
}
