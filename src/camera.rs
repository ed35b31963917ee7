//! Look-at perspective camera.
//!
//! # Coordinate System
//!
//! Uses a **right-handed** coordinate system:
//! - X: positive right
//! - Y: positive up
//! - The camera looks down its local -Z axis
//!
//! Clip-space depth ends up in `[0, w]`, so after interpolation the depth buffer
//! holds values in `[0, 1]` for geometry between the near and far planes.
//!
//! # Caching
//!
//! The combined view-projection matrix is computed by [`Camera::setup`] and cached.
//! Setters only record parameters; nothing is recomputed lazily.

use crate::config::RenderConfig;
use crate::math::{Mat4, Vec3};

#[derive(Debug, Clone)]
pub struct Camera {
    near_plane: f32,
    far_plane: f32,
    eye: Vec3,
    target: Vec3,
    /// Vertical field of view in degrees.
    field_of_view: f32,
    aspect_ratio: f32,

    view_projection: Mat4,
}

impl Camera {
    /// Creates a camera and computes its view-projection matrix.
    pub fn new(
        near_plane: f32,
        far_plane: f32,
        eye: Vec3,
        target: Vec3,
        field_of_view: f32,
        aspect_ratio: f32,
    ) -> Self {
        let mut camera = Self {
            near_plane,
            far_plane,
            eye,
            target,
            field_of_view,
            aspect_ratio,
            view_projection: Mat4::identity(),
        };
        camera.setup();
        camera
    }

    /// Creates the camera described by a render configuration.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(
            config.near_plane,
            config.far_plane,
            config.eye_position,
            config.look_target,
            config.field_of_view,
            config.aspect_ratio(),
        )
    }

    /// Wraps an explicit view-projection matrix.
    ///
    /// The stored parameters are left at their defaults and are not consistent with
    /// the matrix; calling [`setup`](Self::setup) replaces it.
    pub fn from_view_projection(view_projection: Mat4) -> Self {
        let mut camera = Self::from_config(&RenderConfig::default());
        camera.view_projection = view_projection;
        camera
    }

    pub fn set_near_plane(&mut self, value: f32) {
        self.near_plane = value;
    }

    pub fn set_far_plane(&mut self, value: f32) {
        self.far_plane = value;
    }

    pub fn set_eye_position(&mut self, position: Vec3) {
        self.eye = position;
    }

    pub fn set_look_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Sets the vertical field of view in degrees.
    pub fn set_field_of_view(&mut self, degrees: f32) {
        self.field_of_view = degrees;
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Recomputes the cached view-projection matrix from the current parameters.
    pub fn setup(&mut self) {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::UP);
        let projection = Mat4::perspective_rh_zo(
            self.field_of_view.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        );
        self.view_projection = projection * view;
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn eye_position(&self) -> Vec3 {
        self.eye
    }

    pub fn look_target(&self) -> Vec3 {
        self.target
    }

    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}
