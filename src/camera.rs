use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Camera shared between the session and running focus animations.
pub type SharedCamera = Arc<RwLock<Camera>>;

/// Perspective camera looking at `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 8.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_degrees.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        )
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World-space ray through a point in normalized device coordinates.
    ///
    /// Returns the ray origin on the near plane and its unit direction.
    pub fn ray_through(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let inverse = self.view_proj().inverse();
        let near = inverse.project_point3(ndc.extend(-1.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let direction = (far - near).normalize_or_zero();
        (near, direction)
    }
}

/// Camera position used when focusing on a part group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFocusTarget {
    pub name: String,
    pub position: Vec3,
}

impl CameraFocusTarget {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}
