//! # First-Person Camera
//!
//! Camera state for a free-flying viewer: a position plus yaw
//! (`horizontal_angle`) and pitch (`vertical_angle`) in radians. Direction,
//! right and up vectors are derived from the angles on demand.
//!
//! ## Conventions
//! - Right-handed, Y-up world space
//! - Yaw 0 / pitch 0 looks down +Z
//! - Projection uses OpenGL clip space (depth in -1..1)

use crate::core::config::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// First-person perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Position in world space
    pub position: Vec3,
    /// Yaw in radians
    pub horizontal_angle: f32,
    /// Pitch in radians
    pub vertical_angle: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Viewport width / height
    pub aspect: f32,
    /// Distance to the near clipping plane
    pub near: f32,
    /// Distance to the far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a camera from configuration and a viewport aspect ratio
    ///
    /// # Arguments
    /// * `config` - Starting pose, field of view and clip planes
    /// * `aspect` - Viewport width divided by height
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from(config.position),
            horizontal_angle: config.horizontal_angle,
            vertical_angle: config.vertical_angle,
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// Update the aspect ratio from a viewport size
    ///
    /// A zero-sized viewport (minimised window) keeps the previous ratio.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        log::trace!("Camera aspect ratio updated to {}", self.aspect);
    }

    /// Unit vector the camera looks along
    pub fn direction(&self) -> Vec3 {
        let (h, v) = (self.horizontal_angle, self.vertical_angle);
        Vec3::new(v.cos() * h.sin(), v.sin(), v.cos() * h.cos())
    }

    /// Unit vector to the camera's right, always horizontal
    pub fn right(&self) -> Vec3 {
        let h = self.horizontal_angle - std::f32::consts::FRAC_PI_2;
        Vec3::new(h.sin(), 0.0, h.cos())
    }

    /// Camera up vector, perpendicular to direction and right
    pub fn up(&self) -> Vec3 {
        self.right().cross(&self.direction())
    }

    /// World-to-view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.direction(), self.up())
    }

    /// View-to-clip transform
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(self.fov_degrees), self.aspect, self.near, self.far)
    }

    /// Projection × view
    ///
    /// Multiply by a model matrix on the right to get the `MVP` uniform.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
