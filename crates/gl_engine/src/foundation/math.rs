//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics. Matrices follow OpenGL
//! conventions: right-handed view space, clip-space depth in `[-1, 1]`,
//! column-major storage.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Common math utilities
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        value.max(min).min(max)
    }
}

/// Extension trait for Mat4 with OpenGL-convention constructors
pub trait Mat4Ext {
    /// Perspective projection; `fov_y` in radians
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Translation-only model matrix
    fn translation(offset: Vec3) -> Mat4;

    /// Column-major copy of the matrix, ready for a `mat4` uniform upload
    fn to_column_array(&self) -> [f32; 16];
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn translation(offset: Vec3) -> Mat4 {
        Mat4::new_translation(&offset)
    }

    fn to_column_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.as_slice());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translation_moves_points() {
        let m = Mat4::translation(Vec3::new(5.0, 0.0, 0.0));
        let p = m * Vec4::new(1.0, 2.0, 3.0, 1.0);
        assert_relative_eq!(p, Vec4::new(6.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_column_array_layout() {
        let m = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        let cols = m.to_column_array();
        // Translation lives in the fourth column.
        assert_relative_eq!(cols[12], 1.0);
        assert_relative_eq!(cols[13], 2.0);
        assert_relative_eq!(cols[14], 3.0);
        assert_relative_eq!(cols[15], 1.0);
    }

    #[test]
    fn test_look_at_puts_target_on_negative_z() {
        let view = Mat4::look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), Vec3::y());
        let p = view * Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = Mat4::perspective(utils::deg_to_rad(45.0), 4.0 / 3.0, 0.1, 100.0);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }
}
