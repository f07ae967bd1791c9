//! # Perspective Camera
//!
//! Camera math is backend-agnostic. The combined matrix is built as
//! `P × X × V`: perspective, then the Y-down clip transform, then the view.
//!
//! # Coordinate System
//! Right-handed Y-up world space. After `X`, clip space has Y pointing down
//! and Z pointing forward with depth in `[0, 1]`, so NDC maps to image rows
//! directly.

use crate::config::CameraSettings;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// 3D camera for perspective projection
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Field of view angle in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera looking at the origin with +Y up
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Camera on +Z at the configured distance
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        Self::perspective(
            Vec3::new(0.0, 0.0, settings.distance),
            settings.fov_degrees,
            aspect,
            settings.near,
            settings.far,
        )
    }

    /// Update camera aspect ratio for viewport changes
    ///
    /// Only logs when the change is larger than 0.01 to keep resize storms quiet.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// World-to-camera transform
    pub fn get_view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection for the current aspect ratio
    pub fn get_projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix: P × X × V
    ///
    /// For a single object: `Final = ViewProjection × Model × Vertex`.
    pub fn get_view_projection_matrix(&self) -> Mat4 {
        let view_matrix = self.get_view_matrix();
        let coord_transform = Mat4::y_down_clip_transform();
        let projection_matrix = self.get_projection_matrix();

        projection_matrix * coord_transform * view_matrix
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default(), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn project(camera: &Camera, point: Vec3) -> Vec3 {
        let clip = camera.get_view_projection_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::default();
        let ndc = project(&camera, Vec3::zeros());
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "Origin should be inside the depth range, got {}", ndc.z);
    }

    #[test]
    fn test_world_up_maps_to_negative_ndc_y() {
        let camera = Camera::default();
        let ndc = project(&camera, Vec3::new(0.0, 1.0, 0.0));
        assert!(ndc.y < 0.0, "Y-down clip space puts world +Y toward the top row");
    }

    #[test]
    fn test_wider_aspect_narrows_horizontal_extent() {
        let mut camera = Camera::default();
        let square = project(&camera, Vec3::new(1.0, 0.0, 0.0)).x;
        camera.set_aspect_ratio(2.0);
        let wide = project(&camera, Vec3::new(1.0, 0.0, 0.0)).x;
        assert_relative_eq!(wide, square / 2.0, epsilon = 1e-5);
    }
}
