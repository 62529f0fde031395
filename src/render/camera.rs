use glam::{Mat4, Vec3, vec3};

use crate::common::settings::CameraSettings;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    // degrees
    fov_y: f32,
    near: f32,
    far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Self::DEFAULT_POSITION,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl From<CameraSettings> for Camera {
    fn from(settings: CameraSettings) -> Self {
        Self {
            eye: Vec3::from_array(settings.eye),
            fov_y: settings.fov_y_degrees,
            near: settings.near,
            far: settings.far,
            ..Default::default()
        }
    }
}

impl Camera {
    pub const DEFAULT_POSITION: Vec3 = vec3(5.0, 5.0, 5.0);

    pub fn get_view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn build_projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect_ratio, self.near, self.far)
    }

    /// Unit vector from the target towards the eye.
    pub fn view_direction(&self) -> Vec3 {
        (self.eye - self.target).normalize()
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }
}
