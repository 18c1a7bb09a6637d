//! Orbit camera around the tree.

use crate::config::CameraConfig;
use glam::{Mat4, Vec2, Vec3};

/// Radians of orbit per dragged pixel.
const ORBIT_SENSITIVITY: f32 = 0.005;
/// Fractional distance change per wheel step.
const ZOOM_STEP: f32 = 0.1;
/// Keeps the pitch short of straight up, where `look_at` degenerates.
const MIN_POLAR: f32 = 0.01;
const NEAR_PLANE: f32 = 0.1;
/// Far enough for the star shell from any zoom level.
const FAR_PLANE: f32 = 1000.0;

/// Orbit camera. Angles are spherical: `yaw` around the vertical axis,
/// `polar` measured down from straight up.
#[derive(Debug, Clone)]
pub struct Camera {
    pub yaw: f32,
    pub polar: f32,
    pub distance: f32,
    pub target: Vec3,
    pub fov_degrees: f32,
    min_distance: f32,
    max_distance: f32,
    max_polar: f32,
    auto_rotate_speed: f32,
}

impl Camera {
    /// Place the camera at the configured eye position, looking at the
    /// origin.
    pub fn from_config(config: &CameraConfig) -> Self {
        let eye = Vec3::from_array(config.position);
        let distance = eye.length().max(1e-3);
        let mut camera = Self {
            yaw: eye.x.atan2(eye.z),
            polar: (eye.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
            target: Vec3::ZERO,
            fov_degrees: config.fov_degrees,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            max_polar: config.max_polar_angle,
            auto_rotate_speed: config.auto_rotate_speed,
        };
        camera.clamp();
        camera
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let x = self.distance * sin_p * self.yaw.sin();
        let y = self.distance * cos_p;
        let z = self.distance * sin_p * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
    }

    /// Orbit by a pixel drag delta.
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * ORBIT_SENSITIVITY;
        self.polar -= delta.y * ORBIT_SENSITIVITY;
        self.clamp();
    }

    /// Zoom by wheel steps; positive moves closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance *= 1.0 - steps * ZOOM_STEP;
        self.clamp();
    }

    /// Spin around the tree. At speed 2.0 one turn takes 30 seconds.
    pub fn auto_rotate(&mut self, dt: f32) {
        self.yaw += std::f32::consts::TAU / 60.0 * self.auto_rotate_speed * dt;
    }

    fn clamp(&mut self) {
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        self.polar = self.polar.clamp(MIN_POLAR, self.max_polar.max(MIN_POLAR));
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}
