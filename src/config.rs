//! Runtime configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "particle_count": 8000,
//!   "seed": 7,
//!   "render": { "bloom_intensity": 1.5 }
//! }
//! ```
//!
//! The morph ease rates are fixed constants in [`crate::morph`] and cannot be
//! configured.

use crate::error::ConfigError;
use crate::field::DEFAULT_PARTICLE_COUNT;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TinselConfig {
    /// Number of particles in the field.
    pub particle_count: u32,
    /// Fixed seed for field generation. `None` uses fresh randomness.
    pub seed: Option<u64>,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub stars: StarsConfig,
    pub detection: DetectionConfig,
}

impl Default for TinselConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            seed: None,
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
            stars: StarsConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tinsel".into(),
            width: 1280,
            height: 720,
        }
    }
}

/// Orbit camera limits and motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Initial eye position.
    pub position: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle from straight up the camera may reach, in radians.
    pub max_polar_angle: f32,
    /// Auto-rotation speed while assembled. 2.0 is one turn per 30 s.
    pub auto_rotate_speed: f32,
    /// Vertical offset applied to the whole tree.
    pub tree_offset_y: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            position: [0.0, 1.0, 14.0],
            min_distance: 8.0,
            max_distance: 25.0,
            max_polar_angle: std::f32::consts::PI / 1.7,
            auto_rotate_speed: 0.8,
            tree_offset_y: -1.0,
        }
    }
}

/// Background star shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarsConfig {
    pub enabled: bool,
    pub count: u32,
    /// Inner radius of the shell.
    pub radius: f32,
    /// Shell thickness outward from `radius`.
    pub depth: f32,
    /// Size multiplier.
    pub factor: f32,
    /// Hue saturation in [0, 1].
    pub saturation: f32,
    /// Twinkle speed relative to wall time.
    pub speed: f32,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 6000,
            radius: 100.0,
            depth: 60.0,
            factor: 4.0,
            saturation: 1.0,
            speed: 0.5,
        }
    }
}

/// Post-processing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Clear color as `#rrggbb`.
    pub background: String,
    pub exposure: f32,
    pub bloom_threshold: f32,
    pub bloom_intensity: f32,
    pub bloom_radius: f32,
    pub grain: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: "#000904".into(),
            exposure: 1.2,
            bloom_threshold: 0.4,
            bloom_intensity: 2.0,
            bloom_radius: 0.5,
            grain: 0.03,
            vignette_offset: 0.1,
            vignette_darkness: 1.2,
        }
    }
}

impl RenderConfig {
    /// Background as linear-ish RGB in [0, 1]. Falls back to black if the
    /// string does not parse; [`TinselConfig::validate`] rejects that case.
    pub fn background_rgb(&self) -> Vec3 {
        parse_hex_color(&self.background).unwrap_or(Vec3::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Milliseconds between landmark detections.
    pub frame_interval_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { frame_interval_ms: 16 }
    }
}

impl DetectionConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl TinselConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::Invalid("particle_count must be at least 1".into()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees {} must be in (0, 180)",
                cam.fov_degrees
            )));
        }
        if !(cam.min_distance > 0.0 && cam.min_distance <= cam.max_distance) {
            return Err(ConfigError::Invalid(format!(
                "camera distance range [{}, {}] is invalid",
                cam.min_distance, cam.max_distance
            )));
        }
        if parse_hex_color(&self.render.background).is_none() {
            return Err(ConfigError::Invalid(format!(
                "background {:?} is not a #rrggbb color",
                self.render.background
            )));
        }
        if !(self.render.exposure > 0.0) {
            return Err(ConfigError::Invalid("exposure must be positive".into()));
        }
        let stars = &self.stars;
        if !(stars.radius > 0.0 && stars.depth >= 0.0 && stars.factor >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "star shell radius {} depth {} factor {} is invalid",
                stars.radius, stars.depth, stars.factor
            )));
        }
        if !(0.0..=1.0).contains(&stars.saturation) {
            return Err(ConfigError::Invalid("star saturation must be in [0, 1]".into()));
        }
        Ok(())
    }

    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_background(mut self, hex: impl Into<String>) -> Self {
        self.render.background = hex.into();
        self
    }

    pub fn with_detection_interval(mut self, interval: Duration) -> Self {
        self.detection.frame_interval_ms = interval.as_millis() as u64;
        self
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<Vec3> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    Some(crate::field::palette::hex(value))
}
