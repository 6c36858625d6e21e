//! # Config — Viewer Settings from JSON
//!
//! Every field has a default, so an empty object (or no file at all) gives
//! the stock viewer: an 800×600 window, a 75° camera at (1, 1, 3) facing -Z
//! (no target), shadows off, pixel ratio capped at 2.
//!
//! ```json
//! {
//!   "window": { "title": "shadows", "width": 1280, "height": 720 },
//!   "clear_color": [0.05, 0.05, 0.08],
//!   "shadows": { "enabled": true, "filter": "pcf_soft" },
//!   "camera": { "fov": 60, "position": [0, 2, 6], "target": [0, 0, 0] },
//!   "orbit": { "damping": 0.1 },
//!   "log_filter": "lykta=debug"
//! }
//! ```
//!
//! Values are checked by [`ViewerConfig::validate`], which `load` and
//! `from_json_str` call, with the same rules the setters they feed use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::controls::OrbitControls;
use crate::error::{Error, Result};
use crate::math::{Color, Vec3};
use crate::render::ShadowFilter;
use crate::surface::{self, DEFAULT_MAX_PIXEL_RATIO};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "lykta".into(), width: 800, height: 600 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub enabled: bool,
    pub filter: ShadowFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Point the camera is turned toward at startup. Unset leaves the
    /// camera facing -Z.
    pub target: Option<[f32; 3]>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [1.0, 1.0, 3.0],
            target: None,
        }
    }
}

impl CameraConfig {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn target(&self) -> Option<Vec3> {
        self.target.map(Vec3::from_array)
    }

    /// What orbit controls circle around: the target, or the origin.
    pub fn focus(&self) -> Vec3 {
        self.target().unwrap_or(Vec3::ZERO)
    }

    /// A perspective camera with this config and the given aspect.
    pub fn build(&self, aspect: f32) -> Result<Camera> {
        Camera::perspective(self.fov, aspect, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.5,
            max_distance: 50.0,
        }
    }
}

impl OrbitConfig {
    pub fn build(&self, target: Vec3) -> Result<OrbitControls> {
        let mut orbit = OrbitControls::new(target).with_damping(self.damping)?;
        orbit.set_distance_limits(self.min_distance, self.max_distance)?;
        orbit.rotate_speed = self.rotate_speed;
        orbit.zoom_speed = self.zoom_speed;
        Ok(orbit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    /// Ceiling for the device pixel ratio.
    pub max_pixel_ratio: f32,
    pub clear_color: Color,
    pub shadows: ShadowConfig,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    /// `env_logger` filter string. `RUST_LOG` is used when absent.
    pub log_filter: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
            clear_color: Color::BLACK,
            shadows: ShadowConfig::default(),
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            log_filter: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        log::info!("loaded viewer config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        surface::validate_size(self.window.width, self.window.height)?;
        surface::validate_ratio(self.max_pixel_ratio)?;
        self.camera.build(self.window.width as f32 / self.window.height as f32)?;
        self.orbit.build(self.camera.focus())?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
