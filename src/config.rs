//! Configuration loading

use std::fs;
use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use log::info;
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, CameraFocusTarget};
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::registry::PartCategory;

/// Tunables of a configurator session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguratorConfig {
    /// How long a clicked part stays highlighted
    #[serde(default = "default_duration_ms")]
    pub highlight_duration_ms: u64,
    /// How long the camera takes to reach a focus target
    #[serde(default = "default_duration_ms")]
    pub focus_duration_ms: u64,
    /// Emissive color applied to a clicked part
    #[serde(default = "default_highlight_color")]
    pub highlight_color: Vec3,
    /// Base color shown under a texture
    #[serde(default = "default_white")]
    pub neutral_texture_color: Vec3,
    /// Color of every category after load and reset
    #[serde(default = "default_white")]
    pub default_color: Vec3,
    /// Point the camera keeps looking at
    #[serde(default)]
    pub focus_pivot: Vec3,
    #[serde(default = "default_camera_position")]
    pub camera_position: Vec3,
    #[serde(default = "default_fov")]
    pub camera_fov_degrees: f32,
    #[serde(default = "default_groups")]
    pub groups: Vec<HighlightGroup>,
}

/// Materials that react to clicks, and where the camera goes for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightGroup {
    pub category: PartCategory,
    pub materials: Vec<String>,
    pub focus: Vec3,
}

impl HighlightGroup {
    pub fn contains(&self, identity: &str) -> bool {
        self.materials.iter().any(|material| material == identity)
    }

    pub fn focus_target(&self) -> CameraFocusTarget {
        CameraFocusTarget::new(self.category.as_str(), self.focus)
    }
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            highlight_duration_ms: default_duration_ms(),
            focus_duration_ms: default_duration_ms(),
            highlight_color: default_highlight_color(),
            neutral_texture_color: default_white(),
            default_color: default_white(),
            focus_pivot: Vec3::ZERO,
            camera_position: default_camera_position(),
            camera_fov_degrees: default_fov(),
            groups: default_groups(),
        }
    }
}

impl ConfiguratorConfig {
    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfiguratorResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfiguratorError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| {
            ConfiguratorError::ConfigParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_duration_ms)
    }

    pub fn focus_duration(&self) -> Duration {
        Duration::from_millis(self.focus_duration_ms)
    }

    /// Group whose material list contains `identity`.
    pub fn group_for(&self, identity: &str) -> Option<&HighlightGroup> {
        self.groups.iter().find(|group| group.contains(identity))
    }

    pub fn initial_camera(&self) -> Camera {
        Camera {
            position: self.camera_position,
            target: self.focus_pivot,
            fov_degrees: self.camera_fov_degrees,
            ..Camera::default()
        }
    }
}

fn default_duration_ms() -> u64 {
    500
}

fn default_highlight_color() -> Vec3 {
    Vec3::splat(0x55 as f32 / 255.0)
}

fn default_white() -> Vec3 {
    Vec3::ONE
}

fn default_camera_position() -> Vec3 {
    Vec3::new(0.0, 2.0, 8.0)
}

fn default_fov() -> f32 {
    75.0
}

fn default_groups() -> Vec<HighlightGroup> {
    vec![
        HighlightGroup {
            category: PartCategory::Laces,
            materials: vec!["mat_laces".to_string()],
            focus: Vec3::new(0.0, 3.0, 4.0),
        },
        HighlightGroup {
            category: PartCategory::Sole,
            materials: vec!["mat_sole".to_string()],
            focus: Vec3::new(0.0, -2.0, 6.0),
        },
        HighlightGroup {
            category: PartCategory::Outside,
            materials: (1..=3).map(|i| format!("mat_outside_{i}")).collect(),
            focus: Vec3::new(5.0, 2.0, 5.0),
        },
    ]
}
