//! Cameras and scene presets.

use crate::model::entities::LayerId;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A source camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: DVec3,
    pub target: DVec3,
    #[serde(default = "default_up")]
    pub up: DVec3,
    /// Field of view in degrees. `None` marks an orthographic camera.
    #[serde(default)]
    pub fov: Option<f64>,
    /// Fixed aspect ratio. `None` follows the viewport.
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
}

fn default_up() -> DVec3 {
    DVec3::Z
}

impl Camera {
    pub fn perspective(position: DVec3, target: DVec3, fov: f64) -> Self {
        Self {
            position,
            target,
            up: DVec3::Z,
            fov: Some(fov),
            aspect_ratio: None,
        }
    }

    pub fn orthographic(position: DVec3, target: DVec3) -> Self {
        Self {
            position,
            target,
            up: DVec3::Z,
            fov: None,
            aspect_ratio: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }
}

/// A named view preset: a camera plus the layers it hides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePreset {
    pub name: String,
    pub camera: Camera,
    #[serde(default)]
    pub hidden_layers: Vec<LayerId>,
}

impl ScenePreset {
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
            hidden_layers: Vec::new(),
        }
    }

    pub fn hiding(mut self, layer: impl Into<String>) -> Self {
        self.hidden_layers.push(LayerId::new(layer));
        self
    }
}
