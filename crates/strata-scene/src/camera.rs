//! Camera payloads.

use serde::{Deserialize, Serialize};
use strata_core::Transform;

/// Projection of an output camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Projection {
    /// Perspective with a field-of-view angle in radians.
    Perspective { angle: f64 },
    Orthographic,
}

/// A camera placed in the output scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    pub name: String,
    /// World transform; columns are the right, up and backward axes and the position.
    pub transform: Transform,
    pub projection: Projection,
    pub clip_end: f64,
}

impl CameraData {
    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic)
    }
}
