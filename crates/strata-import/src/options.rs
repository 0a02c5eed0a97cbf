//! Import configuration.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strata_core::LayerId;

/// How high-count leaf components are instanced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstancingStyle {
    /// One vertex per occurrence; the component is replicated on vertices.
    #[default]
    PointCloud,
    /// One small quad per occurrence; the component is replicated on faces.
    BillboardQuad,
}

/// Options controlling an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Occurrences a (component, material) pair needs before it is
    /// deduplicated.
    pub min_instance_threshold: usize,
    /// Reuse an instance group of the same name already in the sink.
    pub reuse_existing_groups: bool,
    /// Reuse a material of the same name already in the sink.
    pub reuse_materials: bool,
    pub instancing_style: InstancingStyle,
    /// Layers whose entities are left out entirely.
    pub hidden_layers: IndexSet<LayerId>,
    /// Import only the camera and layer visibility of this named scene.
    pub import_scene: Option<String>,
    /// Create a camera for every scene preset.
    pub scenes_as_cameras: bool,
    /// Import the last active view as the active camera.
    pub import_camera: bool,
    /// Stop after shared instance groups are written.
    pub groups_only: bool,
    /// Far clip distance of imported cameras.
    pub camera_far_plane: f64,
    /// Aspect ratio used for cameras that follow the viewport.
    pub viewport_aspect_ratio: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            min_instance_threshold: 1,
            reuse_existing_groups: false,
            reuse_materials: true,
            instancing_style: InstancingStyle::PointCloud,
            hidden_layers: IndexSet::new(),
            import_scene: None,
            scenes_as_cameras: true,
            import_camera: false,
            groups_only: false,
            camera_far_plane: 250.0,
            viewport_aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl ImportOptions {
    /// Create default import options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deduplication threshold. Zero is treated as one.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.min_instance_threshold = threshold.max(1);
        self
    }

    pub fn with_instancing(mut self, style: InstancingStyle) -> Self {
        self.instancing_style = style;
        self
    }

    /// Hide a layer.
    pub fn hiding_layer(mut self, layer: impl Into<String>) -> Self {
        self.hidden_layers.insert(LayerId::new(layer));
        self
    }

    /// Import a named scene. This replaces per-scene cameras with the
    /// named scene's camera.
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.import_scene = Some(scene.into());
        self
    }

    pub fn reusing_groups(mut self) -> Self {
        self.reuse_existing_groups = true;
        self
    }

    pub fn fresh_materials(mut self) -> Self {
        self.reuse_materials = false;
        self
    }

    pub fn with_last_view(mut self) -> Self {
        self.import_camera = true;
        self
    }

    pub fn without_scene_cameras(mut self) -> Self {
        self.scenes_as_cameras = false;
        self
    }

    pub fn groups_only(mut self) -> Self {
        self.groups_only = true;
        self
    }

    /// Effective threshold; never below one.
    pub fn threshold(&self) -> usize {
        self.min_instance_threshold.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ImportOptions::default();
        assert_eq!(options.min_instance_threshold, 1);
        assert!(options.reuse_materials);
        assert!(options.scenes_as_cameras);
        assert!(!options.import_camera);
        assert_eq!(options.instancing_style, InstancingStyle::PointCloud);
        assert_eq!(options.camera_far_plane, 250.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: ImportOptions = serde_json::from_str(
            r#"{ "min_instance_threshold": 3, "instancing_style": "billboard_quad", "hidden_layers": ["Trees"] }"#,
        )
        .unwrap();
        assert_eq!(options.min_instance_threshold, 3);
        assert_eq!(options.instancing_style, InstancingStyle::BillboardQuad);
        assert!(options.hidden_layers.contains(&LayerId::new("Trees")));
        assert!(options.scenes_as_cameras);
    }

    #[test]
    fn test_zero_threshold_clamped() {
        assert_eq!(ImportOptions::new().with_threshold(0).threshold(), 1);
        let raw = ImportOptions {
            min_instance_threshold: 0,
            ..Default::default()
        };
        assert_eq!(raw.threshold(), 1);
    }
}
