//! Material import and name resolution.

use crate::observer::{ImportObserver, ImportWarning};
use crate::options::ImportOptions;
use glam::Vec4;
use indexmap::{IndexMap, IndexSet};
use strata_core::{Material, Result};
use strata_scene::{MaterialDesc, MaterialHandle, SceneSink, SinkError};

/// Name of the material used by faces with no material anywhere on their path.
pub const DEFAULT_MATERIAL: &str = "Material";

/// Base color of the default material (linear).
pub const DEFAULT_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 1.0);

/// Source material names resolved to sink materials.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    handles: IndexMap<String, MaterialHandle>,
    uv_scales: IndexMap<String, (f64, f64)>,
    default: MaterialHandle,
    reported: IndexSet<String>,
}

impl MaterialTable {
    /// Create the default material and every source material in the sink.
    pub fn import<K: SceneSink>(
        materials: &[Material],
        sink: &mut K,
        options: &ImportOptions,
        observer: &mut dyn ImportObserver,
    ) -> Result<Self> {
        let default = match sink.find_material(DEFAULT_MATERIAL) {
            Some(existing) if options.reuse_materials => existing,
            _ => sink.create_material(MaterialDesc::new(DEFAULT_MATERIAL, DEFAULT_COLOR))?,
        };

        let mut table = Self {
            handles: IndexMap::new(),
            uv_scales: IndexMap::new(),
            default,
            reported: IndexSet::new(),
        };
        table.handles.insert(DEFAULT_MATERIAL.to_string(), default);

        for material in materials {
            table
                .uv_scales
                .insert(material.name.clone(), material.uv_scale());

            if options.reuse_materials {
                if let Some(existing) = sink.find_material(&material.name) {
                    log::debug!("Reusing material {}", material.name);
                    table.handles.insert(material.name.clone(), existing);
                    continue;
                }
            }

            let handle = create_material(material, sink, observer)?;
            table.handles.insert(material.name.clone(), handle);
        }
        Ok(table)
    }

    pub fn default_handle(&self) -> MaterialHandle {
        self.default
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<MaterialHandle> {
        self.handles.get(name).copied()
    }

    /// Resolve a material name, falling back to the default material.
    /// Each unknown name is reported once.
    pub fn resolve(&mut self, name: &str, observer: &mut dyn ImportObserver) -> MaterialHandle {
        if let Some(handle) = self.get(name) {
            return handle;
        }
        if self.reported.insert(name.to_string()) {
            observer.warning(&ImportWarning::UnresolvedMaterial {
                name: name.to_string(),
            });
        }
        self.default
    }

    /// UV tiling applied to faces that inherit `name` instead of carrying
    /// their own material.
    pub fn inherited_uv_scale(&self, name: &str) -> Option<(f64, f64)> {
        if name == DEFAULT_MATERIAL {
            return None;
        }
        self.uv_scales.get(name).copied()
    }
}

fn create_material<K: SceneSink>(
    material: &Material,
    sink: &mut K,
    observer: &mut dyn ImportObserver,
) -> Result<MaterialHandle> {
    let handle = sink.create_material(MaterialDesc::new(
        material.name.clone(),
        material.color.to_linear(),
    ))?;

    let Some(texture) = &material.texture else {
        return Ok(handle);
    };
    let missing = || ImportWarning::MissingTexture {
        material: material.name.clone(),
        texture: texture.image_name().to_string(),
    };
    let Some(bytes) = texture.bytes.as_deref() else {
        observer.warning(&missing());
        return Ok(handle);
    };
    match sink.create_image(texture.image_name(), bytes) {
        Ok(image) => sink.bind_texture(handle, image)?,
        Err(SinkError::InvalidImage { reason, .. }) => {
            log::debug!("Image {} rejected: {reason}", texture.image_name());
            observer.warning(&missing());
        }
        Err(err) => return Err(err.into()),
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use strata_core::{Rgba8, Texture};
    use strata_scene::{AlphaMode, SceneGraph};

    #[test]
    fn test_default_material_created() {
        let mut graph = SceneGraph::new();
        let mut observer = RecordingObserver::default();
        let table = MaterialTable::import(&[], &mut graph, &ImportOptions::default(), &mut observer).unwrap();
        let default = graph.material(table.default_handle()).unwrap();
        assert_eq!(default.name, DEFAULT_MATERIAL);
        assert_eq!(default.base_color, DEFAULT_COLOR);
    }

    #[test]
    fn test_translucent_material_blends() {
        let mut graph = SceneGraph::new();
        let mut observer = RecordingObserver::default();
        let glass = Material::new("Glass", Rgba8::new(200, 220, 255, 128));
        let frosted = Material::new("Frosted", Rgba8::new(255, 255, 255, 128))
            .with_texture(Texture::new("frost.png").with_bytes(vec![1, 2, 3]));
        let table = MaterialTable::import(&[glass, frosted], &mut graph, &ImportOptions::default(), &mut observer)
            .unwrap();
        let desc = graph.material(table.get("Glass").unwrap()).unwrap();
        assert_eq!(desc.alpha_mode, AlphaMode::Blend);
        assert_eq!(desc.base_color.w, 0.5);
        assert!((desc.base_color.x - (200.0f32 / 255.0).powf(2.2)).abs() < 1e-6);

        // Binding a texture leaves the blend state alone.
        let frosted = table.get("Frosted").unwrap();
        let desc = graph.material(frosted).unwrap();
        assert_eq!(desc.alpha_mode, AlphaMode::Blend);
        assert_eq!(desc.base_color.w, 0.5);
        assert!(graph.is_textured(frosted));
        assert!(observer.warnings.is_empty());
    }

    #[test]
    fn test_unresolved_material_reported_once() {
        let mut graph = SceneGraph::new();
        let mut observer = RecordingObserver::default();
        let mut table = MaterialTable::import(&[], &mut graph, &ImportOptions::default(), &mut observer).unwrap();
        let a = table.resolve("Missing", &mut observer);
        let b = table.resolve("Missing", &mut observer);
        assert_eq!(a, table.default_handle());
        assert_eq!(b, table.default_handle());
        assert_eq!(observer.warnings.len(), 1);
    }

    #[test]
    fn test_texture_without_data_is_missing() {
        let mut graph = SceneGraph::new();
        let mut observer = RecordingObserver::default();
        let brick = Material::new("Brick", Rgba8::WHITE).with_texture(Texture::new(r"C:\maps\brick.jpg"));
        let table =
            MaterialTable::import(&[brick], &mut graph, &ImportOptions::default(), &mut observer).unwrap();
        assert!(!graph.is_textured(table.get("Brick").unwrap()));
        assert_eq!(
            observer.warnings,
            vec![ImportWarning::MissingTexture {
                material: "Brick".into(),
                texture: "brick.jpg".into(),
            }]
        );
    }

    #[test]
    fn test_texture_bound_and_uv_scale_recorded() {
        let mut graph = SceneGraph::new();
        let mut observer = RecordingObserver::default();
        let brick = Material::new("Brick", Rgba8::WHITE).with_texture(
            Texture::new("brick.jpg")
                .with_bytes(vec![1, 2, 3])
                .with_scale(0.25, 0.5),
        );
        let table =
            MaterialTable::import(&[brick], &mut graph, &ImportOptions::default(), &mut observer).unwrap();
        assert!(graph.is_textured(table.get("Brick").unwrap()));
        assert_eq!(table.inherited_uv_scale("Brick"), Some((0.25, 0.5)));
        assert_eq!(table.inherited_uv_scale(DEFAULT_MATERIAL), None);
        assert_eq!(graph.images[0].name, "brick.jpg");
    }

    #[test]
    fn test_reuse_existing_materials() {
        let mut graph = SceneGraph::new();
        let mut observer = RecordingObserver::default();
        let red = Material::new("Red", Rgba8::new(255, 0, 0, 255));
        let first = MaterialTable::import(
            std::slice::from_ref(&red),
            &mut graph,
            &ImportOptions::default(),
            &mut observer,
        )
        .unwrap();
        let second = MaterialTable::import(
            std::slice::from_ref(&red),
            &mut graph,
            &ImportOptions::default(),
            &mut observer,
        )
        .unwrap();
        assert_eq!(first.get("Red"), second.get("Red"));
        assert_eq!(graph.materials.len(), 2);

        MaterialTable::import(&[red], &mut graph, &ImportOptions::default().fresh_materials(), &mut observer)
            .unwrap();
        assert_eq!(graph.materials.len(), 4);
    }
}
