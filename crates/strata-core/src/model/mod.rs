//! Source scene model.
//!
//! A `Model` is the document the importer reads: a root `Entities` tree,
//! the component definitions instances refer to, materials, scene presets
//! and the last active camera. It deserializes from JSON and is the
//! reference implementation of the capability traits in [`crate::source`].

pub mod entities;
pub mod material;
pub mod view;

pub use entities::*;
pub use material::*;
pub use view::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named, shared entities subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub name: String,
    #[serde(default)]
    pub entities: Entities,
    /// Number of placed instances as reported by the source.
    #[serde(default)]
    pub instance_count: usize,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>, entities: Entities) -> Self {
        Self {
            name: name.into(),
            entities,
            instance_count: 0,
        }
    }
}

/// A complete source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ModelDocument")]
pub struct Model {
    pub name: String,
    pub entities: Entities,
    pub definitions: Vec<ComponentDefinition>,
    pub materials: Vec<Material>,
    pub scenes: Vec<ScenePreset>,
    /// Camera of the last saved view.
    pub camera: Option<Camera>,
    #[serde(skip)]
    definition_index: IndexMap<String, usize>,
}

/// Serialized shape of a `Model`, without lookup indices.
#[derive(Default, Deserialize)]
#[serde(default)]
struct ModelDocument {
    name: String,
    entities: Entities,
    definitions: Vec<ComponentDefinition>,
    materials: Vec<Material>,
    scenes: Vec<ScenePreset>,
    camera: Option<Camera>,
}

impl From<ModelDocument> for Model {
    fn from(doc: ModelDocument) -> Self {
        let mut model = Model {
            name: doc.name,
            entities: doc.entities,
            definitions: doc.definitions,
            materials: doc.materials,
            scenes: doc.scenes,
            camera: doc.camera,
            definition_index: IndexMap::new(),
        };
        model.reindex();
        model
    }
}

impl Model {
    pub fn new(entities: Entities) -> Self {
        Self {
            entities,
            ..Default::default()
        }
    }

    /// Add or replace a component definition.
    pub fn add_definition(&mut self, definition: ComponentDefinition) -> usize {
        if let Some(&index) = self.definition_index.get(&definition.name) {
            self.definitions[index] = definition;
            return index;
        }
        let index = self.definitions.len();
        self.definition_index.insert(definition.name.clone(), index);
        self.definitions.push(definition);
        index
    }

    pub fn with_definition(mut self, definition: ComponentDefinition) -> Self {
        self.add_definition(definition);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    pub fn with_scene(mut self, scene: ScenePreset) -> Self {
        self.scenes.push(scene);
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn definition(&self, name: &str) -> Option<&ComponentDefinition> {
        self.definition_index
            .get(name)
            .and_then(|&index| self.definitions.get(index))
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.name == name)
    }

    /// Rebuild the definition lookup after `definitions` was edited directly.
    /// Later definitions win over earlier ones with the same name.
    pub fn reindex(&mut self) {
        self.definition_index = self
            .definitions
            .iter()
            .enumerate()
            .map(|(index, def)| (def.name.clone(), index))
            .collect();
    }

    /// Recount `instance_count` of every definition from the placed instances.
    pub fn count_instances(&mut self) {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        let mut stack: Vec<&Entities> = vec![&self.entities];
        stack.extend(self.definitions.iter().map(|def| &def.entities));
        while let Some(entities) = stack.pop() {
            for instance in &entities.instances {
                *counts.entry(instance.definition.clone()).or_default() += 1;
            }
            stack.extend(entities.groups.iter().map(|group| &group.entities));
        }
        for def in &mut self.definitions {
            def.instance_count = counts.get(&def.name).copied().unwrap_or(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_builds_index() {
        let json = r#"{
            "name": "Kitchen",
            "entities": { "instances": [ { "definition": "Chair" } ] },
            "definitions": [ { "name": "Chair" }, { "name": "Table" } ]
        }"#;
        let model: Model = serde_json::from_str(json).unwrap();
        assert_eq!(model.definition("Table").map(|d| d.name.as_str()), Some("Table"));
        assert!(model.definition("Sofa").is_none());
    }

    #[test]
    fn test_add_definition_replaces_same_name() {
        let mut model = Model::default();
        model.add_definition(ComponentDefinition::new("Chair", Entities::new()));
        let index = model.add_definition(ComponentDefinition {
            instance_count: 7,
            ..ComponentDefinition::new("Chair", Entities::new())
        });
        assert_eq!(index, 0);
        assert_eq!(model.definitions.len(), 1);
        assert_eq!(model.definition("Chair").map(|d| d.instance_count), Some(7));
    }

    #[test]
    fn test_count_instances_includes_nested() {
        let table = ComponentDefinition::new(
            "Table",
            Entities::new().with_instance(Instance::of("Leg")).with_instance(Instance::of("Leg")),
        );
        let mut model = Model::new(
            Entities::new()
                .with_instance(Instance::of("Table"))
                .with_group(Group::new("Room", Entities::new().with_instance(Instance::of("Leg")))),
        )
        .with_definition(table)
        .with_definition(ComponentDefinition::new("Leg", Entities::new()));
        model.count_instances();
        assert_eq!(model.definition("Table").map(|d| d.instance_count), Some(1));
        assert_eq!(model.definition("Leg").map(|d| d.instance_count), Some(3));
    }
}
