//! Capability traits over a hierarchical scene source.
//!
//! The importer only needs a narrow view of the source: entity lists, node
//! metadata, tessellated faces and definition lookup. Any SDK binding can
//! implement these traits; [`crate::model::Model`] implements them for the
//! JSON document model.

use crate::model::{
    Camera, ComponentDefinition, Entities, Face, Group, Instance, LayerId, Material, Model,
    ScenePreset,
};
use crate::transform::Transform;
use glam::{DVec2, DVec3};

/// Metadata shared by groups and instances.
pub trait NodeLike {
    fn name(&self) -> &str;
    fn transform(&self) -> Transform;
    /// Explicit material override, if any.
    fn material(&self) -> Option<&str>;
    fn is_hidden(&self) -> bool;
    fn layer(&self) -> &LayerId;
}

pub trait GroupLike: NodeLike {
    type Entities: EntitiesLike;

    fn entities(&self) -> &Self::Entities;
}

pub trait InstanceLike: NodeLike {
    /// Name of the referenced component definition.
    fn definition_name(&self) -> &str;
}

pub trait FaceLike {
    fn material(&self) -> Option<&str>;
    fn vertices(&self) -> &[DVec3];
    /// Per-vertex UVs, parallel to `vertices`.
    fn uv(&self, vertex: usize) -> DVec2;
    fn triangles(&self) -> &[[u32; 3]];
    fn is_smooth(&self) -> bool;
}

/// An ordered entity list.
pub trait EntitiesLike {
    type Group: GroupLike<Entities = Self>;
    type Instance: InstanceLike;
    type Face: FaceLike;

    fn groups(&self) -> &[Self::Group];
    fn instances(&self) -> &[Self::Instance];
    fn faces(&self) -> &[Self::Face];

    /// Whether any nested group or instance exists.
    fn has_children(&self) -> bool {
        !self.groups().is_empty() || !self.instances().is_empty()
    }
}

pub trait DefinitionLike {
    type Entities: EntitiesLike;

    fn name(&self) -> &str;
    fn entities(&self) -> &Self::Entities;
    fn instance_count(&self) -> usize;
}

/// A complete scene source.
pub trait SceneSource {
    type Entities: EntitiesLike;
    type Definition: DefinitionLike<Entities = Self::Entities>;

    /// Root entities.
    fn entities(&self) -> &Self::Entities;
    fn definitions(&self) -> &[Self::Definition];
    fn definition(&self, name: &str) -> Option<&Self::Definition>;
    fn materials(&self) -> &[Material];
    fn scenes(&self) -> &[ScenePreset];
    /// Camera of the last active view.
    fn active_camera(&self) -> Option<&Camera>;
}

impl NodeLike for Group {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn layer(&self) -> &LayerId {
        &self.layer
    }
}

impl GroupLike for Group {
    type Entities = Entities;

    fn entities(&self) -> &Entities {
        &self.entities
    }
}

impl NodeLike for Instance {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn layer(&self) -> &LayerId {
        &self.layer
    }
}

impl InstanceLike for Instance {
    fn definition_name(&self) -> &str {
        &self.definition
    }
}

impl FaceLike for Face {
    fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    fn uv(&self, vertex: usize) -> DVec2 {
        Face::uv(self, vertex)
    }

    fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    fn is_smooth(&self) -> bool {
        Face::is_smooth(self)
    }
}

impl EntitiesLike for Entities {
    type Group = Group;
    type Instance = Instance;
    type Face = Face;

    fn groups(&self) -> &[Group] {
        &self.groups
    }

    fn instances(&self) -> &[Instance] {
        &self.instances
    }

    fn faces(&self) -> &[Face] {
        &self.faces
    }
}

impl DefinitionLike for ComponentDefinition {
    type Entities = Entities;

    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> &Entities {
        &self.entities
    }

    fn instance_count(&self) -> usize {
        self.instance_count
    }
}

impl SceneSource for Model {
    type Entities = Entities;
    type Definition = ComponentDefinition;

    fn entities(&self) -> &Entities {
        &self.entities
    }

    fn definitions(&self) -> &[ComponentDefinition] {
        &self.definitions
    }

    fn definition(&self, name: &str) -> Option<&ComponentDefinition> {
        Model::definition(self, name)
    }

    fn materials(&self) -> &[Material] {
        &self.materials
    }

    fn scenes(&self) -> &[ScenePreset] {
        &self.scenes
    }

    fn active_camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }
}
