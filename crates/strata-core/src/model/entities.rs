//! Entity hierarchy of a source scene.

use crate::transform::Transform;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a visibility layer ("tag").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    /// Name of the layer every entity belongs to unless told otherwise.
    pub const DEFAULT: &'static str = "Layer0";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An ordered collection of groups, component instances and faces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entities {
    pub groups: Vec<Group>,
    pub instances: Vec<Instance>,
    pub faces: Vec<Face>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn with_face(mut self, face: Face) -> Self {
        self.faces.push(face);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.instances.is_empty() && self.faces.is_empty()
    }
}

/// A group: an owned, transformed subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub name: String,
    pub transform: Transform,
    /// Material override inherited by faces without their own material.
    pub material: Option<String>,
    pub hidden: bool,
    pub layer: LayerId,
    pub entities: Entities,
}

impl Group {
    pub fn new(name: impl Into<String>, entities: Entities) -> Self {
        Self {
            name: name.into(),
            entities,
            ..Default::default()
        }
    }

    pub fn transformed(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn on_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = LayerId::new(layer);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A placement of a component definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    /// Instance name, often empty.
    pub name: String,
    /// Name of the referenced component definition.
    pub definition: String,
    pub transform: Transform,
    pub material: Option<String>,
    pub hidden: bool,
    pub layer: LayerId,
}

impl Instance {
    pub fn of(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn transformed(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn on_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = LayerId::new(layer);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A tessellated face.
///
/// `triangles` index into `vertices`; `uvs` is either empty or parallel to
/// `vertices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Face {
    pub vertices: Vec<DVec3>,
    pub uvs: Vec<DVec2>,
    pub triangles: Vec<[u32; 3]>,
    pub material: Option<String>,
    pub edges: Vec<Edge>,
}

impl Face {
    pub fn new(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            ..Default::default()
        }
    }

    /// An axis-aligned unit quad in the XY plane at `origin`, two triangles.
    pub fn quad(origin: DVec3, size: f64) -> Self {
        let vertices = vec![
            origin,
            origin + DVec3::new(size, 0.0, 0.0),
            origin + DVec3::new(size, size, 0.0),
            origin + DVec3::new(0.0, size, 0.0),
        ];
        let uvs = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        Self {
            vertices,
            uvs,
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            ..Default::default()
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    /// A face is shaded smooth when any of its edges is smooth.
    pub fn is_smooth(&self) -> bool {
        self.edges.iter().any(|edge| edge.smooth)
    }

    /// UV of a vertex, zero when the face carries no UVs.
    pub fn uv(&self, vertex: usize) -> DVec2 {
        self.uvs.get(vertex).copied().unwrap_or(DVec2::ZERO)
    }
}

/// A face boundary edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Edge {
    pub smooth: bool,
    pub soft: bool,
}

impl Edge {
    pub const HARD: Self = Self {
        smooth: false,
        soft: false,
    };

    pub const SMOOTH: Self = Self {
        smooth: true,
        soft: true,
    };
}
