//! Mesh payloads.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use strata_core::Transform;

/// One triangle of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertex indices.
    pub indices: [u32; 3],
    /// Index into the mesh's material slots.
    pub material_slot: u32,
    /// Shade smooth.
    pub smooth: bool,
}

/// An indexed triangle mesh, or a bare point set when `triangles` is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<DVec3>,
    pub triangles: Vec<Triangle>,
    /// Per-loop UVs, one triple per triangle. Present only when a slot
    /// material is textured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<[DVec2; 3]>>,
}

impl MeshData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A vertex-only mesh.
    pub fn points(name: impl Into<String>, positions: Vec<DVec3>) -> Self {
        Self {
            name: name.into(),
            positions,
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of material slots referenced by triangles.
    pub fn slot_count(&self) -> usize {
        self.triangles
            .iter()
            .map(|tri| tri.material_slot as usize + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn compute_bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.positions.iter().copied())
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    /// A box containing nothing; expanding it by any point yields that point.
    pub const EMPTY: Self = Self {
        min: DVec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        max: DVec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        let mut bounds = Self::EMPTY;
        for point in points {
            bounds.expand_point(point);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn expand_point(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn expand(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.expand_point(other.min);
        self.expand_point(other.max);
    }

    /// Bounds of this box after transformation (all eight corners).
    pub fn transformed(&self, transform: &Transform) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        let corners = (0..8).map(|i| {
            DVec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        BoundingBox::from_points(corners.map(|corner| transform.transform_point(corner)))
    }

    pub fn size(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }
}
