//! Deduplication decisions for repeated components.
//!
//! Pairs that occur often enough are either written once as a shared
//! instance group (any depth other than 1) or deferred to point/billboard
//! instancing (depth exactly 1). Deferred occurrences are clustered by
//! identical scale and rotation; each cluster becomes one instancer
//! object placed at its first occurrence.

use crate::analyzer::{ComponentDepths, ComponentKey, ComponentStats};
use crate::options::InstancingStyle;
use glam::{DQuat, DVec3};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use strata_core::{OrientationKey, Transform};
use strata_scene::{GroupHandle, MeshData, Triangle};

/// Half the edge length of a billboard quad.
pub const BILLBOARD_HALF_SIZE: f64 = 0.05;

/// A pair that passed the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub key: ComponentKey,
    pub depth: usize,
    pub occurrences: usize,
}

/// What to do with each candidate.
#[derive(Debug, Clone, Default)]
pub struct DedupPlan {
    /// Pairs to write as shared instance groups, in processing order.
    pub grouped: Vec<Candidate>,
    /// Leaf pairs left for point or billboard instancing.
    pub deferred: IndexSet<ComponentKey>,
}

/// Chooses between shared groups and instancing.
#[derive(Debug, Clone, Copy)]
pub struct InstanceDeduplicator {
    threshold: usize,
}

impl InstanceDeduplicator {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    /// Pairs with at least `threshold` occurrences, ordered by ascending
    /// depth and then by first appearance.
    pub fn candidates(&self, stats: &ComponentStats, depths: &ComponentDepths) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = stats
            .iter()
            .filter(|(_, transforms)| transforms.len() >= self.threshold)
            .map(|(key, transforms)| Candidate {
                key: key.clone(),
                depth: depths.get(&key.component),
                occurrences: transforms.len(),
            })
            .collect();
        // Stable: ties keep first-seen order.
        candidates.sort_by_key(|candidate| candidate.depth);
        candidates
    }

    pub fn plan(&self, stats: &ComponentStats, depths: &ComponentDepths) -> DedupPlan {
        let mut plan = DedupPlan::default();
        for candidate in self.candidates(stats, depths) {
            if candidate.depth == 1 {
                plan.deferred.insert(candidate.key);
            } else {
                plan.grouped.push(candidate);
            }
        }
        plan
    }
}

/// Pairs resolved into shared instance groups, with their groups.
#[derive(Debug, Clone, Default)]
pub struct ComponentSkip {
    groups: IndexMap<ComponentKey, GroupHandle>,
}

impl ComponentSkip {
    pub fn insert(&mut self, key: ComponentKey, group: GroupHandle) {
        self.groups.insert(key, group);
    }

    pub fn get(&self, key: &ComponentKey) -> Option<GroupHandle> {
        self.groups.get(key).copied()
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.groups.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ComponentKey, GroupHandle)> {
        self.groups.iter().map(|(key, &group)| (key, group))
    }
}

/// Occurrences sharing one exact scale and rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationCluster {
    pub scale: DVec3,
    pub rotation: DQuat,
    /// World locations, first occurrence first.
    pub locations: Vec<DVec3>,
}

impl OrientationCluster {
    /// Location of the first occurrence; the cluster is centered here.
    pub fn origin(&self) -> DVec3 {
        self.locations.first().copied().unwrap_or(DVec3::ZERO)
    }

    /// Every occurrence relative to the origin.
    pub fn offsets(&self) -> Vec<DVec3> {
        let origin = self.origin();
        self.locations.iter().map(|&location| location - origin).collect()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Local transform of the prototype below the instancer.
    pub fn prototype_transform(&self, style: InstancingStyle) -> Transform {
        match style {
            InstancingStyle::PointCloud => {
                Transform::from_scale_rotation_translation(self.scale, self.rotation, DVec3::ZERO)
            }
            // Faces carry the rotation.
            InstancingStyle::BillboardQuad => Transform::from_scale(self.scale),
        }
    }

    /// Instancer mesh: one vertex or one quad per occurrence, relative to
    /// the origin.
    pub fn instancer_mesh(&self, name: &str, style: InstancingStyle) -> MeshData {
        match style {
            InstancingStyle::PointCloud => MeshData::points(name, self.offsets()),
            InstancingStyle::BillboardQuad => self.billboard_mesh(name),
        }
    }

    fn billboard_mesh(&self, name: &str) -> MeshData {
        const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let mut mesh = MeshData::new(name);
        for offset in self.offsets() {
            let base = mesh.positions.len() as u32;
            mesh.positions.extend(CORNERS.iter().map(|&(x, y)| {
                offset + self.rotation * DVec3::new(x * BILLBOARD_HALF_SIZE, y * BILLBOARD_HALF_SIZE, 0.0)
            }));
            for indices in [[base, base + 1, base + 2], [base, base + 2, base + 3]] {
                mesh.triangles.push(Triangle {
                    indices,
                    material_slot: 0,
                    smooth: false,
                });
            }
        }
        mesh
    }
}

/// Group transforms by exact (scale, rotation), keeping first-seen order
/// of both clusters and locations.
pub fn cluster_by_orientation(transforms: &[Transform]) -> Vec<OrientationCluster> {
    let mut clusters: IndexMap<OrientationKey, OrientationCluster> = IndexMap::new();
    for transform in transforms {
        let parts = transform.decompose();
        clusters
            .entry(parts.orientation_key())
            .or_insert_with(|| OrientationCluster {
                scale: parts.scale,
                rotation: parts.rotation,
                locations: Vec::new(),
            })
            .locations
            .push(parts.translation);
    }
    clusters.into_values().collect()
}
