//! Merging faces into indexed meshes.

use crate::materials::MaterialTable;
use crate::observer::ImportObserver;
use glam::{DVec2, DVec3};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use strata_core::{FaceLike, Result};
use strata_scene::{MeshData, MeshHandle, SceneSink, Triangle};

/// Cache key of a built mesh: the entity path it was built for and the
/// material its untextured faces inherit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeshKey {
    pub name: String,
    pub material: String,
}

impl MeshKey {
    pub fn new(name: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: material.into(),
        }
    }
}

/// Builds meshes from faces, at most once per key.
///
/// Entities with no vertices produce no mesh; that result is cached too.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    cache: FxHashMap<MeshKey, Option<MeshHandle>>,
    built: usize,
    hits: usize,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes created in the sink so far.
    pub fn built(&self) -> usize {
        self.built
    }

    /// Lookups answered from the cache.
    pub fn cache_hits(&self) -> usize {
        self.hits
    }

    pub fn cached(&self, key: &MeshKey) -> Option<Option<MeshHandle>> {
        self.cache.get(key).copied()
    }

    /// Build (or fetch) the mesh for `faces`.
    ///
    /// `display_name` names the mesh in the sink the first time it is built.
    pub fn build<F: FaceLike, K: SceneSink>(
        &mut self,
        sink: &mut K,
        materials: &mut MaterialTable,
        observer: &mut dyn ImportObserver,
        faces: &[F],
        key: MeshKey,
        display_name: &str,
    ) -> Result<Option<MeshHandle>> {
        if let Some(&cached) = self.cache.get(&key) {
            self.hits += 1;
            return Ok(cached);
        }

        let assembled = assemble(faces, display_name, &key.material, materials);
        let handle = match assembled {
            Some(assembled) => Some(self.commit(sink, materials, observer, assembled)?),
            None => None,
        };
        self.cache.insert(key, handle);
        Ok(handle)
    }

    fn commit<K: SceneSink>(
        &mut self,
        sink: &mut K,
        materials: &mut MaterialTable,
        observer: &mut dyn ImportObserver,
        assembled: AssembledMesh,
    ) -> Result<MeshHandle> {
        let AssembledMesh {
            mut mesh,
            slots,
            uvs,
        } = assembled;

        let resolved: Vec<_> = slots
            .keys()
            .map(|name| materials.resolve(name, observer))
            .collect();
        if resolved.iter().any(|&handle| sink.is_textured(handle)) {
            mesh.uvs = Some(uvs);
        }

        log::trace!(
            "Mesh {}: {} vertices, {} triangles, {} slots",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count(),
            resolved.len()
        );

        let handle = sink.create_mesh(mesh)?;
        for (slot, material) in resolved.into_iter().enumerate() {
            sink.bind_material_slot(handle, slot as u32, material)?;
        }
        self.built += 1;
        Ok(handle)
    }
}

/// Mesh data before it is handed to the sink.
struct AssembledMesh {
    mesh: MeshData,
    /// Material name to slot index, in first-seen order.
    slots: IndexMap<String, u32>,
    uvs: Vec<[DVec2; 3]>,
}

/// Position key with negative zero folded into zero.
fn position_key(position: DVec3) -> [u64; 3] {
    let bits = |v: f64| if v == 0.0 { 0 } else { v.to_bits() };
    [bits(position.x), bits(position.y), bits(position.z)]
}

fn assemble<F: FaceLike>(
    faces: &[F],
    name: &str,
    default_material: &str,
    materials: &MaterialTable,
) -> Option<AssembledMesh> {
    let mut mesh = MeshData::new(name);
    let mut seen: FxHashMap<[u64; 3], u32> = FxHashMap::default();
    let mut slots: IndexMap<String, u32> = IndexMap::new();
    let mut uvs = Vec::new();

    for face in faces {
        let (material, uv_scale) = match face.material() {
            Some(own) => (own, None),
            None => (default_material, materials.inherited_uv_scale(default_material)),
        };
        let next_slot = slots.len() as u32;
        let slot = *slots.entry(material.to_string()).or_insert(next_slot);
        let smooth = face.is_smooth();

        let vertices = face.vertices();
        let mapping: SmallVec<[u32; 8]> = vertices
            .iter()
            .map(|&position| {
                *seen.entry(position_key(position)).or_insert_with(|| {
                    mesh.positions.push(position);
                    (mesh.positions.len() - 1) as u32
                })
            })
            .collect();

        let face_uv = |corner: u32| {
            let uv = face.uv(corner as usize);
            match uv_scale {
                Some((s, t)) => DVec2::new(uv.x * s, uv.y * t),
                None => uv,
            }
        };

        for &[a, b, c] in face.triangles() {
            let corners = [a, b, c];
            if corners.iter().any(|&corner| corner as usize >= mapping.len()) {
                log::warn!("Skipping triangle {corners:?} of {name}: index out of range");
                continue;
            }
            mesh.triangles.push(Triangle {
                indices: corners.map(|corner| mapping[corner as usize]),
                material_slot: slot,
                smooth,
            });
            uvs.push(corners.map(&face_uv));
        }
    }

    if mesh.positions.is_empty() {
        return None;
    }
    Some(AssembledMesh { mesh, slots, uvs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::DEFAULT_MATERIAL;
    use crate::observer::{ImportWarning, RecordingObserver};
    use crate::options::ImportOptions;
    use strata_core::{Edge, Face, Material, Rgba8, Texture};
    use strata_scene::SceneGraph;

    fn setup(materials: &[Material]) -> (SceneGraph, MaterialTable, RecordingObserver) {
        let mut graph = SceneGraph::new();
        let mut observer = RecordingObserver::default();
        let table = MaterialTable::import(materials, &mut graph, &ImportOptions::default(), &mut observer).unwrap();
        (graph, table, observer)
    }

    fn two_quads() -> Vec<Face> {
        // Share the edge x = 1.
        vec![
            Face::quad(DVec3::ZERO, 1.0),
            Face::quad(DVec3::new(1.0, 0.0, 0.0), 1.0).with_material("Red"),
        ]
    }

    #[test]
    fn test_shared_vertices_merged() {
        let (mut graph, mut table, mut observer) = setup(&[Material::new("Red", Rgba8::new(255, 0, 0, 255))]);
        let mut builder = MeshBuilder::new();
        let handle = builder
            .build(&mut graph, &mut table, &mut observer, &two_quads(), MeshKey::new("Tile", DEFAULT_MATERIAL), "C-Tile")
            .unwrap()
            .unwrap();
        let mesh = &graph.meshes[handle.0];
        assert_eq!(mesh.data.name, "C-Tile");
        assert_eq!(mesh.data.vertex_count(), 6);
        assert_eq!(mesh.data.triangle_count(), 4);
        assert_eq!(mesh.materials.len(), 2);
        assert_eq!(mesh.materials[0], table.get(DEFAULT_MATERIAL));
        assert_eq!(mesh.materials[1], table.get("Red"));
        let slots: Vec<u32> = mesh.data.triangles.iter().map(|t| t.material_slot).collect();
        assert_eq!(slots, vec![0, 0, 1, 1]);
        assert!(mesh.data.uvs.is_none());
    }

    #[test]
    fn test_cache_idempotent() {
        let (mut graph, mut table, mut observer) = setup(&[]);
        let mut builder = MeshBuilder::new();
        let faces = vec![Face::quad(DVec3::ZERO, 1.0)];
        let first = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("A", DEFAULT_MATERIAL), "A")
            .unwrap();
        let second = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("A", DEFAULT_MATERIAL), "A again")
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.mesh_count(), 1);
        assert_eq!(builder.built(), 1);
        assert_eq!(builder.cache_hits(), 1);

        // A different inherited material is a different mesh.
        builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("A", "Red"), "A")
            .unwrap();
        assert_eq!(graph.mesh_count(), 2);
    }

    #[test]
    fn test_no_vertices_gives_none() {
        let (mut graph, mut table, mut observer) = setup(&[]);
        let mut builder = MeshBuilder::new();
        let faces: Vec<Face> = Vec::new();
        let result = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("Empty", DEFAULT_MATERIAL), "Empty")
            .unwrap();
        assert!(result.is_none());
        assert_eq!(graph.mesh_count(), 0);
        assert_eq!(builder.cached(&MeshKey::new("Empty", DEFAULT_MATERIAL)), Some(None));
    }

    #[test]
    fn test_smooth_flag_per_face() {
        let (mut graph, mut table, mut observer) = setup(&[]);
        let mut builder = MeshBuilder::new();
        let faces = vec![
            Face::quad(DVec3::ZERO, 1.0).with_edges(vec![Edge::HARD, Edge::SMOOTH]),
            Face::quad(DVec3::new(5.0, 0.0, 0.0), 1.0).with_edges(vec![Edge::HARD]),
        ];
        let handle = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("S", DEFAULT_MATERIAL), "S")
            .unwrap()
            .unwrap();
        let smooth: Vec<bool> = graph.meshes[handle.0].data.triangles.iter().map(|t| t.smooth).collect();
        assert_eq!(smooth, vec![true, true, false, false]);
    }

    #[test]
    fn test_textured_inherited_material_scales_uvs() {
        let brick = Material::new("Brick", Rgba8::WHITE)
            .with_texture(Texture::new("brick.png").with_bytes(vec![7]).with_scale(0.5, 2.0));
        let (mut graph, mut table, mut observer) = setup(&[brick]);
        let mut builder = MeshBuilder::new();
        let faces = vec![Face::quad(DVec3::ZERO, 1.0)];
        let handle = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("Wall", "Brick"), "Wall")
            .unwrap()
            .unwrap();
        let uvs = graph.meshes[handle.0].data.uvs.as_ref().unwrap();
        assert_eq!(uvs.len(), 2);
        // First triangle is corners 0, 1, 2: (0,0), (1,0), (1,1) scaled.
        assert_eq!(uvs[0], [DVec2::new(0.0, 0.0), DVec2::new(0.5, 0.0), DVec2::new(0.5, 2.0)]);
    }

    #[test]
    fn test_own_textured_material_keeps_uvs() {
        let brick = Material::new("Brick", Rgba8::WHITE)
            .with_texture(Texture::new("brick.png").with_bytes(vec![7]).with_scale(0.5, 2.0));
        let (mut graph, mut table, mut observer) = setup(&[brick]);
        let mut builder = MeshBuilder::new();
        let faces = vec![Face::quad(DVec3::ZERO, 1.0).with_material("Brick")];
        let handle = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("Wall", DEFAULT_MATERIAL), "Wall")
            .unwrap()
            .unwrap();
        let uvs = graph.meshes[handle.0].data.uvs.as_ref().unwrap();
        assert_eq!(uvs[0][2], DVec2::new(1.0, 1.0));
    }

    #[test]
    fn test_out_of_range_triangle_skipped() {
        let (mut graph, mut table, mut observer) = setup(&[]);
        let mut builder = MeshBuilder::new();
        let faces = vec![Face::new(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2], [0, 1, 9]])];
        let handle = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("T", DEFAULT_MATERIAL), "T")
            .unwrap()
            .unwrap();
        assert_eq!(graph.meshes[handle.0].data.triangle_count(), 1);
    }

    #[test]
    fn test_unknown_face_material_falls_back() {
        let (mut graph, mut table, mut observer) = setup(&[]);
        let mut builder = MeshBuilder::new();
        let faces = vec![Face::quad(DVec3::ZERO, 1.0).with_material("Chrome")];
        let handle = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("K", DEFAULT_MATERIAL), "K")
            .unwrap()
            .unwrap();
        assert_eq!(graph.meshes[handle.0].materials, vec![Some(table.default_handle())]);
        assert_eq!(
            observer.warnings,
            vec![ImportWarning::UnresolvedMaterial { name: "Chrome".into() }]
        );
    }

    #[test]
    fn test_inherited_faces_bind_default_slot() {
        let (mut graph, mut table, mut observer) = setup(&[]);
        let mut builder = MeshBuilder::new();
        let faces = vec![Face::quad(DVec3::ZERO, 1.0), Face::quad(DVec3::new(3.0, 0.0, 0.0), 1.0)];
        let handle = builder
            .build(&mut graph, &mut table, &mut observer, &faces, MeshKey::new("Plain", DEFAULT_MATERIAL), "Plain")
            .unwrap()
            .unwrap();
        let mesh = &graph.meshes[handle.0];
        assert_eq!(mesh.materials, vec![Some(table.default_handle())]);
        assert!(mesh.data.triangles.iter().all(|t| t.material_slot == 0));
        assert!(observer.warnings.is_empty());
    }
}
