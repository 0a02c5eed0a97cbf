//! SceneGraph: an in-memory scene sink.

use crate::camera::CameraData;
use crate::geometry::{BoundingBox, MeshData};
use crate::handle::{CameraHandle, GroupHandle, ImageHandle, MaterialHandle, MeshHandle, NodeHandle};
use crate::material::{Image, MaterialDesc};
use crate::sink::{InstanceMode, SceneSink, SinkResult};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strata_core::{SinkError, Transform};

/// Nesting limit when expanding instance references that point into
/// groups which themselves hold references.
const MAX_GROUP_NESTING: usize = 64;

/// A flattened scene held in memory.
///
/// Nodes, meshes, materials, images, instance groups and cameras live in
/// flat arrays addressed by typed handles. Root nodes are nodes with no
/// parent that are not members of an instance group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<MaterialDesc>,
    pub images: Vec<Image>,
    pub groups: Vec<InstanceGroup>,
    pub cameras: Vec<CameraData>,
    pub active_camera: Option<CameraHandle>,
}

/// A node in the scene graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    /// Transform local to `parent`, or world when there is none.
    pub transform: Transform,
    pub parent: Option<NodeHandle>,
    pub children: Vec<NodeHandle>,
    pub mesh: Option<MeshHandle>,
    /// Instance group displayed by this node.
    pub instance_of: Option<GroupHandle>,
    /// Instance group this node belongs to.
    pub member_of: Option<GroupHandle>,
    pub hidden: bool,
    pub instancing: Option<InstanceMode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A mesh with its material slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub data: MeshData,
    pub materials: Vec<Option<MaterialHandle>>,
}

/// A named set of nodes that can be displayed many times by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceGroup {
    pub name: String,
    pub members: IndexSet<NodeHandle>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&MaterialDesc> {
        self.materials.get(handle.0)
    }

    pub fn group(&self, handle: GroupHandle) -> Option<&InstanceGroup> {
        self.groups.get(handle.0)
    }

    /// Root node handles in creation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none() && node.member_of.is_none())
            .map(|(index, _)| NodeHandle(index))
    }

    /// First node with the given name.
    pub fn find_node(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeHandle)
    }

    /// All nodes with the given name.
    pub fn nodes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeHandle> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.name == name)
            .map(|(index, _)| NodeHandle(index))
    }

    /// Nodes that display the given group.
    pub fn references_to(&self, group: GroupHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.instance_of == Some(group))
            .map(|(index, _)| NodeHandle(index))
    }

    /// World transform of a node, following parent links.
    pub fn world_transform(&self, handle: NodeHandle) -> Option<Transform> {
        let mut node = self.node(handle)?;
        let mut world = node.transform;
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            world = node.transform.compose(&world);
        }
        Some(world)
    }

    /// Iterate over the hierarchy below the roots, depth-first, with world
    /// transforms. Instance group contents are not expanded.
    pub fn traverse(&self) -> impl Iterator<Item = (NodeHandle, &SceneNode, Transform)> {
        SceneTraverser::new(self)
    }

    /// World-space bounds of all visible geometry, expanding instance
    /// references into their groups.
    pub fn compute_bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        let mut stack: Vec<(NodeHandle, Transform, usize)> = self
            .roots()
            .map(|root| (root, Transform::IDENTITY, 0))
            .collect();
        while let Some((handle, parent_world, nesting)) = stack.pop() {
            let Some(node) = self.node(handle) else {
                continue;
            };
            let world = parent_world.compose(&node.transform);
            if let Some(mesh) = node.mesh.and_then(|mesh| self.mesh(mesh)) {
                bounds.expand(&mesh.data.compute_bounds().transformed(&world));
            }
            if let Some(group) = node.instance_of.and_then(|group| self.group(group)) {
                if nesting < MAX_GROUP_NESTING {
                    stack.extend(group.members.iter().map(|&member| (member, world, nesting + 1)));
                }
            }
            stack.extend(node.children.iter().map(|&child| (child, world, nesting)));
        }
        bounds
    }

    fn check_node(&self, handle: NodeHandle) -> SinkResult<()> {
        if handle.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(unknown(NodeHandle::KIND, handle.0))
        }
    }

    fn node_mut(&mut self, handle: NodeHandle) -> SinkResult<&mut SceneNode> {
        self.nodes
            .get_mut(handle.0)
            .ok_or_else(|| unknown(NodeHandle::KIND, handle.0))
    }

    fn push_node(&mut self, node: SceneNode) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(node);
        handle
    }
}

fn unknown(kind: &'static str, index: usize) -> SinkError {
    SinkError::UnknownHandle { kind, index }
}

impl SceneSink for SceneGraph {
    fn create_material(&mut self, material: MaterialDesc) -> SinkResult<MaterialHandle> {
        if let Some(image) = material.texture {
            if image.0 >= self.images.len() {
                return Err(unknown(ImageHandle::KIND, image.0));
            }
        }
        let handle = MaterialHandle(self.materials.len());
        self.materials.push(material);
        Ok(handle)
    }

    fn find_material(&self, name: &str) -> Option<MaterialHandle> {
        self.materials
            .iter()
            .position(|material| material.name == name)
            .map(MaterialHandle)
    }

    fn create_image(&mut self, name: &str, data: &[u8]) -> SinkResult<ImageHandle> {
        if data.is_empty() {
            return Err(SinkError::InvalidImage {
                name: name.to_string(),
                reason: "no image data".to_string(),
            });
        }
        let handle = ImageHandle(self.images.len());
        self.images.push(Image {
            name: name.to_string(),
            data: data.to_vec(),
        });
        Ok(handle)
    }

    fn bind_texture(&mut self, material: MaterialHandle, image: ImageHandle) -> SinkResult<()> {
        if image.0 >= self.images.len() {
            return Err(unknown(ImageHandle::KIND, image.0));
        }
        let material = self
            .materials
            .get_mut(material.0)
            .ok_or_else(|| unknown(MaterialHandle::KIND, material.0))?;
        material.texture = Some(image);
        Ok(())
    }

    fn is_textured(&self, material: MaterialHandle) -> bool {
        self.material(material).is_some_and(MaterialDesc::is_textured)
    }

    fn create_mesh(&mut self, mesh: MeshData) -> SinkResult<MeshHandle> {
        let handle = MeshHandle(self.meshes.len());
        let slots = mesh.slot_count();
        self.meshes.push(Mesh {
            data: mesh,
            materials: vec![None; slots],
        });
        Ok(handle)
    }

    fn bind_material_slot(&mut self, mesh: MeshHandle, slot: u32, material: MaterialHandle) -> SinkResult<()> {
        if material.0 >= self.materials.len() {
            return Err(unknown(MaterialHandle::KIND, material.0));
        }
        let mesh = self
            .meshes
            .get_mut(mesh.0)
            .ok_or_else(|| unknown(MeshHandle::KIND, mesh.0))?;
        let slot = slot as usize;
        if mesh.materials.len() <= slot {
            mesh.materials.resize(slot + 1, None);
        }
        mesh.materials[slot] = Some(material);
        Ok(())
    }

    fn create_node(&mut self, name: &str, mesh: Option<MeshHandle>, transform: Transform) -> SinkResult<NodeHandle> {
        if let Some(mesh) = mesh {
            if mesh.0 >= self.meshes.len() {
                return Err(unknown(MeshHandle::KIND, mesh.0));
            }
        }
        Ok(self.push_node(SceneNode {
            name: name.to_string(),
            transform,
            mesh,
            ..Default::default()
        }))
    }

    fn set_parent(&mut self, child: NodeHandle, parent: NodeHandle) -> SinkResult<()> {
        self.check_node(child)?;
        self.check_node(parent)?;

        // Reject links that would close a cycle.
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(SinkError::InvalidParent {
                    child: child.0,
                    parent: parent.0,
                });
            }
            cursor = self.nodes[current.0].parent;
        }

        if let Some(old) = self.nodes[child.0].parent.replace(parent) {
            self.nodes[old.0].children.retain(|&c| c != child);
        }
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    fn set_hidden(&mut self, node: NodeHandle, hidden: bool) -> SinkResult<()> {
        self.node_mut(node)?.hidden = hidden;
        Ok(())
    }

    fn set_instancing(&mut self, node: NodeHandle, mode: InstanceMode) -> SinkResult<()> {
        self.node_mut(node)?.instancing = Some(mode);
        Ok(())
    }

    fn create_instance_group(&mut self, name: &str) -> SinkResult<GroupHandle> {
        let handle = GroupHandle(self.groups.len());
        self.groups.push(InstanceGroup {
            name: name.to_string(),
            members: IndexSet::new(),
        });
        Ok(handle)
    }

    fn find_instance_group(&self, name: &str) -> Option<GroupHandle> {
        self.groups
            .iter()
            .position(|group| group.name == name)
            .map(GroupHandle)
    }

    fn link_node_to_group(&mut self, node: NodeHandle, group: GroupHandle) -> SinkResult<()> {
        self.check_node(node)?;
        let members = &mut self
            .groups
            .get_mut(group.0)
            .ok_or_else(|| unknown(GroupHandle::KIND, group.0))?
            .members;
        members.insert(node);
        self.nodes[node.0].member_of = Some(group);
        Ok(())
    }

    fn create_instance_reference(
        &mut self,
        name: &str,
        group: GroupHandle,
        transform: Transform,
    ) -> SinkResult<NodeHandle> {
        if group.0 >= self.groups.len() {
            return Err(unknown(GroupHandle::KIND, group.0));
        }
        Ok(self.push_node(SceneNode {
            name: name.to_string(),
            transform,
            instance_of: Some(group),
            ..Default::default()
        }))
    }

    fn create_camera(&mut self, camera: CameraData) -> SinkResult<CameraHandle> {
        let handle = CameraHandle(self.cameras.len());
        self.cameras.push(camera);
        Ok(handle)
    }

    fn set_active_camera(&mut self, camera: CameraHandle) -> SinkResult<()> {
        if camera.0 >= self.cameras.len() {
            return Err(unknown(CameraHandle::KIND, camera.0));
        }
        self.active_camera = Some(camera);
        Ok(())
    }
}

/// Iterator for traversing the scene graph.
struct SceneTraverser<'a> {
    graph: &'a SceneGraph,
    stack: Vec<(NodeHandle, Transform)>,
}

impl<'a> SceneTraverser<'a> {
    fn new(graph: &'a SceneGraph) -> Self {
        let roots: Vec<NodeHandle> = graph.roots().collect();
        let stack = roots
            .into_iter()
            .rev()
            .map(|handle| (handle, Transform::IDENTITY))
            .collect();
        Self { graph, stack }
    }
}

impl<'a> Iterator for SceneTraverser<'a> {
    type Item = (NodeHandle, &'a SceneNode, Transform);

    fn next(&mut self) -> Option<Self::Item> {
        let (handle, parent_world) = self.stack.pop()?;
        let node = self.graph.node(handle)?;
        let world = parent_world.compose(&node.transform);

        // Push children in reverse order for correct traversal order
        for &child in node.children.iter().rev() {
            self.stack.push((child, world));
        }

        Some((handle, node, world))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use glam::{DVec3, Vec4};

    fn triangle_mesh(name: &str) -> MeshData {
        MeshData {
            name: name.to_string(),
            positions: vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            triangles: vec![Triangle {
                indices: [0, 1, 2],
                material_slot: 0,
                smooth: false,
            }],
            uvs: None,
        }
    }

    #[test]
    fn test_parenting_and_traversal_order() {
        let mut graph = SceneGraph::new();
        let root = graph
            .create_node("root", None, Transform::from_translation(DVec3::X))
            .unwrap();
        let a = graph.create_node("a", None, Transform::from_translation(DVec3::Y)).unwrap();
        let b = graph.create_node("b", None, Transform::IDENTITY).unwrap();
        graph.set_parent(a, root).unwrap();
        graph.set_parent(b, root).unwrap();

        let order: Vec<&str> = graph.traverse().map(|(_, node, _)| node.name.as_str()).collect();
        assert_eq!(order, ["root", "a", "b"]);

        let (_, _, world) = graph.traverse().find(|(h, _, _)| *h == a).unwrap();
        assert_eq!(world.translation(), DVec3::new(1.0, 1.0, 0.0));
        assert_eq!(graph.world_transform(a), Some(world));
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a", None, Transform::IDENTITY).unwrap();
        let b = graph.create_node("b", None, Transform::IDENTITY).unwrap();
        graph.set_parent(b, a).unwrap();
        assert!(matches!(graph.set_parent(a, b), Err(SinkError::InvalidParent { .. })));
        assert!(graph.set_parent(a, a).is_err());
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a", None, Transform::IDENTITY).unwrap();
        let b = graph.create_node("b", None, Transform::IDENTITY).unwrap();
        let c = graph.create_node("c", None, Transform::IDENTITY).unwrap();
        graph.set_parent(c, a).unwrap();
        graph.set_parent(c, b).unwrap();
        assert!(graph.nodes[a.0].children.is_empty());
        assert_eq!(graph.nodes[b.0].children, vec![c]);
    }

    #[test]
    fn test_group_members_are_not_roots() {
        let mut graph = SceneGraph::new();
        let mesh = graph.create_mesh(triangle_mesh("seat")).unwrap();
        let member = graph.create_node("seat", Some(mesh), Transform::IDENTITY).unwrap();
        let group = graph.create_instance_group("Chair").unwrap();
        graph.link_node_to_group(member, group).unwrap();
        graph
            .create_instance_reference("C-Chair", group, Transform::from_translation(DVec3::new(10.0, 0.0, 0.0)))
            .unwrap();

        let roots: Vec<NodeHandle> = graph.roots().collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(graph.find_instance_group("Chair"), Some(group));
        assert_eq!(graph.references_to(group).count(), 1);

        let bounds = graph.compute_bounds();
        assert_eq!(bounds.min, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(bounds.max, DVec3::new(11.0, 1.0, 0.0));
    }

    #[test]
    fn test_material_slots_and_textures() {
        let mut graph = SceneGraph::new();
        let material = graph.create_material(MaterialDesc::new("Brick", Vec4::ONE)).unwrap();
        assert!(!graph.is_textured(material));
        let image = graph.create_image("brick.png", &[1, 2, 3]).unwrap();
        graph.bind_texture(material, image).unwrap();
        assert!(graph.is_textured(material));
        assert_eq!(graph.find_material("Brick"), Some(material));

        let mesh = graph.create_mesh(triangle_mesh("wall")).unwrap();
        graph.bind_material_slot(mesh, 0, material).unwrap();
        assert_eq!(graph.meshes[mesh.0].materials, vec![Some(material)]);
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut graph = SceneGraph::new();
        assert!(matches!(
            graph.create_image("missing.png", &[]),
            Err(SinkError::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_unknown_handles() {
        let mut graph = SceneGraph::new();
        assert!(graph.set_hidden(NodeHandle(3), true).is_err());
        assert!(graph.create_node("n", Some(MeshHandle(0)), Transform::IDENTITY).is_err());
        assert!(graph.set_active_camera(CameraHandle(0)).is_err());
    }
}
