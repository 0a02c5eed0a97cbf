//! The scene sink interface.

use crate::camera::CameraData;
use crate::geometry::MeshData;
use crate::handle::{CameraHandle, GroupHandle, ImageHandle, MaterialHandle, MeshHandle, NodeHandle};
use crate::material::MaterialDesc;
use serde::{Deserialize, Serialize};
use strata_core::{SinkError, Transform};

/// Result type for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// How a node replicates its children over its own mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceMode {
    /// One copy of each child per mesh vertex.
    Vertices,
    /// One copy of each child per mesh face, oriented by the face.
    Faces,
}

/// Receiver of a flattened scene.
///
/// Transforms passed to `create_node` and `create_instance_reference` are
/// local to the node's eventual parent, or world transforms for roots and
/// instance group members.
pub trait SceneSink {
    fn create_material(&mut self, material: MaterialDesc) -> SinkResult<MaterialHandle>;

    /// Look up a material created earlier (or pre-existing) by name.
    fn find_material(&self, name: &str) -> Option<MaterialHandle>;

    /// Register an encoded image.
    fn create_image(&mut self, name: &str, data: &[u8]) -> SinkResult<ImageHandle>;

    fn bind_texture(&mut self, material: MaterialHandle, image: ImageHandle) -> SinkResult<()>;

    fn is_textured(&self, material: MaterialHandle) -> bool;

    fn create_mesh(&mut self, mesh: MeshData) -> SinkResult<MeshHandle>;

    fn bind_material_slot(&mut self, mesh: MeshHandle, slot: u32, material: MaterialHandle) -> SinkResult<()>;

    fn create_node(&mut self, name: &str, mesh: Option<MeshHandle>, transform: Transform) -> SinkResult<NodeHandle>;

    fn set_parent(&mut self, child: NodeHandle, parent: NodeHandle) -> SinkResult<()>;

    /// Hide a node in interactive views. Rendering is unaffected.
    fn set_hidden(&mut self, node: NodeHandle, hidden: bool) -> SinkResult<()>;

    fn set_instancing(&mut self, node: NodeHandle, mode: InstanceMode) -> SinkResult<()>;

    fn create_instance_group(&mut self, name: &str) -> SinkResult<GroupHandle>;

    fn find_instance_group(&self, name: &str) -> Option<GroupHandle>;

    fn link_node_to_group(&mut self, node: NodeHandle, group: GroupHandle) -> SinkResult<()>;

    /// Create a node that displays a whole instance group.
    fn create_instance_reference(
        &mut self,
        name: &str,
        group: GroupHandle,
        transform: Transform,
    ) -> SinkResult<NodeHandle>;

    fn create_camera(&mut self, camera: CameraData) -> SinkResult<CameraHandle>;

    fn set_active_camera(&mut self, camera: CameraHandle) -> SinkResult<()>;
}
