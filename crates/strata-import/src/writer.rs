//! Writing entities into the sink: instance groups, the node hierarchy and
//! instancers for deferred components.

use crate::analyzer::{ComponentKey, ComponentStats, EntityKind};
use crate::dedup::cluster_by_orientation;
use crate::materials::DEFAULT_MATERIAL;
use crate::mesh::MeshKey;
use crate::observer::ImportWarning;
use crate::options::InstancingStyle;
use crate::session::{ImportSession, WarningRecorder};
use indexmap::IndexSet;
use strata_core::{
    DefinitionLike, EntitiesLike, FaceLike, GroupLike, ImportError, InstanceLike, NodeLike, Result,
    SceneSource, Transform,
};
use strata_scene::{GroupHandle, InstanceMode, MeshHandle, NodeHandle, SceneSink};

/// Name of the node holding the model's root geometry.
pub const ROOT_NODE_NAME: &str = "_(Loose Entity)";

/// Node name of a group.
pub fn group_node_name(name: &str) -> String {
    format!("G-{name}")
}

/// Node name of a component instance.
pub fn instance_node_name(instance: &str, definition: &str) -> String {
    if instance.is_empty() {
        format!("C-{definition}")
    } else {
        format!("{instance} (C-{definition})")
    }
}

/// Name of the child carrying an organizational node's own geometry.
pub fn loose_mesh_name(name: &str) -> String {
    format!("_{name} (Loose Mesh)")
}

/// Name of the instancer written for a deferred component.
pub fn instancer_name(definition: &str) -> String {
    format!("DUPLI-{definition}")
}

/// A pending entities list in the hierarchy walk.
struct WriteFrame<'s, E> {
    entities: &'s E,
    name: String,
    /// Mesh cache path: definition name for components, parent path plus
    /// child index for groups.
    mesh_path: String,
    component: Option<&'s str>,
    kind: EntityKind,
    world: Transform,
    material: String,
    /// Parent node and its world transform.
    parent: Option<(NodeHandle, Transform)>,
    /// Write this component in place even if it was grouped or deferred.
    inline: bool,
}

impl<E> WriteFrame<'_, E> {
    fn local(&self, world: &Transform) -> Transform {
        match &self.parent {
            Some((_, parent_world)) => world.relative_to(parent_world),
            None => *world,
        }
    }

    fn component_key(&self) -> Option<ComponentKey> {
        match (self.component, self.inline) {
            (Some(component), false) => Some(ComponentKey::new(component, self.material.as_str())),
            _ => None,
        }
    }
}

/// A pending entities list inside an instance group.
struct GroupFrame<'s, E> {
    entities: &'s E,
    name: String,
    mesh_path: String,
    component: Option<&'s str>,
    /// Transform relative to the group origin.
    local: Transform,
    material: String,
    outermost: bool,
}

impl<'a, S: SceneSource, K: SceneSink> ImportSession<'a, S, K> {
    fn excluded<N: NodeLike>(&self, node: &N) -> bool {
        node.is_hidden() || self.hidden_layers.contains(node.layer())
    }

    fn build_mesh<F: FaceLike>(&mut self, faces: &[F], key: MeshKey, display_name: &str) -> Result<Option<MeshHandle>> {
        let mut recorder = WarningRecorder {
            inner: &mut *self.observer,
            warnings: &mut self.report.warnings,
        };
        self.meshes
            .build(&mut *self.sink, &mut self.materials, &mut recorder, faces, key, display_name)
    }

    fn definition_of(&self, name: &str) -> Result<&'a S::Definition> {
        let source = self.source;
        source
            .definition(name)
            .ok_or_else(|| ImportError::UndefinedComponent { name: name.to_string() })
    }

    /// Materialize a (component, material) pair as an instance group.
    ///
    /// The group holds the definition's geometry at group-space transforms.
    /// Nested pairs that already have a group become references to it;
    /// other nested components are written in place. With
    /// `reuse_existing_groups`, a group of the same name already in the sink
    /// is returned instead.
    pub(crate) fn write_instance_group(&mut self, key: &ComponentKey) -> Result<GroupHandle> {
        let group_name = key.group_name();
        if self.options.reuse_existing_groups {
            if let Some(existing) = self.sink.find_instance_group(&group_name) {
                self.observer.component_grouped(&key.component, &key.material, true);
                self.report.groups_reused += 1;
                return Ok(existing);
            }
        }

        let group = self.sink.create_instance_group(&group_name)?;
        let def = self.definition_of(&key.component)?;
        let mut stack = vec![GroupFrame {
            entities: def.entities(),
            name: def.name().to_string(),
            mesh_path: def.name().to_string(),
            component: Some(def.name()),
            local: Transform::IDENTITY,
            material: key.material.clone(),
            outermost: true,
        }];

        while let Some(frame) = stack.pop() {
            if let (Some(component), false) = (frame.component, frame.outermost) {
                if let Some(nested) = self.skip.get(&ComponentKey::new(component, frame.material.as_str())) {
                    let node = self.sink.create_instance_reference(&frame.name, nested, frame.local)?;
                    self.sink.link_node_to_group(node, group)?;
                    self.report.nodes += 1;
                    self.report.references += 1;
                    continue;
                }
            }

            let mesh = self.build_mesh(
                frame.entities.faces(),
                MeshKey::new(frame.mesh_path.as_str(), frame.material.as_str()),
                &frame.name,
            )?;
            if let Some(mesh) = mesh {
                let node = self.add_node(&frame.name, Some(mesh), frame.local, None)?;
                self.sink.link_node_to_group(node, group)?;
            }

            let mut children = Vec::new();
            for (index, child) in frame.entities.groups().iter().enumerate() {
                if self.excluded(child) {
                    continue;
                }
                children.push(GroupFrame {
                    entities: child.entities(),
                    name: group_node_name(child.name()),
                    mesh_path: format!("{}/{index}", frame.mesh_path),
                    component: None,
                    local: frame.local.compose(&child.transform()),
                    material: child.material().unwrap_or(frame.material.as_str()).to_string(),
                    outermost: false,
                });
            }
            for instance in frame.entities.instances() {
                if self.excluded(instance) {
                    continue;
                }
                let def = self.definition_of(instance.definition_name())?;
                children.push(GroupFrame {
                    entities: def.entities(),
                    name: def.name().to_string(),
                    mesh_path: def.name().to_string(),
                    component: Some(def.name()),
                    local: frame.local.compose(&instance.transform()),
                    material: instance.material().unwrap_or(frame.material.as_str()).to_string(),
                    outermost: false,
                });
            }
            stack.extend(children.into_iter().rev());
        }

        self.observer.component_grouped(&key.component, &key.material, false);
        self.report.groups_written += 1;
        Ok(group)
    }

    /// Write the model's node hierarchy.
    ///
    /// Returns the world transforms of deferred pairs, for clustering.
    pub(crate) fn write_hierarchy(&mut self, deferred: &IndexSet<ComponentKey>) -> Result<ComponentStats> {
        let source = self.source;
        let mut pending = ComponentStats::new();
        self.write_tree(
            WriteFrame {
                entities: source.entities(),
                name: ROOT_NODE_NAME.to_string(),
                mesh_path: String::new(),
                component: None,
                kind: EntityKind::Root,
                world: Transform::IDENTITY,
                material: DEFAULT_MATERIAL.to_string(),
                parent: None,
                inline: false,
            },
            deferred,
            &mut pending,
        )?;
        Ok(pending)
    }

    /// Write `root` and everything below it. Returns the first node created.
    fn write_tree(
        &mut self,
        root: WriteFrame<'a, S::Entities>,
        deferred: &IndexSet<ComponentKey>,
        pending: &mut ComponentStats,
    ) -> Result<Option<NodeHandle>> {
        let mut first = None;
        let mut stack = vec![root];

        while let Some(frame) = stack.pop() {
            if let Some(key) = frame.component_key() {
                if let Some(group) = self.skip.get(&key) {
                    let node = self
                        .sink
                        .create_instance_reference(&frame.name, group, frame.local(&frame.world))?;
                    if let Some((parent, _)) = frame.parent {
                        self.sink.set_parent(node, parent)?;
                    }
                    self.report.nodes += 1;
                    self.report.references += 1;
                    first.get_or_insert(node);
                    continue;
                }
                if deferred.contains(&key) {
                    pending.entry(key).or_default().push(frame.world);
                    continue;
                }
            }

            let faces = frame.entities.faces();
            let mesh = self.build_mesh(
                faces,
                MeshKey::new(frame.mesh_path.as_str(), frame.material.as_str()),
                &frame.name,
            )?;
            let has_children = frame.entities.has_children();
            let parent = frame.parent.map(|(node, _)| node);

            let (node, node_world) = if !has_children || frame.kind == EntityKind::Root {
                if mesh.is_none() && !has_children {
                    self.warn(ImportWarning::EmptyGeometry {
                        name: frame.name.clone(),
                    });
                }
                let node = self.add_node(&frame.name, mesh, frame.local(&frame.world), parent)?;
                (node, frame.world)
            } else {
                // Organizational node at the entity's location only; its own
                // geometry hangs below it.
                let empty_world = frame.world.translation_only();
                let node = self.add_node(&frame.name, None, frame.local(&empty_world), parent)?;
                self.sink.set_hidden(node, true)?;
                if let Some(mesh) = mesh {
                    self.add_node(
                        &loose_mesh_name(&frame.name),
                        Some(mesh),
                        frame.world.relative_to(&empty_world),
                        Some(node),
                    )?;
                }
                (node, empty_world)
            };
            first.get_or_insert(node);

            // Children of the root are scene roots themselves.
            let child_parent = match frame.kind {
                EntityKind::Root => None,
                _ => Some((node, node_world)),
            };
            let mut children = Vec::new();
            for (index, group) in frame.entities.groups().iter().enumerate() {
                if self.excluded(group) {
                    continue;
                }
                children.push(WriteFrame {
                    entities: group.entities(),
                    name: group_node_name(group.name()),
                    mesh_path: format!("{}/{index}", frame.mesh_path),
                    component: None,
                    kind: EntityKind::Group,
                    world: frame.world.compose(&group.transform()),
                    material: group.material().unwrap_or(frame.material.as_str()).to_string(),
                    parent: child_parent,
                    inline: false,
                });
            }
            for instance in frame.entities.instances() {
                if self.excluded(instance) {
                    continue;
                }
                let def = self.definition_of(instance.definition_name())?;
                children.push(WriteFrame {
                    entities: def.entities(),
                    name: instance_node_name(instance.name(), def.name()),
                    mesh_path: def.name().to_string(),
                    component: Some(def.name()),
                    kind: EntityKind::Component,
                    world: frame.world.compose(&instance.transform()),
                    material: instance.material().unwrap_or(frame.material.as_str()).to_string(),
                    parent: child_parent,
                    inline: false,
                });
            }
            stack.extend(children.into_iter().rev());
        }

        Ok(first)
    }

    /// Write one instancer per orientation cluster of every deferred pair,
    /// each with the component's geometry as its prototype child.
    pub(crate) fn write_clusters(&mut self, pending: ComponentStats) -> Result<()> {
        let style = self.options.instancing_style;
        let mode = match style {
            InstancingStyle::PointCloud => InstanceMode::Vertices,
            InstancingStyle::BillboardQuad => InstanceMode::Faces,
        };
        let no_deferred = IndexSet::new();

        for (key, transforms) in pending {
            let def = self.definition_of(&key.component)?;
            let clusters = cluster_by_orientation(&transforms);
            log::debug!(
                "{key}: {} occurrences in {} orientation clusters",
                transforms.len(),
                clusters.len()
            );

            for cluster in clusters {
                let name = instancer_name(def.name());
                let data = cluster.instancer_mesh(&name, style);
                let has_faces = !data.triangles.is_empty();
                let mesh = self.sink.create_mesh(data)?;
                if has_faces {
                    self.sink
                        .bind_material_slot(mesh, 0, self.materials.default_handle())?;
                }

                let origin = Transform::from_translation(cluster.origin());
                let instancer = self.add_node(&name, Some(mesh), origin, None)?;
                self.sink.set_instancing(instancer, mode)?;

                let prototype = WriteFrame {
                    entities: def.entities(),
                    name: instance_node_name("", def.name()),
                    mesh_path: def.name().to_string(),
                    component: Some(def.name()),
                    kind: EntityKind::Component,
                    world: origin.compose(&cluster.prototype_transform(style)),
                    material: key.material.clone(),
                    parent: Some((instancer, origin)),
                    inline: true,
                };
                let mut scratch = ComponentStats::new();
                self.write_tree(prototype, &no_deferred, &mut scratch)?;

                self.observer
                    .cluster_written(&key.component, &key.material, cluster.len());
                self.report.clusters += 1;
                self.report.instanced += cluster.len();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_names() {
        assert_eq!(group_node_name("Walls"), "G-Walls");
        assert_eq!(instance_node_name("", "Chair"), "C-Chair");
        assert_eq!(instance_node_name("Left", "Chair"), "Left (C-Chair)");
        assert_eq!(loose_mesh_name("G-Walls"), "_G-Walls (Loose Mesh)");
        assert_eq!(instancer_name("Leaf"), "DUPLI-Leaf");
    }
}
