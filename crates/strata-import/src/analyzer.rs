//! Component depth and usage analysis.

use crate::materials::DEFAULT_MATERIAL;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;
use strata_core::{
    DefinitionLike, EntitiesLike, GroupLike, ImportError, InstanceLike, LayerId, NodeLike, Result,
    SceneSource, Transform,
};

/// A component definition together with the material its faces inherit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComponentKey {
    pub component: String,
    pub material: String,
}

impl ComponentKey {
    pub fn new(component: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            material: material.into(),
        }
    }

    /// Name of the instance group written for this pair.
    pub fn group_name(&self) -> String {
        if self.material == DEFAULT_MATERIAL {
            self.component.clone()
        } else {
            format!("{} ({})", self.component, self.material)
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.component, self.material)
    }
}

/// World transforms at which each (component, material) pair occurs, in
/// first-seen order.
pub type ComponentStats = IndexMap<ComponentKey, Vec<Transform>>;

/// Role of an entities list in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// The model's root entities.
    Root,
    Group,
    Component,
}

/// Memoized nesting depth per component definition.
#[derive(Debug, Clone, Default)]
pub struct ComponentDepths {
    depths: IndexMap<String, usize>,
}

impl ComponentDepths {
    /// Depth of a definition; unknown names have depth 0.
    pub fn get(&self, component: &str) -> usize {
        self.depths.get(component).copied().unwrap_or(0)
    }

    pub fn max_depth(&self) -> usize {
        self.depths.values().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.depths.iter().map(|(name, &depth)| (name.as_str(), depth))
    }
}

/// Work items of the iterative depth computation.
enum DepthStep<'a, E> {
    /// Compute (or fetch) a definition's depth.
    Definition(&'a str),
    /// Store the value on top of the stack as the definition's depth.
    Finish(&'a str),
    /// Compute the depth of an entities list.
    Visit(&'a E),
    /// Fold the top `n` values into `1 + max`.
    Combine(usize),
}

/// Frame of the usage walk.
struct AnalyzeFrame<'a, E> {
    entities: &'a E,
    component: Option<&'a str>,
    transform: Transform,
    material: String,
}

/// Walks a source computing component depths and usage statistics.
pub struct EntityAnalyzer<'a, S: SceneSource> {
    source: &'a S,
    hidden_layers: &'a IndexSet<LayerId>,
    depths: ComponentDepths,
    in_progress: IndexSet<&'a str>,
}

impl<'a, S: SceneSource> EntityAnalyzer<'a, S> {
    pub fn new(source: &'a S, hidden_layers: &'a IndexSet<LayerId>) -> Self {
        Self {
            source,
            hidden_layers,
            depths: ComponentDepths::default(),
            in_progress: IndexSet::new(),
        }
    }

    /// Depth of every definition in the source.
    pub fn compute_depths(&mut self) -> Result<()> {
        let source = self.source;
        for def in source.definitions() {
            self.depth(def.name())?;
        }
        Ok(())
    }

    pub fn depths(&self) -> &ComponentDepths {
        &self.depths
    }

    pub fn into_depths(self) -> ComponentDepths {
        self.depths
    }

    /// Nesting depth of a component definition.
    ///
    /// A definition with no nested groups or instances has depth 0;
    /// otherwise its depth is one more than the deepest nested group or
    /// instance. Visibility does not affect depth.
    pub fn depth(&mut self, component: &str) -> Result<usize> {
        if let Some(&depth) = self.depths.depths.get(component) {
            return Ok(depth);
        }
        let source = self.source;
        let def = source
            .definition(component)
            .ok_or_else(|| ImportError::UndefinedComponent {
                name: component.to_string(),
            })?;

        let mut steps: Vec<DepthStep<'a, S::Entities>> = vec![DepthStep::Definition(def.name())];
        let mut values: Vec<usize> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                DepthStep::Definition(name) => {
                    if let Some(&depth) = self.depths.depths.get(name) {
                        values.push(depth);
                        continue;
                    }
                    if let Some(start) = self.in_progress.get_index_of(name) {
                        let mut cycle: Vec<String> = self
                            .in_progress
                            .iter()
                            .skip(start)
                            .map(|n| n.to_string())
                            .collect();
                        cycle.push(name.to_string());
                        self.in_progress.clear();
                        return Err(ImportError::CyclicDefinition { cycle });
                    }
                    let def = source
                        .definition(name)
                        .ok_or_else(|| ImportError::UndefinedComponent {
                            name: name.to_string(),
                        })?;
                    self.in_progress.insert(def.name());
                    steps.push(DepthStep::Finish(def.name()));
                    steps.push(DepthStep::Visit(def.entities()));
                }
                DepthStep::Finish(name) => {
                    let depth = values.last().copied().unwrap_or(0);
                    self.in_progress.shift_remove(name);
                    self.depths.depths.insert(name.to_string(), depth);
                }
                DepthStep::Visit(entities) => {
                    let children = entities.groups().len() + entities.instances().len();
                    if children == 0 {
                        values.push(0);
                        continue;
                    }
                    steps.push(DepthStep::Combine(children));
                    for group in entities.groups() {
                        steps.push(DepthStep::Visit(group.entities()));
                    }
                    for instance in entities.instances() {
                        steps.push(DepthStep::Definition(instance.definition_name()));
                    }
                }
                DepthStep::Combine(count) => {
                    let split = values.len().saturating_sub(count);
                    let deepest = values.drain(split..).max().unwrap_or(0);
                    values.push(deepest + 1);
                }
            }
        }

        Ok(values.pop().unwrap_or(0))
    }

    /// Collect the world transforms of every component occurrence below
    /// `entities`.
    ///
    /// Entities on hidden layers are skipped together with their subtrees.
    /// Hidden flags are not consulted, and nothing is skipped because of
    /// later deduplication decisions.
    pub fn analyze(
        &mut self,
        entities: &'a S::Entities,
        component: Option<&'a str>,
        transform: Transform,
        default_material: &str,
    ) -> Result<ComponentStats> {
        let source = self.source;
        let mut stats = ComponentStats::new();
        let mut stack = vec![AnalyzeFrame {
            entities,
            component,
            transform,
            material: default_material.to_string(),
        }];

        while let Some(frame) = stack.pop() {
            if let Some(component) = frame.component {
                stats
                    .entry(ComponentKey::new(component, frame.material.as_str()))
                    .or_default()
                    .push(frame.transform);
            }

            let mut children = Vec::new();
            for group in frame.entities.groups() {
                if self.hidden_layers.contains(group.layer()) {
                    continue;
                }
                children.push(AnalyzeFrame {
                    entities: group.entities(),
                    component: None,
                    transform: frame.transform.compose(&group.transform()),
                    material: group.material().unwrap_or(frame.material.as_str()).to_string(),
                });
            }
            for instance in frame.entities.instances() {
                if self.hidden_layers.contains(instance.layer()) {
                    continue;
                }
                // Validates the reference and rules out cycles before descending.
                self.depth(instance.definition_name())?;
                let def = source
                    .definition(instance.definition_name())
                    .ok_or_else(|| ImportError::UndefinedComponent {
                        name: instance.definition_name().to_string(),
                    })?;
                children.push(AnalyzeFrame {
                    entities: def.entities(),
                    component: Some(def.name()),
                    transform: frame.transform.compose(&instance.transform()),
                    material: instance.material().unwrap_or(frame.material.as_str()).to_string(),
                });
            }
            // Push in reverse so children are visited in source order.
            stack.extend(children.into_iter().rev());
        }

        Ok(stats)
    }

    /// Analyze the whole model from its root entities.
    pub fn analyze_root(&mut self) -> Result<ComponentStats> {
        let source = self.source;
        self.analyze(source.entities(), None, Transform::IDENTITY, DEFAULT_MATERIAL)
    }
}
