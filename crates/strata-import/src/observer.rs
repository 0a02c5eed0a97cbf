//! Progress and diagnostics reporting.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Import pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Cameras,
    Materials,
    Analysis,
    Deduplication,
    Write,
    Clustering,
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportPhase::Cameras => "cameras",
            ImportPhase::Materials => "materials",
            ImportPhase::Analysis => "analysis",
            ImportPhase::Deduplication => "deduplication",
            ImportPhase::Write => "write",
            ImportPhase::Clustering => "clustering",
        };
        f.write_str(name)
    }
}

/// A recoverable problem. The import continues after reporting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    /// A leaf entity had no geometry and was written as an empty node.
    EmptyGeometry { name: String },
    /// A face referenced a material the source does not define.
    UnresolvedMaterial { name: String },
    /// A texture image was missing or rejected; the material stays untextured.
    MissingTexture { material: String, texture: String },
    /// The requested scene preset does not exist.
    UnknownScene { name: String },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::EmptyGeometry { name } => write!(f, "{name} has no geometry"),
            ImportWarning::UnresolvedMaterial { name } => {
                write!(f, "material '{name}' is not defined, using the default material")
            }
            ImportWarning::MissingTexture { material, texture } => {
                write!(f, "texture '{texture}' of material '{material}' could not be loaded")
            }
            ImportWarning::UnknownScene { name } => write!(f, "scene '{name}' does not exist"),
        }
    }
}

/// Receives progress notifications during an import.
///
/// Every method has an empty default, so implementors override only what
/// they need.
pub trait ImportObserver {
    fn phase_finished(&mut self, _phase: ImportPhase, _elapsed: Duration) {}

    /// A (component, material) pair was written as a shared instance group.
    fn component_grouped(&mut self, _component: &str, _material: &str, _reused: bool) {}

    /// A cluster of identically oriented occurrences was instanced.
    fn cluster_written(&mut self, _component: &str, _material: &str, _occurrences: usize) {}

    fn warning(&mut self, _warning: &ImportWarning) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ImportObserver for NoopObserver {}

/// Observer that forwards notifications to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ImportObserver for LogObserver {
    fn phase_finished(&mut self, phase: ImportPhase, elapsed: Duration) {
        log::info!("{phase} finished in {:.4} sec.", elapsed.as_secs_f64());
    }

    fn component_grouped(&mut self, component: &str, material: &str, reused: bool) {
        if reused {
            log::info!("Group {component} ({material}) already defined");
        } else {
            log::info!("Component {component} ({material}) written as group");
        }
    }

    fn cluster_written(&mut self, component: &str, material: &str, occurrences: usize) {
        log::debug!("Instancing {component} ({material}) {occurrences} times");
    }

    fn warning(&mut self, warning: &ImportWarning) {
        log::warn!("{warning}");
    }
}

/// Observer that records every notification, for inspection after an import.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub phases: Vec<ImportPhase>,
    pub grouped: Vec<(String, String, bool)>,
    pub clusters: Vec<(String, String, usize)>,
    pub warnings: Vec<ImportWarning>,
}

impl ImportObserver for RecordingObserver {
    fn phase_finished(&mut self, phase: ImportPhase, _elapsed: Duration) {
        self.phases.push(phase);
    }

    fn component_grouped(&mut self, component: &str, material: &str, reused: bool) {
        self.grouped.push((component.to_string(), material.to_string(), reused));
    }

    fn cluster_written(&mut self, component: &str, material: &str, occurrences: usize) {
        self.clusters.push((component.to_string(), material.to_string(), occurrences));
    }

    fn warning(&mut self, warning: &ImportWarning) {
        self.warnings.push(warning.clone());
    }
}
