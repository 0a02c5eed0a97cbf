//! The import session: one pass over one source into one sink.

use crate::analyzer::EntityAnalyzer;
use crate::camera::{CameraProjector, LAST_VIEW};
use crate::dedup::{ComponentSkip, InstanceDeduplicator};
use crate::materials::MaterialTable;
use crate::mesh::MeshBuilder;
use crate::observer::{ImportObserver, ImportPhase, ImportWarning};
use crate::options::ImportOptions;
use indexmap::IndexSet;
use serde::Serialize;
use std::time::Instant;
use strata_core::{LayerId, Result, SceneSource};
use strata_scene::{NodeHandle, SceneSink};

/// Counters describing a finished import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Component definitions in the source.
    pub definitions: usize,
    /// Deepest component nesting.
    pub max_depth: usize,
    /// Distinct (component, material) pairs found by analysis.
    pub component_pairs: usize,
    /// Component occurrences found by analysis.
    pub occurrences: usize,
    pub materials: usize,
    pub cameras: usize,
    pub meshes_built: usize,
    pub mesh_cache_hits: usize,
    pub nodes: usize,
    pub groups_written: usize,
    pub groups_reused: usize,
    pub references: usize,
    pub clusters: usize,
    /// Occurrences replaced by instancers.
    pub instanced: usize,
    pub warnings: Vec<ImportWarning>,
}

/// State shared by every phase of one import.
///
/// Created by [`ImportSession::begin`], which imports cameras and
/// materials; [`ImportSession::run`] performs analysis, deduplication and
/// the write passes.
pub struct ImportSession<'a, S: SceneSource, K: SceneSink> {
    pub(crate) source: &'a S,
    pub(crate) sink: &'a mut K,
    pub(crate) options: &'a ImportOptions,
    pub(crate) observer: &'a mut dyn ImportObserver,
    pub(crate) hidden_layers: IndexSet<LayerId>,
    pub(crate) materials: MaterialTable,
    pub(crate) meshes: MeshBuilder,
    pub(crate) skip: ComponentSkip,
    pub(crate) report: ImportReport,
}

impl<'a, S: SceneSource, K: SceneSink> ImportSession<'a, S, K> {
    /// Start an import: resolve the hidden layer set, then import cameras
    /// and materials.
    pub fn begin(
        source: &'a S,
        sink: &'a mut K,
        options: &'a ImportOptions,
        observer: &'a mut dyn ImportObserver,
    ) -> Result<Self> {
        let mut report = ImportReport::default();
        let mut hidden_layers = options.hidden_layers.clone();
        if let Some(name) = &options.import_scene {
            if let Some(scene) = source.scenes().iter().find(|scene| &scene.name == name) {
                hidden_layers.extend(scene.hidden_layers.iter().cloned());
            }
        }

        let started = Instant::now();
        report.cameras = import_cameras(source, sink, options, &mut *observer, &mut report.warnings)?;
        observer.phase_finished(ImportPhase::Cameras, started.elapsed());

        let started = Instant::now();
        let mut recorder = WarningRecorder {
            inner: &mut *observer,
            warnings: &mut report.warnings,
        };
        let materials = MaterialTable::import(source.materials(), sink, options, &mut recorder)?;
        report.materials = source.materials().len();
        observer.phase_finished(ImportPhase::Materials, started.elapsed());

        Ok(Self {
            source,
            sink,
            options,
            observer,
            hidden_layers,
            materials,
            meshes: MeshBuilder::new(),
            skip: ComponentSkip::default(),
            report,
        })
    }

    /// Layers excluded from this import, including those hidden by the
    /// imported scene.
    pub fn hidden_layers(&self) -> &IndexSet<LayerId> {
        &self.hidden_layers
    }

    /// Run the remaining phases and return the report.
    pub fn run(mut self) -> Result<ImportReport> {
        let source = self.source;

        let started = Instant::now();
        let mut analyzer = EntityAnalyzer::new(source, &self.hidden_layers);
        analyzer.compute_depths()?;
        let stats = analyzer.analyze_root()?;
        let depths = analyzer.into_depths();
        self.report.definitions = source.definitions().len();
        self.report.max_depth = depths.max_depth();
        self.report.component_pairs = stats.len();
        self.report.occurrences = stats.values().map(Vec::len).sum();
        log::debug!(
            "Analyzed {} definitions, {} component pairs, max depth {}",
            self.report.definitions,
            self.report.component_pairs,
            self.report.max_depth
        );
        self.observer.phase_finished(ImportPhase::Analysis, started.elapsed());

        let started = Instant::now();
        let plan = InstanceDeduplicator::new(self.options.threshold()).plan(&stats, &depths);
        drop(stats);
        for candidate in &plan.grouped {
            let group = self.write_instance_group(&candidate.key)?;
            self.skip.insert(candidate.key.clone(), group);
        }
        self.observer.phase_finished(ImportPhase::Deduplication, started.elapsed());

        if self.options.groups_only {
            log::debug!("Stopping after {} instance groups", self.skip.len());
            return Ok(self.finish());
        }

        let started = Instant::now();
        let pending = self.write_hierarchy(&plan.deferred)?;
        self.observer.phase_finished(ImportPhase::Write, started.elapsed());

        let started = Instant::now();
        self.write_clusters(pending)?;
        self.observer.phase_finished(ImportPhase::Clustering, started.elapsed());

        Ok(self.finish())
    }

    fn finish(mut self) -> ImportReport {
        self.report.meshes_built = self.meshes.built();
        self.report.mesh_cache_hits = self.meshes.cache_hits();
        self.report
    }

    /// Report a warning to the observer and keep it for the report.
    pub(crate) fn warn(&mut self, warning: ImportWarning) {
        self.observer.warning(&warning);
        self.report.warnings.push(warning);
    }

    /// Create a node, parent it and count it.
    pub(crate) fn add_node(
        &mut self,
        name: &str,
        mesh: Option<strata_scene::MeshHandle>,
        transform: strata_core::Transform,
        parent: Option<NodeHandle>,
    ) -> Result<NodeHandle> {
        let node = self.sink.create_node(name, mesh, transform)?;
        if let Some(parent) = parent {
            self.sink.set_parent(node, parent)?;
        }
        self.report.nodes += 1;
        Ok(node)
    }
}

/// Forwards warnings to another observer and records them.
pub(crate) struct WarningRecorder<'o> {
    pub(crate) inner: &'o mut dyn ImportObserver,
    pub(crate) warnings: &'o mut Vec<ImportWarning>,
}

impl ImportObserver for WarningRecorder<'_> {
    fn warning(&mut self, warning: &ImportWarning) {
        self.inner.warning(warning);
        self.warnings.push(warning.clone());
    }
}

fn import_cameras<S: SceneSource, K: SceneSink>(
    source: &S,
    sink: &mut K,
    options: &ImportOptions,
    observer: &mut dyn ImportObserver,
    warnings: &mut Vec<ImportWarning>,
) -> Result<usize> {
    let projector = CameraProjector::new(options.viewport_aspect_ratio, options.camera_far_plane);

    // A named scene replaces the per-scene cameras and always imports a view.
    let mut import_camera = options.import_camera;
    let mut scenes_as_cameras = options.scenes_as_cameras;
    if let Some(name) = &options.import_scene {
        if let Some(scene) = source.scenes().iter().find(|scene| &scene.name == name) {
            let camera = sink.create_camera(projector.camera_data(&scene.name, &scene.camera))?;
            sink.set_active_camera(camera)?;
            return Ok(1);
        }
        let warning = ImportWarning::UnknownScene { name: name.clone() };
        observer.warning(&warning);
        warnings.push(warning);
        import_camera = true;
        scenes_as_cameras = false;
    }

    let mut count = 0;
    if scenes_as_cameras {
        for scene in source.scenes() {
            sink.create_camera(projector.camera_data(&scene.name, &scene.camera))?;
            count += 1;
        }
    }
    if import_camera {
        if let Some(camera) = source.active_camera() {
            let handle = sink.create_camera(projector.camera_data(LAST_VIEW, camera))?;
            sink.set_active_camera(handle)?;
            count += 1;
        }
    }
    Ok(count)
}
