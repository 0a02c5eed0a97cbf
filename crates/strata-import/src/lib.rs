//! Hierarchical scene import with component deduplication.
//!
//! An import walks a [`SceneSource`] and writes it into a [`SceneSink`]:
//!
//! 1. Cameras and materials are created in the sink.
//! 2. Every component definition gets a nesting depth, and every
//!    (component, material) pair is mapped to the world transforms it
//!    occurs at.
//! 3. Pairs used at least `min_instance_threshold` times are shared. Depth-1
//!    components are instanced from point clouds (or billboard quads);
//!    deeper ones become instance groups referenced by lightweight nodes.
//! 4. Everything else is written as a node hierarchy.
//!
//! ```no_run
//! use strata_import::{import, read_model_file, ImportOptions};
//! use strata_scene::SceneGraph;
//!
//! let model = read_model_file("house.json")?;
//! let mut scene = SceneGraph::new();
//! let report = import(&model, &mut scene, &ImportOptions::default().with_threshold(2))?;
//! println!("{} nodes, {} instance groups", report.nodes, report.groups_written);
//! # Ok::<(), strata_core::ImportError>(())
//! ```

pub mod analyzer;
pub mod camera;
pub mod dedup;
pub mod materials;
pub mod mesh;
pub mod observer;
pub mod options;
pub mod reader;
pub mod session;
pub mod writer;

pub use analyzer::{ComponentDepths, ComponentKey, ComponentStats, EntityAnalyzer, EntityKind};
pub use camera::{CameraBasis, CameraProjector};
pub use dedup::{cluster_by_orientation, ComponentSkip, DedupPlan, InstanceDeduplicator, OrientationCluster};
pub use materials::{MaterialTable, DEFAULT_MATERIAL};
pub use mesh::{MeshBuilder, MeshKey};
pub use observer::{ImportObserver, ImportPhase, ImportWarning, LogObserver, NoopObserver, RecordingObserver};
pub use options::{ImportOptions, InstancingStyle};
pub use reader::{read_model_file, JsonModelReader, ModelReader, ReaderRegistry};
pub use session::{ImportReport, ImportSession};

use strata_core::{Result, SceneSource};
use strata_scene::SceneSink;

/// Import `source` into `sink` without progress notifications.
///
/// Warnings are still collected in the returned report.
pub fn import<S: SceneSource, K: SceneSink>(
    source: &S,
    sink: &mut K,
    options: &ImportOptions,
) -> Result<ImportReport> {
    import_with_observer(source, sink, options, &mut NoopObserver)
}

/// Import `source` into `sink`, reporting progress to `observer`.
pub fn import_with_observer<S: SceneSource, K: SceneSink>(
    source: &S,
    sink: &mut K,
    options: &ImportOptions,
    observer: &mut dyn ImportObserver,
) -> Result<ImportReport> {
    ImportSession::begin(source, sink, options, observer)?.run()
}
