//! Flattened scene output for the strata importer.
//!
//! The importer writes into any [`SceneSink`]. [`SceneGraph`] is the
//! in-memory sink: an arena of nodes, meshes, materials, images, instance
//! groups and cameras that can be traversed or serialized to JSON.

pub mod camera;
pub mod geometry;
pub mod graph;
pub mod handle;
pub mod material;
pub mod sink;

pub use camera::*;
pub use geometry::*;
pub use graph::*;
pub use handle::*;
pub use material::*;
pub use sink::*;

pub use strata_core::SinkError;
