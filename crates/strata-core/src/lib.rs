//! Core types for the strata scene importer.
//!
//! This crate provides the foundational types shared by the other strata crates:
//! - `Transform`, an affine 4x4 matrix with composition and decomposition
//! - sRGB color conversion for imported materials
//! - The source scene model (entities, groups, instances, faces, definitions)
//! - Capability traits the importer uses to walk any source
//! - Error types

pub mod color;
pub mod errors;
pub mod model;
pub mod source;
pub mod transform;

pub use color::*;
pub use errors::*;
pub use model::*;
pub use source::*;
pub use transform::*;
