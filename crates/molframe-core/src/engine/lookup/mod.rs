//! Spatial indices: a per-unit uniform grid and a structure-wide index over unit bounds.

pub mod grid;
pub mod structure;

pub use grid::{GridLookup3D, LookupResult};
pub use structure::{StructureLookup3D, StructureLookupResult};
