//! # Structure
//!
//! Units, the structures assembled from them, and the builders and set operations that derive
//! new structures from existing ones.
//!
//! ## Key Components
//!
//! - [`unit`] - [`Unit`](unit::Unit): an element set of one model placed by a symmetry
//!   operator, with memoized boundary, lookup, bonds and rings
//! - [`structure`] - [`Structure`](structure::Structure): units ordered by id plus memoized
//!   structure-wide data
//! - [`builder`] - Structure and subset builders
//! - [`set_ops`] - Union, intersection, subtraction and comparisons
//! - [`groups`] - Symmetry and transform grouping of units
//! - [`location`] - Per-element property access

pub mod builder;
pub mod groups;
pub mod location;
pub mod set_ops;
#[allow(clippy::module_inception)]
pub mod structure;
pub mod unit;

pub use builder::{StructureBuilder, StructureSubsetBuilder, SubsetMode};
pub use location::Location;
pub use structure::Structure;
pub use unit::{Unit, UnitKind};
