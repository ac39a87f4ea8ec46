//! # Query Module
//!
//! The selection algebra over [`Structure`](crate::engine::structure::Structure)s.
//!
//! A [`Query`](context::Query) is a function from a [`QueryContext`](context::QueryContext) to a
//! [`Selection`](selection::Selection). Generators produce selections from the context's input
//! structure, combinators and filters compose them. A selection either holds one structure of
//! independent single elements (singletons) or a sequence of structures, and every query keeps
//! that shape.
//!
//! Selections convert to [`Loci`](loci::Loci), per-unit index sets used by consumers for
//! highlighting or measurement, and loci persist as serializable [`Bundle`](bundle::Bundle)s
//! that can be re-hydrated against any structure with the same content hash.
//!
//! "No match" is an empty selection or loci, never an error.

use thiserror::Error;

pub mod bundle;
pub mod combinators;
pub mod context;
pub mod filters;
pub mod generators;
pub mod loci;
pub mod selection;

pub use bundle::Bundle;
pub use context::{Query, QueryContext};
pub use loci::Loci;
pub use selection::Selection;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Bundle was created for structure {expected:016x}, not {found:016x}")]
    IncompatibleBundle { expected: u64, found: u64 },

    #[error("Unit {0} not found in structure")]
    UnknownUnit(u32),
}
