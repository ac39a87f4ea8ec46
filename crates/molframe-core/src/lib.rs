//! # molframe
//!
//! Structural data model for macromolecules: atomic and coarse-grained models, symmetry
//! expansion, lazily derived bonding and ring data, and a selection algebra over the result.
//!
//! ## Architectural Philosophy
//!
//! The library is layered so each layer only depends on the ones below it.
//!
//! - **[`core`]: The Foundation.** Stateless geometry, index sets, symmetry definitions, the
//!   category-table input seam and the parsed [`Model`](core::model::Model).
//!
//! - **[`engine`]: Structures and Derived Data.** Units and structures built from models, with
//!   memoized boundaries, spatial lookups, bonds and rings, plus progress reporting and
//!   cooperative task execution.
//!
//! - **[`query`]: The Selection Algebra.** Generators, combinators and filters producing
//!   selections, the [`Loci`](query::loci::Loci) reference type and its serializable
//!   [`Bundle`](query::bundle::Bundle) form.
//!
//! - **[`workflows`]: The Public API.** Assembly and symmetry expansion, symmetry-mate search,
//!   derived-data precomputation and structure summaries.

pub mod core;
pub mod engine;
pub mod query;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_support;
