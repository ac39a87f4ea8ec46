//! # Engine Module
//!
//! Structures and everything derived from them, plus the execution machinery used by long
//! computations.
//!
//! ## Overview
//!
//! A [`Structure`](structure::Structure) is an immutable, id-ordered list of
//! [`Unit`](structure::Unit)s. Derived data (boundaries, spatial lookups, bond graphs, rings) is
//! computed on first access and memoized in once-cells on the owning unit or structure, so
//! readers on several threads never observe a partially built value.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Bonding, boundary, lookup and cache parameters
//! - **Structures** ([`structure`]) - Units, structures, builders and set operations
//! - **Spatial Lookup** ([`lookup`]) - Per-unit grids and a structure-wide index
//! - **Bonds** ([`bonds`]) - Intra-unit graphs and inter-unit bond sets
//! - **Rings** ([`rings`]) - Ring perception, fingerprints and aromaticity
//! - **Caching** ([`cache`]) - Bounded per-model bond cache shared by symmetry copies
//! - **Progress and Tasks** ([`progress`], [`task`]) - Progress reporting and chunked,
//!   cancellable execution
//! - **Error Handling** ([`error`]) - Engine error type

pub mod bonds;
pub mod cache;
pub mod config;
pub mod error;
pub mod lookup;
pub mod progress;
pub mod rings;
pub mod structure;
pub mod task;
