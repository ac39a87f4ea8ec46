//! # Core Module
//!
//! Stateless foundations shared by every other layer of the library.
//!
//! ## Overview
//!
//! Nothing in this module caches derived data or knows about units and structures. It covers the
//! numeric kernel, the index-set containers the rest of the crate is built on, symmetry
//! definitions, the tabular input seam, and the parsed model itself.
//!
//! ## Architecture
//!
//! - **Geometry Kernel** ([`math`]) - Rigid transforms, eigen-decomposition, RMSD fitting and
//!   bounding volumes
//! - **Index Sets** ([`collections`]) - Sorted index sets and contiguous segmentations
//! - **Symmetry** ([`symmetry`]) - Operators, assemblies, space groups and NCS
//! - **Input** ([`io`]) - Category tables and the [`CategorySource`](io::CategorySource) seam
//! - **Model** ([`model`]) - Atomic hierarchy, coarse elements, connectivity records

pub mod collections;
pub mod io;
pub mod math;
pub mod model;
pub mod symmetry;
