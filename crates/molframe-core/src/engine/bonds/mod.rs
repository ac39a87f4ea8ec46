//! # Bonds
//!
//! Intra-unit bond graphs and inter-unit bond sets, built from explicit connectivity records,
//! the chemical-component dictionary and element-pair distance thresholds.

pub mod graph;
pub mod inter;
pub mod intra;
pub mod tables;

pub use graph::{BondGraph, BondGraphBuilder, BondProps, Components};
pub use inter::{InterUnitBonds, InterUnitEdge, UnitElementKey, UnitPairBonds, compute_inter_unit_bonds};
pub use intra::compute_intra_unit_bonds;
