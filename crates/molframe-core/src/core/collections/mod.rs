//! # Collections
//!
//! Compact index containers used throughout the structure model.
//!
//! - [`sorted`] - [`SortedSet`](sorted::SortedSet), a shared, strictly increasing index array with
//!   set algebra (intersection, union, difference, subset tests)
//! - [`segmentation`] - Contiguous segment tables (residues, chains) and iteration of a sorted
//!   index set segment by segment

pub mod segmentation;
pub mod sorted;
