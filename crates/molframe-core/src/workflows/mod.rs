//! # Workflows Module
//!
//! End-to-end procedures built on the engine and the query algebra.
//!
//! ## Overview
//!
//! Workflows take a structure built from a single model and produce a new structure or a
//! report. Long-running ones accept a [`RuntimeContext`](crate::engine::task::RuntimeContext),
//! report progress through it and return [`Outcome::Cancelled`](crate::engine::task::Outcome)
//! when asked to stop between chunks.
//!
//! ## Architecture
//!
//! - **Symmetry** ([`symmetry`]) - Biological assemblies, NCS expansion, crystal cell ranges and
//!   the symmetry-mate search
//! - **Analysis** ([`analysis`]) - Derived-data precomputation and structure summaries

pub mod analysis;
pub mod symmetry;
