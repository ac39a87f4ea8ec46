//! # Symmetry
//!
//! Named rigid transforms and the tables they are generated from.
//!
//! ## Key Components
//!
//! - [`operator`] - [`SymmetryOperator`](operator::SymmetryOperator): matrix, inverse, identity
//!   flag, provenance and chain-name suffix; composition and interpolation
//! - [`expression`] - Parser for assembly generator expressions like `(1-5)(6,7)`
//! - [`assembly`] - Biological assemblies resolved against an operator table
//! - [`spacegroup`] - Unit cells and crystallographic operations in `x,y,z` notation
//! - [`error`] - Errors raised while resolving symmetry definitions

pub mod assembly;
pub mod error;
pub mod expression;
pub mod operator;
pub mod spacegroup;

use assembly::Assembly;
use operator::SymmetryOperator;
use spacegroup::Spacegroup;
use std::sync::Arc;

/// All symmetry information attached to a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSymmetry {
    pub assemblies: Vec<Assembly>,
    pub spacegroup: Option<Spacegroup>,
    pub ncs_operators: Vec<Arc<SymmetryOperator>>,
}

impl ModelSymmetry {
    pub fn assembly(&self, id: &str) -> Option<&Assembly> {
        self.assemblies
            .iter()
            .find(|a| a.id.eq_ignore_ascii_case(id))
    }
}
