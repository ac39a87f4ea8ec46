//! # Structural Model
//!
//! The parsed, immutable description of one model of a structure: atoms grouped into residues and
//! chains, their coordinates, coarse-grained elements, explicit connectivity records, the
//! chemical-component dictionary and all symmetry definitions.
//!
//! ## Key Components
//!
//! - [`hierarchy`] - Atom, residue and chain tables with contiguous segmentations
//! - [`coarse`] - Sphere and gaussian elements of integrative models
//! - [`connectivity`] - `struct_conn` records, index-pair bonds and the component bond dictionary
//! - [`entities`] - Sequence microheterogeneity
//! - [`topology`] - Bond orders and bond flags
//! - [`builder`] - Construction of models from a [`CategorySource`](crate::core::io::CategorySource)

pub mod builder;
pub mod coarse;
pub mod connectivity;
pub mod entities;
pub mod hierarchy;
pub mod topology;

use crate::core::io::CategoryError;
use crate::core::symmetry::ModelSymmetry;
use crate::core::symmetry::error::SymmetryError;
use coarse::CoarseElements;
use connectivity::{ComponentBondTable, IndexPairBonds, StructConn};
use entities::Entities;
use hierarchy::{AtomicHierarchy, Conformation};
use nalgebra::Point3;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    Symmetry(#[from] SymmetryError),

    #[error("Source contains neither atoms nor coarse elements")]
    Empty,

    #[error("Unknown assembly '{0}'")]
    UnknownAssembly(String),

    #[error("Model has no crystallographic symmetry")]
    MissingSymmetry,

    #[error("Conformation has {found} positions, model has {expected} atoms")]
    ConformationMismatch { expected: usize, found: usize },

    #[error("Model {found} does not share the atom hierarchy of model {expected}")]
    TopologyMismatch { expected: u64, found: u64 },
}

#[derive(Debug, Clone)]
pub struct Model {
    id: u64,
    pub label: String,
    pub model_num: i64,
    pub atomic: AtomicHierarchy,
    pub conformation: Conformation,
    pub spheres: Option<CoarseElements>,
    pub gaussians: Option<CoarseElements>,
    pub entities: Entities,
    pub struct_conn: StructConn,
    pub index_pair_bonds: Option<IndexPairBonds>,
    pub component_bonds: ComponentBondTable,
    pub symmetry: ModelSymmetry,
    is_coarse_grained: bool,
}

/// Everything a model is assembled from.
#[derive(Debug, Clone, Default)]
pub struct ModelParts {
    pub label: String,
    pub model_num: i64,
    pub atomic: AtomicHierarchy,
    pub positions: Vec<Point3<f64>>,
    pub spheres: Option<CoarseElements>,
    pub gaussians: Option<CoarseElements>,
    pub entities: Entities,
    pub struct_conn: StructConn,
    pub index_pair_bonds: Option<IndexPairBonds>,
    pub component_bonds: ComponentBondTable,
    pub symmetry: ModelSymmetry,
}

impl Model {
    pub fn new(parts: ModelParts) -> Result<Self, ModelError> {
        let expected = parts.atomic.atom_count();
        if parts.positions.len() != expected {
            return Err(ModelError::ConformationMismatch {
                expected,
                found: parts.positions.len(),
            });
        }
        let is_coarse_grained = detect_coarse_grained(&parts.atomic);
        Ok(Self {
            id: NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed),
            label: parts.label,
            model_num: parts.model_num,
            atomic: parts.atomic,
            conformation: Conformation::new(parts.positions),
            spheres: parts.spheres,
            gaussians: parts.gaussians,
            entities: parts.entities,
            struct_conn: parts.struct_conn,
            index_pair_bonds: parts.index_pair_bonds,
            component_bonds: parts.component_bonds,
            symmetry: parts.symmetry,
            is_coarse_grained,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn atom_count(&self) -> usize {
        self.atomic.atom_count()
    }

    #[inline]
    pub fn position(&self, atom: usize) -> Point3<f64> {
        self.conformation.positions[atom]
    }

    /// True when every residue is represented by a single trace atom (`CA` or `P`).
    pub fn is_coarse_grained(&self) -> bool {
        self.is_coarse_grained
    }

    /// Whether `other` describes the same atoms, so derived data can be rebuilt over it.
    pub fn shares_topology(&self, other: &Model) -> bool {
        self.id == other.id || self.atomic == other.atomic
    }

    /// Same topology with new coordinates; the result has a fresh conformation id.
    pub fn with_positions(&self, positions: Vec<Point3<f64>>) -> Result<Self, ModelError> {
        if positions.len() != self.atom_count() {
            return Err(ModelError::ConformationMismatch {
                expected: self.atom_count(),
                found: positions.len(),
            });
        }
        let mut model = self.clone();
        model.conformation = Conformation::new(positions);
        Ok(model)
    }
}

fn detect_coarse_grained(atomic: &AtomicHierarchy) -> bool {
    let residue_count = atomic.residue_count();
    if residue_count == 0 {
        return false;
    }
    (0..residue_count).all(|r| {
        let range = atomic.residue_segments.range(r);
        range.len() == 1 && matches!(atomic.atoms.label_atom_id[range.start].as_str(), "CA" | "P")
    })
}
