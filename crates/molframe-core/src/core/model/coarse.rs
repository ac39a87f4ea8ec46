use super::hierarchy::Conformation;
use crate::core::collections::segmentation::Segmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoarseKind {
    Spheres,
    Gaussians,
}

/// Coarse-grained elements (spheres or gaussians), each covering a residue range of one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseElements {
    pub kind: CoarseKind,
    pub conformation: Conformation,
    pub radius: Vec<f64>,
    pub seq_id_begin: Vec<i64>,
    pub seq_id_end: Vec<i64>,
    pub chain_segments: Segmentation,
    pub asym_id: Vec<String>,
    pub entity_id: Vec<String>,
}

impl CoarseElements {
    pub fn count(&self) -> usize {
        self.radius.len()
    }

    pub fn chain_index(&self, element: usize) -> usize {
        self.chain_segments.segment_of(element)
    }

    pub fn asym_id(&self, element: usize) -> &str {
        &self.asym_id[self.chain_index(element)]
    }
}
