use crate::core::collections::segmentation::Segmentation;
use nalgebra::Point3;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONFORMATION_ID: AtomicU64 = AtomicU64::new(1);

/// Per-atom string data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomData {
    /// Source row id (`atom_site.id`).
    pub source_id: Vec<String>,
    pub label_atom_id: Vec<String>,
    /// Alternate-location label, empty when the atom has none.
    pub label_alt_id: Vec<String>,
    /// Uppercase element symbol.
    pub type_symbol: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueData {
    pub label_comp_id: Vec<String>,
    pub label_seq_id: Vec<Option<i64>>,
    pub auth_seq_id: Vec<Option<i64>>,
    pub ins_code: Vec<String>,
}

impl ResidueData {
    /// Sequence number used to match residues: the label number, or the author number for
    /// residues outside any polymer sequence.
    pub fn seq_id(&self, residue: usize) -> Option<i64> {
        self.label_seq_id[residue].or(self.auth_seq_id[residue])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainData {
    pub label_asym_id: Vec<String>,
    pub auth_asym_id: Vec<String>,
    pub label_entity_id: Vec<String>,
}

/// Atoms grouped into residues and residues into chains, all contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomicHierarchy {
    pub atoms: AtomData,
    pub residues: ResidueData,
    pub chains: ChainData,
    pub residue_segments: Segmentation,
    pub chain_segments: Segmentation,
    /// Chain index of every residue.
    pub residue_chain: Vec<usize>,
}

impl AtomicHierarchy {
    pub fn atom_count(&self) -> usize {
        self.atoms.label_atom_id.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residue_segments.count()
    }

    pub fn chain_count(&self) -> usize {
        self.chain_segments.count()
    }

    #[inline]
    pub fn residue_index(&self, atom: usize) -> usize {
        self.residue_segments.segment_of(atom)
    }

    #[inline]
    pub fn chain_index(&self, atom: usize) -> usize {
        self.chain_segments.segment_of(atom)
    }

    pub fn comp_id(&self, atom: usize) -> &str {
        &self.residues.label_comp_id[self.residue_index(atom)]
    }

    pub fn atom_name(&self, atom: usize) -> &str {
        &self.atoms.label_atom_id[atom]
    }

    pub fn alt_id(&self, atom: usize) -> &str {
        &self.atoms.label_alt_id[atom]
    }

    pub fn element(&self, atom: usize) -> &str {
        &self.atoms.type_symbol[atom]
    }

    pub fn label_asym_id(&self, atom: usize) -> &str {
        &self.chains.label_asym_id[self.chain_index(atom)]
    }

    pub fn entity_id(&self, atom: usize) -> &str {
        &self.chains.label_entity_id[self.chain_index(atom)]
    }
}

/// Atom positions with an identity that changes whenever coordinates change.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformation {
    pub id: u64,
    pub positions: Vec<Point3<f64>>,
}

impl Conformation {
    pub fn new(positions: Vec<Point3<f64>>) -> Self {
        Self {
            id: NEXT_CONFORMATION_ID.fetch_add(1, Ordering::Relaxed),
            positions,
        }
    }
}

/// Upper-cases a type symbol, deriving it from the atom name when absent.
pub fn normalize_element(type_symbol: &str, atom_name: &str) -> String {
    let symbol = type_symbol.trim();
    if !symbol.is_empty() {
        return symbol.to_ascii_uppercase();
    }
    atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conformations_receive_distinct_ids() {
        let a = Conformation::new(vec![]);
        let b = Conformation::new(vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn element_falls_back_to_atom_name() {
        assert_eq!(normalize_element("Fe", "FE1"), "FE");
        assert_eq!(normalize_element("", "1HB"), "H");
        assert_eq!(normalize_element(" ", ""), "");
    }
}
