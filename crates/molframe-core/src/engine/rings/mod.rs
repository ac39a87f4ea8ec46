//! # Rings
//!
//! Per-unit ring perception over the intra-unit bond graph, with canonical fingerprints,
//! aromaticity and a membership index.

pub mod aromatic;
pub mod compute;
pub mod fingerprint;
pub mod index;

pub use index::RingIndex;

use crate::core::collections::sorted::SortedSet;
use crate::engine::structure::unit::Unit;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Rings of one unit. Ring atoms are unit-local indices.
#[derive(Debug, Clone, Default)]
pub struct UnitRings {
    all: Vec<SortedSet>,
    fingerprints: Vec<String>,
    by_fingerprint: HashMap<String, Vec<usize>>,
    aromatic: Vec<usize>,
    residues: Vec<Option<usize>>,
    alt_ids: Vec<String>,
    index: RingIndex,
}

impl UnitRings {
    pub fn compute(unit: &Unit) -> Self {
        if !unit.is_atomic() {
            return Self::default();
        }
        let graph = unit.bonds();
        let all = compute::compute_rings(unit, graph);
        let fingerprints: Vec<String> = all
            .iter()
            .map(|r| fingerprint::ring_fingerprint(unit, graph, r))
            .collect();
        let mut by_fingerprint: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, fp) in fingerprints.iter().enumerate() {
            by_fingerprint.entry(fp.clone()).or_default().push(i);
        }
        let aromatic: Vec<usize> = (0..all.len())
            .filter(|&i| aromatic::is_aromatic(unit, graph, &all[i]))
            .collect();
        let residues = all.iter().map(|r| ring_residue(unit, r)).collect();
        let alt_ids = all.iter().map(|r| ring_alt_id(unit, r)).collect();
        let index = RingIndex::new(&all, &aromatic);

        debug!(
            unit = unit.id(),
            rings = all.len(),
            aromatic = aromatic.len(),
            "Perceived rings."
        );
        Self {
            all,
            fingerprints,
            by_fingerprint,
            aromatic,
            residues,
            alt_ids,
            index,
        }
    }

    pub fn all(&self) -> &[SortedSet] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn fingerprint(&self, ring: usize) -> &str {
        &self.fingerprints[ring]
    }

    /// Ring indices with the given fingerprint.
    pub fn by_fingerprint(&self, fingerprint: &str) -> &[usize] {
        self.by_fingerprint
            .get(fingerprint)
            .map_or(&[], Vec::as_slice)
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_fingerprint.keys().map(String::as_str)
    }

    pub fn aromatic_rings(&self) -> &[usize] {
        &self.aromatic
    }

    pub fn is_aromatic(&self, ring: usize) -> bool {
        self.aromatic.binary_search(&ring).is_ok()
    }

    /// Residue index when all ring atoms belong to one residue.
    pub fn residue(&self, ring: usize) -> Option<usize> {
        self.residues[ring]
    }

    /// First non-empty alternate location id among the ring atoms.
    pub fn alt_id(&self, ring: usize) -> &str {
        &self.alt_ids[ring]
    }

    pub fn index(&self) -> &RingIndex {
        &self.index
    }

    /// Single-residue rings with one of `fingerprints`, grouped by residue index.
    pub fn by_fingerprint_and_residue(&self, fingerprints: &[&str]) -> BTreeMap<usize, Vec<usize>> {
        let mut map: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for fp in fingerprints {
            for &ring in self.by_fingerprint(fp) {
                if let Some(residue) = self.residues[ring] {
                    map.entry(residue).or_default().push(ring);
                }
            }
        }
        map
    }
}

fn ring_residue(unit: &Unit, ring: &SortedSet) -> Option<usize> {
    let elements = unit.elements();
    let mut residues = ring.iter().map(|i| unit.residue_index(elements[i]));
    let first = residues.next()??;
    residues.all(|r| r == Some(first)).then_some(first)
}

fn ring_alt_id(unit: &Unit, ring: &SortedSet) -> String {
    let elements = unit.elements();
    let atomic = &unit.model().atomic;
    ring.iter()
        .map(|i| atomic.alt_id(elements[i]))
        .find(|alt| !alt.is_empty())
        .unwrap_or("")
        .to_string()
}
