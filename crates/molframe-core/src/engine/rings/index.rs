use crate::core::collections::sorted::SortedSet;
use crate::core::model::topology::{BondFlags, BondOrder};
use crate::engine::bonds::graph::{BondGraph, BondGraphBuilder, BondProps};
use std::collections::{HashMap, HashSet};

/// Ring membership and ring connectivity of one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingIndex {
    /// Unit-local element index to the rings containing it.
    pub element_rings: HashMap<usize, Vec<usize>>,
    pub element_aromatic_rings: HashMap<usize, Vec<usize>>,
    /// Rings as vertices, joined when they share an atom.
    pub ring_graph: BondGraph,
    pub ring_component_index: Vec<usize>,
    pub ring_components: Vec<Vec<usize>>,
}

impl RingIndex {
    pub fn new(rings: &[SortedSet], aromatic: &[usize]) -> Self {
        let mut element_rings: HashMap<usize, Vec<usize>> = HashMap::new();
        for (r, ring) in rings.iter().enumerate() {
            for e in ring.iter() {
                element_rings.entry(e).or_default().push(r);
            }
        }
        let mut element_aromatic_rings: HashMap<usize, Vec<usize>> = HashMap::new();
        for &r in aromatic {
            for e in rings[r].iter() {
                element_aromatic_rings.entry(e).or_default().push(r);
            }
        }

        let mut builder = BondGraphBuilder::new(rings.len());
        let mut seen = HashSet::new();
        for containing in element_rings.values().filter(|c| c.len() > 1) {
            for (i, &a) in containing.iter().enumerate() {
                for &b in &containing[i + 1..] {
                    if seen.insert((a.min(b), a.max(b))) {
                        builder.add(
                            a,
                            b,
                            BondProps {
                                flags: BondFlags::NONE,
                                order: BondOrder::Single,
                                key: -1,
                            },
                        );
                    }
                }
            }
        }
        let ring_graph = builder.build();
        let components = ring_graph.connected_components();
        let mut ring_components = vec![Vec::new(); components.count];
        for (r, &c) in components.vertex_component.iter().enumerate() {
            ring_components[c].push(r);
        }

        Self {
            element_rings,
            element_aromatic_rings,
            ring_graph,
            ring_component_index: components.vertex_component,
            ring_components,
        }
    }

    pub fn rings_of(&self, element: usize) -> &[usize] {
        self.element_rings.get(&element).map_or(&[], Vec::as_slice)
    }

    pub fn aromatic_rings_of(&self, element: usize) -> &[usize] {
        self.element_aromatic_rings
            .get(&element)
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_sharing_atoms_form_one_component() {
        let rings = vec![
            SortedSet::from_sorted(vec![0, 1, 2, 3]),
            SortedSet::from_sorted(vec![1, 2, 4, 5]),
            SortedSet::from_sorted(vec![10, 11, 12]),
        ];
        let index = RingIndex::new(&rings, &[1]);
        assert_eq!(index.rings_of(1), &[0, 1]);
        assert_eq!(index.aromatic_rings_of(4), &[1]);
        assert!(index.aromatic_rings_of(0).is_empty());
        assert_eq!(index.ring_graph.edge_count(), 1);
        assert_eq!(index.ring_components, vec![vec![0, 1], vec![2]]);
        assert_eq!(index.ring_component_index, vec![0, 0, 1]);
    }
}
