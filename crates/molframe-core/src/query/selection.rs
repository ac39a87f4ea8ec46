use super::loci::{Loci, LociElement};
use crate::core::collections::sorted::SortedSet;
use crate::engine::structure::Structure;
use crate::engine::structure::set_ops::{are_unit_ids_and_indices_equal, union};
use std::collections::HashMap;
use std::sync::Arc;

/// The result of a query over `source`.
///
/// `Singletons` stores many one-element selections compactly as a single structure; `Sequence`
/// lists arbitrary sub-structures. An empty selection is an empty sequence.
#[derive(Debug, Clone)]
pub enum Selection {
    Singletons {
        source: Arc<Structure>,
        structure: Arc<Structure>,
    },
    Sequence {
        source: Arc<Structure>,
        structures: Vec<Arc<Structure>>,
    },
}

impl Selection {
    pub fn singletons(source: Arc<Structure>, structure: Arc<Structure>) -> Self {
        Self::Singletons { source, structure }
    }

    pub fn sequence(source: Arc<Structure>, structures: Vec<Arc<Structure>>) -> Self {
        Self::Sequence { source, structures }
    }

    pub fn empty(source: Arc<Structure>) -> Self {
        Self::sequence(source, Vec::new())
    }

    pub fn source(&self) -> &Arc<Structure> {
        match self {
            Self::Singletons { source, .. } | Self::Sequence { source, .. } => source,
        }
    }

    pub fn is_singletons(&self) -> bool {
        matches!(self, Self::Singletons { .. })
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Singletons { structure, .. } => structure.is_empty(),
            Self::Sequence { structures, .. } => structures.is_empty(),
        }
    }

    /// Number of selected structures; every singleton element counts once.
    pub fn structure_count(&self) -> usize {
        match self {
            Self::Singletons { structure, .. } => structure.element_count(),
            Self::Sequence { structures, .. } => structures.len(),
        }
    }

    /// All selected elements as one structure.
    pub fn union_structure(&self) -> Arc<Structure> {
        match self {
            Self::Singletons { structure, .. } => structure.clone(),
            Self::Sequence { structures, .. } => match structures.as_slice() {
                [] => Arc::new(Structure::empty()),
                [only] => only.clone(),
                many => {
                    let refs: Vec<&Structure> = many.iter().map(|s| s.as_ref()).collect();
                    Arc::new(union(&refs))
                }
            },
        }
    }

    /// Visits every selected structure with its position. Singletons are visited as
    /// one-element structures.
    pub fn for_each(&self, mut f: impl FnMut(Arc<Structure>, usize)) {
        match self {
            Self::Singletons { structure, .. } => {
                let mut i = 0;
                for unit in structure.units() {
                    for e in unit.elements().iter() {
                        let single = unit.child(SortedSet::from_sorted(vec![e]));
                        f(Arc::new(Structure::new(vec![single])), i);
                        i += 1;
                    }
                }
            }
            Self::Sequence { structures, .. } => {
                for (i, s) in structures.iter().enumerate() {
                    f(s.clone(), i);
                }
            }
        }
    }

    pub fn structures(&self) -> Vec<Arc<Structure>> {
        let mut out = Vec::with_capacity(self.structure_count());
        self.for_each(|s, _| out.push(s));
        out
    }

    /// Loci over the source structure's units, indexing into their elements.
    pub fn to_loci_with_source_units(&self) -> Loci {
        let source = self.source().clone();
        let mut elements = Vec::new();
        for unit in self.union_structure().units() {
            let Some(source_unit) = source.unit(unit.id()) else {
                continue;
            };
            let indices = if Arc::ptr_eq(source_unit, unit) {
                SortedSet::from_range(0, unit.len())
            } else {
                let positions: Vec<usize> = unit
                    .elements()
                    .iter()
                    .filter_map(|e| source_unit.elements().index_of(e))
                    .collect();
                SortedSet::from_sorted(positions)
            };
            if !indices.is_empty() {
                elements.push(LociElement::new(source_unit.clone(), indices));
            }
        }
        Loci::new(source, elements)
    }

    /// Loci over the selection's own units, each taken whole.
    pub fn to_loci_with_current_units(&self) -> Loci {
        let structure = self.union_structure();
        let elements = structure
            .units()
            .iter()
            .map(|u| LociElement::new(u.clone(), SortedSet::from_range(0, u.len())))
            .collect();
        Loci::new(structure, elements)
    }

    /// The same selection attributed to another source structure.
    pub fn with_input_structure(self, source: Arc<Structure>) -> Self {
        match self {
            Self::Singletons { structure, .. } => Self::singletons(source, structure),
            Self::Sequence { structures, .. } => Self::sequence(source, structures),
        }
    }
}

/// Collects structures in insertion order, skipping empty ones. The result is a singletons
/// selection if every added structure has exactly one element.
#[derive(Debug)]
pub struct LinearBuilder {
    source: Arc<Structure>,
    structures: Vec<Arc<Structure>>,
    all_singletons: bool,
}

impl LinearBuilder {
    pub fn new(source: Arc<Structure>) -> Self {
        Self {
            source,
            structures: Vec::new(),
            all_singletons: true,
        }
    }

    pub fn add(&mut self, structure: Arc<Structure>) {
        if structure.is_empty() {
            return;
        }
        self.all_singletons &= structure.element_count() == 1;
        self.structures.push(structure);
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn into_selection(self) -> Selection {
        into_selection(self.source, self.structures, self.all_singletons)
    }
}

/// Like [`LinearBuilder`] but drops structures equal in unit ids and element sets to one
/// already added.
#[derive(Debug)]
pub struct UniqueBuilder {
    source: Arc<Structure>,
    structures: Vec<Arc<Structure>>,
    by_hash: HashMap<u64, Vec<usize>>,
    all_singletons: bool,
}

impl UniqueBuilder {
    pub fn new(source: Arc<Structure>) -> Self {
        Self {
            source,
            structures: Vec::new(),
            by_hash: HashMap::new(),
            all_singletons: true,
        }
    }

    /// Returns `false` if the structure was empty or a duplicate.
    pub fn add(&mut self, structure: Arc<Structure>) -> bool {
        if structure.is_empty() {
            return false;
        }
        let hash = structure.hash_code();
        let bucket = self.by_hash.entry(hash).or_default();
        if bucket
            .iter()
            .any(|&i| are_unit_ids_and_indices_equal(&self.structures[i], &structure))
        {
            return false;
        }
        bucket.push(self.structures.len());
        self.all_singletons &= structure.element_count() == 1;
        self.structures.push(structure);
        true
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn into_selection(self) -> Selection {
        into_selection(self.source, self.structures, self.all_singletons)
    }
}

fn into_selection(
    source: Arc<Structure>,
    structures: Vec<Arc<Structure>>,
    all_singletons: bool,
) -> Selection {
    if structures.is_empty() {
        return Selection::empty(source);
    }
    if all_singletons {
        let refs: Vec<&Structure> = structures.iter().map(|s| s.as_ref()).collect();
        return Selection::singletons(source, Arc::new(union(&refs)));
    }
    Selection::sequence(source, structures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::structure::StructureSubsetBuilder;
    use crate::test_support;

    fn subset(parent: &Structure, picks: &[(usize, usize)]) -> Arc<Structure> {
        let mut builder = StructureSubsetBuilder::unique(parent);
        for &(unit_pos, index) in picks {
            let unit = &parent.units()[unit_pos];
            builder.add_to_unit(unit.id(), unit.elements()[index]);
        }
        Arc::new(builder.build())
    }

    #[test]
    fn linear_builder_keeps_singleton_shape_when_possible() {
        let source = Arc::new(test_support::two_chain_structure(10.0));
        let mut builder = LinearBuilder::new(source.clone());
        builder.add(subset(&source, &[(0, 0)]));
        builder.add(subset(&source, &[(1, 2)]));
        builder.add(Arc::new(Structure::empty()));
        let selection = builder.into_selection();
        assert!(selection.is_singletons());
        assert_eq!(selection.structure_count(), 2);

        let mut builder = LinearBuilder::new(source.clone());
        builder.add(subset(&source, &[(0, 0), (0, 1)]));
        builder.add(subset(&source, &[(1, 2)]));
        let selection = builder.into_selection();
        assert!(!selection.is_singletons());
        assert_eq!(selection.structure_count(), 2);
        assert_eq!(selection.union_structure().element_count(), 3);
    }

    #[test]
    fn empty_builder_gives_empty_sequence() {
        let source = Arc::new(test_support::two_chain_structure(10.0));
        let selection = LinearBuilder::new(source).into_selection();
        assert!(selection.is_empty());
        assert!(!selection.is_singletons());
        assert_eq!(selection.union_structure().element_count(), 0);
    }

    #[test]
    fn unique_builder_drops_duplicates() {
        let source = Arc::new(test_support::two_chain_structure(10.0));
        let mut builder = UniqueBuilder::new(source.clone());
        assert!(builder.add(subset(&source, &[(0, 0), (1, 1)])));
        assert!(!builder.add(subset(&source, &[(1, 1), (0, 0)])));
        assert!(builder.add(subset(&source, &[(0, 1)])));
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn singletons_are_visited_one_element_at_a_time() {
        let source = Arc::new(test_support::two_chain_structure(10.0));
        let selection = Selection::singletons(source.clone(), source.clone());
        let mut counts = Vec::new();
        selection.for_each(|s, i| counts.push((i, s.element_count())));
        assert_eq!(counts.len(), 6);
        assert!(counts.iter().all(|&(_, n)| n == 1));
        assert_eq!(counts.last().map(|c| c.0), Some(5));
    }

    #[test]
    fn source_unit_loci_index_into_source_elements() {
        let source = Arc::new(test_support::two_chain_structure(10.0));
        let picked = subset(&source, &[(0, 2), (1, 0), (1, 1)]);
        let selection = Selection::singletons(source.clone(), picked);
        let loci = selection.to_loci_with_source_units();
        assert_eq!(loci.size(), 3);
        assert_eq!(loci.elements()[0].indices.as_slice(), &[2]);
        assert_eq!(loci.elements()[1].indices.as_slice(), &[0, 1]);
        assert!(Arc::ptr_eq(&loci.elements()[0].unit, &source.units()[0]));

        let current = selection.to_loci_with_current_units();
        assert_eq!(current.size(), 3);
        assert_eq!(current.elements()[1].indices.as_slice(), &[0, 1]);
    }

    #[test]
    fn with_input_structure_only_changes_source() {
        let source = Arc::new(test_support::two_chain_structure(10.0));
        let other = Arc::new(Structure::new(vec![source.units()[0].clone()]));
        let selection = Selection::singletons(source.clone(), other.clone());
        let moved = selection.with_input_structure(other.clone());
        assert!(Arc::ptr_eq(moved.source(), &other));
        assert_eq!(moved.structure_count(), 3);
    }
}
