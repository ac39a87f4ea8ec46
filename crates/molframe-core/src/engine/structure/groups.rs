use super::unit::Unit;
use crate::core::collections::sorted::{SortedSet, hash_combine};
use std::collections::HashMap;
use std::sync::Arc;

/// Units that are symmetry copies of one element set.
#[derive(Debug, Clone)]
pub struct SymmetryGroup {
    pub elements: SortedSet,
    pub units: Vec<Arc<Unit>>,
    pub hash: u64,
}

impl SymmetryGroup {
    pub fn invariant_id(&self) -> Option<u32> {
        self.units.first().map(|u| u.invariant_id())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymmetryGroups {
    pub groups: Vec<SymmetryGroup>,
    unit_group: HashMap<u32, usize>,
}

impl SymmetryGroups {
    /// Groups units by invariant id and identical elements, preserving first-seen order.
    pub fn new(units: &[Arc<Unit>]) -> Self {
        let mut groups: Vec<SymmetryGroup> = Vec::new();
        let mut by_invariant: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut unit_group = HashMap::with_capacity(units.len());

        for unit in units {
            let candidates = by_invariant.entry(unit.invariant_id()).or_default();
            let found = candidates
                .iter()
                .copied()
                .find(|&g| groups[g].elements.are_equal(unit.elements()));
            let index = match found {
                Some(g) => {
                    groups[g].units.push(unit.clone());
                    g
                }
                None => {
                    let hash = hash_combine(unit.invariant_id() as u64, unit.elements().hash_code());
                    groups.push(SymmetryGroup {
                        elements: unit.elements().clone(),
                        units: vec![unit.clone()],
                        hash,
                    });
                    candidates.push(groups.len() - 1);
                    groups.len() - 1
                }
            };
            unit_group.insert(unit.id(), index);
        }
        Self { groups, unit_group }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_of(&self, unit_id: u32) -> Option<&SymmetryGroup> {
        self.unit_group.get(&unit_id).map(|&g| &self.groups[g])
    }
}

/// Units placed by operators of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformGroup {
    pub operator_name: String,
    pub unit_ids: Vec<u32>,
}

pub fn transform_groups(units: &[Arc<Unit>]) -> Vec<TransformGroup> {
    let mut groups: Vec<TransformGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for unit in units {
        let name = unit.operator().name();
        match index.get(name) {
            Some(&g) => groups[g].unit_ids.push(unit.id()),
            None => {
                index.insert(name, groups.len());
                groups.push(TransformGroup {
                    operator_name: name.to_string(),
                    unit_ids: vec![unit.id()],
                });
            }
        }
    }
    groups
}
