use super::structure::Structure;
use super::unit::{Unit, UnitKind, next_invariant_id};
use crate::core::collections::sorted::SortedSet;
use crate::core::model::Model;
use crate::core::symmetry::operator::SymmetryOperator;
use crate::engine::cache::ModelCaches;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Assembles a structure unit by unit, assigning consecutive unit ids.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    units: Vec<Arc<Unit>>,
    next_id: u32,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit over `elements`. A fresh invariant id is allocated unless one is given.
    pub fn add_unit(
        &mut self,
        kind: UnitKind,
        model: Arc<Model>,
        operator: Arc<SymmetryOperator>,
        elements: SortedSet,
        caches: Arc<ModelCaches>,
        invariant_id: Option<u32>,
    ) -> Arc<Unit> {
        let invariant_id = invariant_id.unwrap_or_else(next_invariant_id);
        let unit = Arc::new(Unit::new(
            self.take_id(),
            invariant_id,
            kind,
            model,
            operator,
            elements,
            caches,
        ));
        self.units.push(unit.clone());
        unit
    }

    /// Adds a symmetry copy of `unit` under a new id.
    pub fn add_with_operator(
        &mut self,
        unit: &Unit,
        operator: Arc<SymmetryOperator>,
        dont_compose: bool,
    ) -> Arc<Unit> {
        let copy = Arc::new(unit.apply_operator(self.take_id(), operator, dont_compose));
        self.units.push(copy.clone());
        copy
    }

    /// Adds an existing unit, keeping its id.
    pub fn add_existing(&mut self, unit: Arc<Unit>) {
        self.next_id = self.next_id.max(unit.id() + 1);
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn build(self) -> Structure {
        Structure::new(self.units)
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// How a [`StructureSubsetBuilder`] receives elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsetMode {
    /// Elements of a unit arrive in increasing order. Repeats of the last element are dropped
    /// when the structure is built. Out-of-order input is not detected and corrupts lookups.
    Ordered,
    /// Elements may arrive in any order and are deduplicated on insert.
    Unique,
}

#[derive(Debug, Default)]
struct PendingUnit {
    elements: Vec<usize>,
    seen: HashSet<usize>,
}

/// Builds a structure whose units are subsets of a parent structure's units.
#[derive(Debug)]
pub struct StructureSubsetBuilder<'a> {
    parent: &'a Structure,
    mode: SubsetMode,
    units: BTreeMap<u32, PendingUnit>,
    current: Option<u32>,
}

impl<'a> StructureSubsetBuilder<'a> {
    pub fn new(parent: &'a Structure, mode: SubsetMode) -> Self {
        Self {
            parent,
            mode,
            units: BTreeMap::new(),
            current: None,
        }
    }

    pub fn ordered(parent: &'a Structure) -> Self {
        Self::new(parent, SubsetMode::Ordered)
    }

    pub fn unique(parent: &'a Structure) -> Self {
        Self::new(parent, SubsetMode::Unique)
    }

    pub fn parent(&self) -> &'a Structure {
        self.parent
    }

    pub fn begin_unit(&mut self, unit_id: u32) {
        self.current = Some(unit_id);
    }

    /// Adds a model element to the unit opened by [`Self::begin_unit`].
    pub fn add_element(&mut self, element: usize) {
        if let Some(id) = self.current {
            self.add_to_unit(id, element);
        }
    }

    pub fn commit_unit(&mut self) {
        self.current = None;
    }

    pub fn add_to_unit(&mut self, unit_id: u32, element: usize) {
        let pending = self.units.entry(unit_id).or_default();
        match self.mode {
            SubsetMode::Ordered => pending.elements.push(element),
            SubsetMode::Unique => {
                if pending.seen.insert(element) {
                    pending.elements.push(element);
                }
            }
        }
    }

    /// Replaces the elements of a unit.
    pub fn set_unit(&mut self, unit_id: u32, elements: &SortedSet) {
        let pending = self.units.entry(unit_id).or_default();
        pending.elements = elements.as_slice().to_vec();
        pending.seen = match self.mode {
            SubsetMode::Ordered => HashSet::new(),
            SubsetMode::Unique => elements.iter().collect(),
        };
    }

    pub fn element_count(&self) -> usize {
        self.units.values().map(|p| p.elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.values().all(|p| p.elements.is_empty())
    }

    /// Builds the subset. Units left whole are reused; units of the parent missing from the
    /// builder are dropped.
    pub fn build(self) -> Structure {
        let mut units = Vec::with_capacity(self.units.len());
        for (id, pending) in self.units {
            let Some(parent_unit) = self.parent.unit(id) else {
                continue;
            };
            let mut elements = pending.elements;
            match self.mode {
                SubsetMode::Ordered => elements.dedup(),
                SubsetMode::Unique => elements.sort_unstable(),
            }
            if elements.is_empty() {
                continue;
            }
            units.push(parent_unit.child(SortedSet::from_sorted(elements)));
        }
        Structure::new(units)
    }
}
