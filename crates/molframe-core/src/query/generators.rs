//! Queries that produce selections from the input structure.
//!
//! Element tests run at the coarsest level that still matters: a chain that passes its test
//! while no residue or atom test is given is taken whole without visiting its atoms.

use super::context::{BondLocation, BondTest, ElementTest, GroupBy, Query, UnitTest, query};
use super::selection::{LinearBuilder, Selection, UniqueBuilder};
use crate::core::collections::segmentation::Segmentation;
use crate::core::collections::sorted::SortedSet;
use crate::engine::structure::set_ops::subtract;
use crate::engine::structure::{Location, Structure, StructureSubsetBuilder, Unit, UnitKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Selects nothing.
pub fn none() -> Query {
    query(|ctx| Selection::empty(ctx.input_structure().clone()))
}

/// Selects every element as a singleton.
pub fn all() -> Query {
    query(|ctx| {
        let input = ctx.input_structure().clone();
        Selection::singletons(input.clone(), input)
    })
}

/// Parameters of [`atoms`]. Unset tests accept everything.
#[derive(Clone, Default)]
pub struct AtomsQuery {
    pub unit_test: Option<UnitTest>,
    /// Evaluated at the first element of each chain.
    pub entity_test: Option<ElementTest>,
    /// Evaluated at the first element of each chain.
    pub chain_test: Option<ElementTest>,
    /// Evaluated at the first element of each residue; per element in coarse units.
    pub residue_test: Option<ElementTest>,
    pub atom_test: Option<ElementTest>,
    /// Groups accepted elements by key. Keys are qualified by unit id, so symmetry copies
    /// never share a group.
    pub group_by: Option<GroupBy>,
}

impl AtomsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit_test(mut self, test: UnitTest) -> Self {
        self.unit_test = Some(test);
        self
    }

    pub fn entity_test(mut self, test: ElementTest) -> Self {
        self.entity_test = Some(test);
        self
    }

    pub fn chain_test(mut self, test: ElementTest) -> Self {
        self.chain_test = Some(test);
        self
    }

    pub fn residue_test(mut self, test: ElementTest) -> Self {
        self.residue_test = Some(test);
        self
    }

    pub fn atom_test(mut self, test: ElementTest) -> Self {
        self.atom_test = Some(test);
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    fn has_structural_tests(&self) -> bool {
        self.unit_test.is_some()
            || self.entity_test.is_some()
            || self.chain_test.is_some()
            || self.residue_test.is_some()
    }
}

pub fn atoms(params: AtomsQuery) -> Query {
    if !params.has_structural_tests() && params.group_by.is_none() {
        return match params.atom_test {
            None => all(),
            Some(test) => atoms_linear(test),
        };
    }
    if params.group_by.is_none() {
        atoms_segmented(params)
    } else {
        atoms_grouped(params)
    }
}

/// Accepted elements grouped per residue.
pub fn residues(params: AtomsQuery) -> Query {
    atoms(params.group_by(Arc::new(|l: &Location| {
        l.residue_index().unwrap_or(l.element) as u64
    })))
}

/// Accepted elements grouped per chain.
pub fn chains(params: AtomsQuery) -> Query {
    atoms(params.group_by(Arc::new(|l: &Location| l.chain_index() as u64)))
}

fn passes(test: &Option<ElementTest>, location: &Location) -> bool {
    test.as_ref().is_none_or(|t| t(location))
}

fn chain_segmentation(unit: &Unit) -> Option<&Segmentation> {
    let model = unit.model();
    match unit.kind() {
        UnitKind::Atomic => Some(&model.atomic.chain_segments),
        UnitKind::Spheres => model.spheres.as_ref().map(|c| &c.chain_segments),
        UnitKind::Gaussians => model.gaussians.as_ref().map(|c| &c.chain_segments),
    }
}

fn atoms_linear(atom_test: ElementTest) -> Query {
    query(move |ctx| {
        let input = ctx.input_structure().clone();
        let mut builder = StructureSubsetBuilder::ordered(&input);
        for unit in input.units() {
            let mut l = Location::new(unit.clone(), 0);
            builder.begin_unit(unit.id());
            for e in unit.elements().iter() {
                l.element = e;
                if atom_test(&l) {
                    builder.add_element(e);
                }
            }
            builder.commit_unit();
        }
        let subset = Arc::new(builder.build());
        Selection::singletons(input.clone(), subset)
    })
}

/// Walks the chains and residues of every accepted unit, calling `emit` for each element that
/// passes all tests. `emit_range` receives whole chains or residues when the finer tests are
/// absent; it is `None` when every element must be reported individually.
fn visit_accepted(
    params: &AtomsQuery,
    unit: &Arc<Unit>,
    mut emit: impl FnMut(&Location),
    mut emit_range: Option<&mut dyn FnMut(&[usize])>,
) {
    let elements = unit.elements().as_slice();
    let Some(chains) = chain_segmentation(unit) else {
        return;
    };
    let chain_level = params.residue_test.is_none() && params.atom_test.is_none();
    let residue_level = params.atom_test.is_none();
    let mut l = Location::new(unit.clone(), 0);

    for chain in chains.segments(elements) {
        l.element = elements[chain.start];
        if !passes(&params.entity_test, &l) || !passes(&params.chain_test, &l) {
            continue;
        }
        if chain_level {
            if let Some(emit_range) = emit_range.as_deref_mut() {
                emit_range(&elements[chain.range()]);
                continue;
            }
        }
        if unit.kind() != UnitKind::Atomic {
            for &e in &elements[chain.range()] {
                l.element = e;
                if passes(&params.residue_test, &l) {
                    emit(&l);
                }
            }
            continue;
        }
        let residues = &unit.model().atomic.residue_segments;
        for residue in residues.segments_in(elements, chain.range()) {
            l.element = elements[residue.start];
            if !passes(&params.residue_test, &l) {
                continue;
            }
            if residue_level {
                if let Some(emit_range) = emit_range.as_deref_mut() {
                    emit_range(&elements[residue.range()]);
                    continue;
                }
            }
            for &e in &elements[residue.range()] {
                l.element = e;
                if passes(&params.atom_test, &l) {
                    emit(&l);
                }
            }
        }
    }
}

fn atoms_segmented(params: AtomsQuery) -> Query {
    query(move |ctx| {
        let input = ctx.input_structure().clone();
        let mut accepted: Vec<(u32, Vec<usize>)> = Vec::new();
        for unit in input.units() {
            if let Some(test) = &params.unit_test {
                if !test(unit) {
                    continue;
                }
            }
            let mut picked = Vec::new();
            let mut ranges: Vec<usize> = Vec::new();
            let mut push_range = |range: &[usize]| ranges.extend_from_slice(range);
            visit_accepted(&params, unit, |l| picked.push(l.element), Some(&mut push_range));
            // Ranges and single elements both arrive in increasing order, but interleaved.
            picked.extend(ranges);
            picked.sort_unstable();
            accepted.push((unit.id(), picked));
        }

        let mut builder = StructureSubsetBuilder::ordered(&input);
        for (id, elements) in &accepted {
            builder.begin_unit(*id);
            for &e in elements {
                builder.add_element(e);
            }
            builder.commit_unit();
        }
        let subset = Arc::new(builder.build());
        Selection::singletons(input.clone(), subset)
    })
}

fn atoms_grouped(params: AtomsQuery) -> Query {
    query(move |ctx| {
        let input = ctx.input_structure().clone();
        let Some(group_by) = params.group_by.clone() else {
            return Selection::empty(input);
        };
        let mut builder = GroupingBuilder::default();
        for unit in input.units() {
            if let Some(test) = &params.unit_test {
                if !test(unit) {
                    continue;
                }
            }
            visit_accepted(&params, unit, |l| builder.add(unit.id(), group_by(l), l.element), None);
        }
        builder.into_selection(&input)
    })
}

/// Groups elements by `(unit id, key)` in first-seen order.
#[derive(Debug, Default)]
struct GroupingBuilder {
    groups: Vec<(u32, Vec<usize>)>,
    index: HashMap<(u32, u64), usize>,
}

impl GroupingBuilder {
    fn add(&mut self, unit_id: u32, key: u64, element: usize) {
        let next = self.groups.len();
        let slot = *self.index.entry((unit_id, key)).or_insert(next);
        if slot == next {
            self.groups.push((unit_id, Vec::new()));
        }
        self.groups[slot].1.push(element);
    }

    fn into_selection(self, input: &Arc<Structure>) -> Selection {
        let mut builder = LinearBuilder::new(input.clone());
        for (unit_id, mut elements) in self.groups {
            let Some(unit) = input.unit(unit_id) else {
                continue;
            };
            elements.sort_unstable();
            elements.dedup();
            let child = unit.child(SortedSet::from_sorted(elements));
            builder.add(Arc::new(Structure::new(vec![child])));
        }
        builder.into_selection()
    }
}

fn ring_structure(unit: &Arc<Unit>, ring: &SortedSet) -> Arc<Structure> {
    let elements = ring.iter().map(|i| unit.elements()[i]).collect();
    Arc::new(Structure::new(vec![unit.child(SortedSet::from_sorted(elements))]))
}

/// One structure per ring of every atomic unit. With `fingerprints`, only rings with one of
/// those fingerprints; with `only_aromatic`, only aromatic rings.
pub fn rings(fingerprints: &[&str], only_aromatic: bool) -> Query {
    let mut unique: Vec<String> = Vec::new();
    for fp in fingerprints {
        if !unique.iter().any(|u| u == fp) {
            unique.push(fp.to_string());
        }
    }
    query(move |ctx| {
        let input = ctx.input_structure().clone();
        let mut builder = LinearBuilder::new(input.clone());
        for unit in input.units().iter().filter(|u| u.is_atomic()) {
            let rings = unit.rings();
            let candidates: Vec<usize> = if unique.is_empty() {
                (0..rings.len()).collect()
            } else {
                unique
                    .iter()
                    .flat_map(|fp| rings.by_fingerprint(fp).iter().copied())
                    .collect()
            };
            for r in candidates {
                if only_aromatic && !rings.is_aromatic(r) {
                    continue;
                }
                builder.add(ring_structure(unit, &rings.all()[r]));
            }
        }
        builder.into_selection()
    })
}

/// Runs `inner` on the union of what `selection` selects, or on its complement in the input.
pub fn query_selection(selection: Query, inner: Query, in_complement: bool) -> Query {
    query(move |ctx| {
        let target_selection = selection(ctx);
        if target_selection.structure_count() == 0 {
            return target_selection;
        }
        let selected = target_selection.union_structure();
        let target = if in_complement {
            Arc::new(subtract(ctx.input_structure(), &selected))
        } else {
            selected
        };
        if target.is_empty() {
            return Selection::empty(ctx.input_structure().clone());
        }
        ctx.push_input_structure(target);
        let result = inner(ctx);
        ctx.pop_input_structure();
        result.with_input_structure(ctx.input_structure().clone())
    })
}

/// Every bonded atom pair, intra- and inter-unit, accepted by `test`. Each bond is tested
/// from both ends.
pub fn bonded_atomic_pairs(test: Option<BondTest>) -> Query {
    query(move |ctx| {
        let input = ctx.input_structure().clone();
        let mut builder = UniqueBuilder::new(input.clone());
        let accepts = |bond: &BondLocation| test.as_ref().is_none_or(|t| t(bond));
        let pair = |a: &BondLocation| {
            let mut subset = StructureSubsetBuilder::unique(&input);
            subset.add_to_unit(a.a.unit.id(), a.a.element);
            subset.add_to_unit(a.b.unit.id(), a.b.element);
            Arc::new(subset.build())
        };

        for unit in input.units().iter().filter(|u| u.is_atomic()) {
            let graph = unit.bonds();
            for (a, b, props) in graph.edges() {
                let bond = BondLocation {
                    a: Location::new(unit.clone(), unit.elements()[a]),
                    a_index: a,
                    b: Location::new(unit.clone(), unit.elements()[b]),
                    b_index: b,
                    props,
                };
                if accepts(&bond) {
                    builder.add(pair(&bond));
                }
            }
        }
        for edge in input.inter_unit_bonds().edges() {
            let (Some(ua), Some(ub)) = (input.unit(edge.a.unit), input.unit(edge.b.unit)) else {
                continue;
            };
            let bond = BondLocation {
                a: Location::new(ua.clone(), ua.elements()[edge.a.index]),
                a_index: edge.a.index,
                b: Location::new(ub.clone(), ub.elements()[edge.b.index]),
                b_index: edge.b.index,
                props: edge.props,
            };
            if accepts(&bond) {
                builder.add(pair(&bond));
            }
        }
        builder.into_selection()
    })
}
