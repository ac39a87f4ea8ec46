//! Bonds whose endpoints lie in two different units.

use super::graph::BondProps;
use super::tables;
use crate::core::model::topology::{BondFlags, BondOrder};
use crate::engine::config::BondPolicy;
use crate::engine::lookup::grid::LookupResult;
use crate::engine::structure::{Structure, Unit};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// An element addressed by unit id and unit-local index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitElementKey {
    pub unit: u32,
    pub index: usize,
}

impl UnitElementKey {
    pub fn new(unit: u32, index: usize) -> Self {
        Self { unit, index }
    }
}

/// A directed inter-unit edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterUnitEdge {
    pub a: UnitElementKey,
    pub b: UnitElementKey,
    pub props: BondProps,
}

/// Edges from one unit to another, addressed by unit-local indices.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPairBonds {
    pub unit_a: u32,
    pub unit_b: u32,
    edges: Vec<usize>,
    by_index_a: HashMap<usize, Vec<usize>>,
}

impl UnitPairBonds {
    /// Indices into [`InterUnitBonds::edges`].
    pub fn edge_indices(&self) -> &[usize] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Unit-local indices of `unit_a` with at least one bond into `unit_b`.
    pub fn connected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_index_a.keys().copied()
    }

    pub fn edges_from(&self, index_a: usize) -> &[usize] {
        self.by_index_a.get(&index_a).map_or(&[], Vec::as_slice)
    }
}

/// All bonds between units of a structure. Every bond is stored in both directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterUnitBonds {
    edges: Vec<InterUnitEdge>,
    pairs: Vec<UnitPairBonds>,
    pair_index: HashMap<(u32, u32), usize>,
    edge_key_index: HashMap<(UnitElementKey, UnitElementKey), usize>,
    vertex_key_index: HashMap<UnitElementKey, Vec<usize>>,
}

impl InterUnitBonds {
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_edges(edges: Vec<InterUnitEdge>) -> Self {
        let mut pairs: Vec<UnitPairBonds> = Vec::new();
        let mut pair_index: HashMap<(u32, u32), usize> = HashMap::new();
        let mut edge_key_index = HashMap::with_capacity(edges.len());
        let mut vertex_key_index: HashMap<UnitElementKey, Vec<usize>> = HashMap::new();

        for (i, edge) in edges.iter().enumerate() {
            let slot = *pair_index.entry((edge.a.unit, edge.b.unit)).or_insert_with(|| {
                pairs.push(UnitPairBonds {
                    unit_a: edge.a.unit,
                    unit_b: edge.b.unit,
                    edges: Vec::new(),
                    by_index_a: HashMap::new(),
                });
                pairs.len() - 1
            });
            let pair = &mut pairs[slot];
            pair.edges.push(i);
            pair.by_index_a.entry(edge.a.index).or_default().push(i);
            edge_key_index.insert((edge.a, edge.b), i);
            vertex_key_index.entry(edge.a).or_default().push(i);
        }
        Self {
            edges,
            pairs,
            pair_index,
            edge_key_index,
            vertex_key_index,
        }
    }

    /// Number of undirected bonds.
    pub fn edge_count(&self) -> usize {
        self.edges.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Directed edges.
    pub fn edges(&self) -> &[InterUnitEdge] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Option<&InterUnitEdge> {
        self.edges.get(index)
    }

    pub fn unit_pairs(&self) -> &[UnitPairBonds] {
        &self.pairs
    }

    pub fn pair(&self, unit_a: u32, unit_b: u32) -> Option<&UnitPairBonds> {
        self.pair_index.get(&(unit_a, unit_b)).map(|&i| &self.pairs[i])
    }

    /// Directed edge index of `a -> b`; `None` when not bonded.
    pub fn edge_index(&self, a: UnitElementKey, b: UnitElementKey) -> Option<usize> {
        self.edge_key_index.get(&(a, b)).copied()
    }

    pub fn has_edge(&self, a: UnitElementKey, b: UnitElementKey) -> bool {
        self.edge_key_index.contains_key(&(a, b))
    }

    /// Outgoing edges of an element.
    pub fn edges_of(&self, key: UnitElementKey) -> impl Iterator<Item = &InterUnitEdge> + '_ {
        self.vertex_key_index
            .get(&key)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }
}

struct EdgeCollector {
    edges: Vec<InterUnitEdge>,
    seen: HashSet<(UnitElementKey, UnitElementKey)>,
}

impl EdgeCollector {
    fn add(&mut self, a: UnitElementKey, b: UnitElementKey, props: BondProps) {
        let key = if a <= b { (a, b) } else { (b, a) };
        if !self.seen.insert(key) {
            return;
        }
        self.edges.push(InterUnitEdge { a, b, props });
        self.edges.push(InterUnitEdge { a: b, b: a, props });
    }

    fn contains(&self, a: UnitElementKey, b: UnitElementKey) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.seen.contains(&key)
    }
}

/// Finds bonds between every pair of nearby atomic units.
pub fn compute_inter_unit_bonds(structure: &Structure) -> InterUnitBonds {
    let units: Vec<&Arc<Unit>> = structure
        .units()
        .iter()
        .filter(|u| u.is_atomic() && !u.is_empty())
        .collect();
    if units.len() < 2 {
        return InterUnitBonds::empty();
    }
    let lookup = structure.lookup3d();
    let mut collector = EdgeCollector {
        edges: Vec::new(),
        seen: HashSet::new(),
    };

    for unit_a in &units {
        let config = &unit_a.caches().config.bonds;
        let sphere = unit_a.boundary().sphere;
        for i in lookup.find_unit_indices(&sphere.center, sphere.radius + config.max_radius) {
            let unit_b = &lookup.units()[i];
            if unit_b.id() <= unit_a.id() || !unit_b.is_atomic() {
                continue;
            }
            let bbox_a = unit_a.boundary().bbox.expanded(config.max_radius);
            if !bbox_a.overlaps(&unit_b.boundary().bbox) {
                continue;
            }
            add_index_pair_bonds(unit_a, unit_b, config.max_radius, &mut collector);
            add_struct_conn_bonds(unit_a, unit_b, config.max_radius, &mut collector);
            if infers_geometry(unit_a, config.policy) {
                add_geometric_bonds(unit_a, unit_b, config.max_radius, &mut collector);
            }
        }
    }

    let bonds = InterUnitBonds::from_edges(collector.edges);
    debug!(
        units = units.len(),
        bonds = bonds.edge_count(),
        "Computed inter-unit bonds."
    );
    bonds
}

fn infers_geometry(unit: &Unit, policy: BondPolicy) -> bool {
    let model = unit.model();
    match policy {
        BondPolicy::Auto => {
            !model.is_coarse_grained()
                && model.index_pair_bonds.as_ref().is_none_or(|p| p.is_empty())
        }
        BondPolicy::ExplicitOnly => false,
        BondPolicy::AlwaysInfer => true,
    }
}

/// A record links the units when both partners share a frame with units carrying the same
/// operator, or when each partner names the operator of its unit.
fn symmetry_matches(own: &str, partner: &str, unit_a: &Unit, unit_b: &Unit) -> bool {
    let name_a = unit_a.operator().name();
    let name_b = unit_b.operator().name();
    (own == partner && name_a == name_b) || (own == name_a && partner == name_b)
}

/// Maximum deviation from a recorded index-pair distance, in Å.
const INDEX_PAIR_DISTANCE_TOLERANCE: f64 = 0.3;

fn add_index_pair_bonds(unit_a: &Unit, unit_b: &Unit, max_radius: f64, out: &mut EdgeCollector) {
    if !Arc::ptr_eq(unit_a.model(), unit_b.model()) {
        return;
    }
    let model = unit_a.model();
    let Some(pairs) = model.index_pair_bonds.as_ref().filter(|p| !p.is_empty()) else {
        return;
    };
    let atomic = &model.atomic;
    let key_a = unit_a.operator().key();
    let key_b = unit_b.operator().key();

    for (a, atom) in unit_a.elements().iter().enumerate() {
        for (row, bond) in pairs.rows_for(atom) {
            let (partner, own_op, partner_op) = if bond.a == atom {
                (bond.b, bond.operator_a, bond.operator_b)
            } else {
                (bond.a, bond.operator_b, bond.operator_a)
            };
            let Some(b) = unit_b.elements().index_of(partner) else {
                continue;
            };
            if own_op.is_some_and(|k| Some(k) != key_a) || partner_op.is_some_and(|k| Some(k) != key_b) {
                continue;
            }
            let d = nalgebra::distance(&unit_a.position(atom), &unit_b.position(partner));
            let accept = match bond.distance {
                Some(recorded) => (d - recorded).abs() <= INDEX_PAIR_DISTANCE_TOLERANCE,
                None => {
                    let both_hydrogen = tables::is_hydrogen(atomic.element(atom))
                        && tables::is_hydrogen(atomic.element(partner));
                    !both_hydrogen && d <= max_radius
                }
            };
            if accept {
                out.add(
                    UnitElementKey::new(unit_a.id(), a),
                    UnitElementKey::new(unit_b.id(), b),
                    BondProps {
                        flags: bond.flags,
                        order: bond.order,
                        key: row as i32,
                    },
                );
            }
        }
    }
}

fn add_struct_conn_bonds(unit_a: &Unit, unit_b: &Unit, max_radius: f64, out: &mut EdgeCollector) {
    if !Arc::ptr_eq(unit_a.model(), unit_b.model()) {
        return;
    }
    let model = unit_a.model();
    if model.struct_conn.is_empty() {
        return;
    }
    for (a, atom) in unit_a.elements().iter().enumerate() {
        for entry in model.struct_conn.entries_for(atom) {
            if !entry.is_bond() {
                continue;
            }
            let (own, partner) = if entry.partner_a.atom == atom {
                (&entry.partner_a, &entry.partner_b)
            } else {
                (&entry.partner_b, &entry.partner_a)
            };
            let Some(b) = unit_b.elements().index_of(partner.atom) else {
                continue;
            };
            if !symmetry_matches(&own.symmetry, &partner.symmetry, unit_a, unit_b) {
                continue;
            }
            let d = nalgebra::distance(&unit_a.position(atom), &unit_b.position(partner.atom));
            if d > max_radius {
                continue;
            }
            out.add(
                UnitElementKey::new(unit_a.id(), a),
                UnitElementKey::new(unit_b.id(), b),
                BondProps {
                    flags: entry.flags,
                    order: entry.order,
                    key: entry.row as i32,
                },
            );
        }
    }
}

fn add_geometric_bonds(unit_a: &Unit, unit_b: &Unit, max_radius: f64, out: &mut EdgeCollector) {
    let atomic_a = &unit_a.model().atomic;
    let atomic_b = &unit_b.model().atomic;
    let sphere_b = unit_b.boundary().sphere;
    let mut hits = LookupResult::new();

    for (a, atom_a) in unit_a.elements().iter().enumerate() {
        let position = unit_a.position(atom_a);
        if !sphere_b.contains(&position, max_radius) {
            continue;
        }
        let element_a = atomic_a.element(atom_a);
        let alt_a = atomic_a.alt_id(atom_a);
        let hydrogen_a = tables::is_hydrogen(element_a);
        let metal_a = tables::is_metal(element_a);
        let key_a = UnitElementKey::new(unit_a.id(), a);

        unit_b.find_into(&position, max_radius, &mut hits);
        for (b, d2) in hits.iter() {
            let key_b = UnitElementKey::new(unit_b.id(), b);
            if d2 == 0.0 || out.contains(key_a, key_b) {
                continue;
            }
            let atom_b = unit_b.elements().as_slice()[b];
            let alt_b = atomic_b.alt_id(atom_b);
            if !alt_a.is_empty() && !alt_b.is_empty() && alt_a != alt_b {
                continue;
            }
            let element_b = atomic_b.element(atom_b);
            let hydrogen_b = tables::is_hydrogen(element_b);
            if hydrogen_a && hydrogen_b {
                continue;
            }
            let threshold = tables::pairing_threshold(element_a, element_b);
            if d2 > threshold * threshold {
                continue;
            }
            let is_metal = (metal_a || tables::is_metal(element_b)) && !(hydrogen_a || hydrogen_b);
            let kind = if is_metal {
                BondFlags::METALLIC_COORDINATION
            } else {
                BondFlags::COVALENT
            };
            out.add(
                key_a,
                key_b,
                BondProps {
                    flags: kind | BondFlags::COMPUTED,
                    order: BondOrder::Single,
                    key: -1,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::CategoryData;
    use crate::core::symmetry::operator::{Provenance, SymmetryOperator};
    use crate::engine::structure::StructureBuilder;
    use crate::test_support::{self, atom_site, table};
    use nalgebra::{Matrix3, Vector3};

    #[test]
    fn close_chains_are_bonded_in_both_directions() {
        let structure = test_support::two_chain_structure(1.5);
        let bonds = structure.inter_unit_bonds();
        assert_eq!(bonds.edge_count(), 1);
        let c = UnitElementKey::new(0, 2);
        let n = UnitElementKey::new(1, 0);
        let forward = bonds.edge_index(c, n).unwrap();
        let backward = bonds.edge_index(n, c).unwrap();
        assert_eq!(bonds.edges()[forward].props, bonds.edges()[backward].props);
        assert!(bonds.edges()[forward].props.flags.contains(BondFlags::COMPUTED));
        assert_eq!(bonds.pair(0, 1).unwrap().len(), 1);
        assert_eq!(bonds.pair(1, 0).unwrap().edges_from(0), &[backward]);
    }

    #[test]
    fn distant_chains_have_no_bonds() {
        let structure = test_support::two_chain_structure(5.0);
        let bonds = structure.inter_unit_bonds();
        assert!(bonds.is_empty());
        assert!(bonds.edge_index(UnitElementKey::new(0, 2), UnitElementKey::new(1, 0)).is_none());
        assert!(bonds.pair(0, 1).is_none());
    }

    #[test]
    fn struct_conn_links_chains_beyond_inference_range() {
        let data = CategoryData::new()
            .with(atom_site(&[
                ("S", "SG", "CYS", "A", 1, [0.0, 0.0, 0.0]),
                ("S", "SG", "CYS", "B", 1, [3.1, 0.0, 0.0]),
            ]))
            .with(table(
                "struct_conn",
                &[
                    "conn_type_id",
                    "ptnr1_label_asym_id",
                    "ptnr1_label_seq_id",
                    "ptnr1_label_atom_id",
                    "ptnr2_label_asym_id",
                    "ptnr2_label_seq_id",
                    "ptnr2_label_atom_id",
                ],
                &[vec!["disulf", "A", "1", "SG", "B", "1", "SG"]],
            ));
        let structure = test_support::structure(&data);
        let bonds = structure.inter_unit_bonds();
        assert_eq!(bonds.edge_count(), 1);
        let edge = bonds
            .edges_of(UnitElementKey::new(1, 0))
            .next()
            .unwrap();
        assert_eq!(edge.b, UnitElementKey::new(0, 0));
        assert!(edge.props.flags.contains(BondFlags::DISULFIDE));
    }

    #[test]
    fn index_pairs_link_chains_without_inference() {
        let data = CategoryData::new()
            .with(atom_site(&[
                ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
                ("C", "C2", "LIG", "A", 1, [1.5, 0.0, 0.0]),
                ("C", "C1", "LIG", "B", 1, [3.0, 0.0, 0.0]),
                ("C", "C2", "LIG", "B", 1, [4.5, 0.0, 0.0]),
            ]))
            .with(table(
                "index_pair_bond",
                &["atom_id_1", "atom_id_2", "value_order", "distance"],
                &[
                    vec!["1", "2", "sing", "1.5"],
                    vec!["2", "3", "doub", "1.5"],
                    vec!["3", "4", "sing", "1.5"],
                ],
            ));
        let structure = test_support::structure(&data);
        assert_eq!(structure.units()[0].bonds().edge_count(), 1);
        let bonds = structure.inter_unit_bonds();
        assert_eq!(bonds.edge_count(), 1);
        let a = UnitElementKey::new(structure.units()[0].id(), 1);
        let b = UnitElementKey::new(structure.units()[1].id(), 0);
        let edge = bonds.edge(bonds.edge_index(a, b).unwrap()).unwrap();
        assert_eq!(edge.props.order, BondOrder::Double);
        assert_eq!(edge.props.key, 1);
        assert!(!edge.props.flags.contains(BondFlags::COMPUTED));
        assert!(bonds.has_edge(b, a));
    }

    #[test]
    fn symmetry_copies_bond_across_the_operator() {
        let structure = test_support::two_chain_structure(20.0);
        let unit = &structure.units()[0];
        let shift = Arc::new(SymmetryOperator::of_rotation_and_offset(
            "shift",
            &Matrix3::identity(),
            &Vector3::new(4.5, 0.0, 0.0),
            Provenance::default(),
        ));
        let mut builder = StructureBuilder::new();
        builder.add_existing(unit.clone());
        builder.add_with_operator(unit, shift, false);
        let expanded = builder.build();
        let bonds = expanded.inter_unit_bonds();
        assert_eq!(bonds.edge_count(), 1);
        let copy_id = expanded.units()[1].id();
        assert!(bonds.has_edge(UnitElementKey::new(unit.id(), 2), UnitElementKey::new(copy_id, 0)));
    }
}
