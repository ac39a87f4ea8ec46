//! Bonds between elements of a single atomic unit.
//!
//! Explicit records (`struct_conn`, index pairs) are applied first. Geometric inference then
//! scans each atom's neighborhood: pairs within one residue are resolved through the component
//! dictionary when both atoms have entries, everything else through element-pair distance
//! thresholds.

use super::graph::{BondGraph, BondGraphBuilder, BondProps};
use super::tables;
use crate::core::model::connectivity::{ComponentBond, IndexPairBonds};
use crate::core::model::topology::{BondFlags, BondOrder};
use crate::engine::config::{BondConfig, BondPolicy};
use crate::engine::lookup::grid::LookupResult;
use crate::engine::structure::unit::Unit;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Maximum deviation from a recorded index-pair distance, in Å.
const INDEX_PAIR_DISTANCE_TOLERANCE: f64 = 0.3;

/// Which stages run for a unit under a given policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stages {
    index_pairs: bool,
    struct_conn: bool,
    dictionary: bool,
    inference: bool,
}

fn stages(policy: BondPolicy, has_index_pairs: bool, coarse_grained: bool) -> Stages {
    match policy {
        BondPolicy::Auto if has_index_pairs => Stages {
            index_pairs: true,
            struct_conn: false,
            dictionary: false,
            inference: false,
        },
        BondPolicy::Auto => Stages {
            index_pairs: false,
            struct_conn: true,
            dictionary: !coarse_grained,
            inference: !coarse_grained,
        },
        BondPolicy::ExplicitOnly => Stages {
            index_pairs: has_index_pairs,
            struct_conn: true,
            dictionary: true,
            inference: false,
        },
        BondPolicy::AlwaysInfer => Stages {
            index_pairs: has_index_pairs,
            struct_conn: true,
            dictionary: true,
            inference: true,
        },
    }
}

/// Collects unit-local edges, keeping the first source that reports a pair.
struct EdgeSet {
    builder: BondGraphBuilder,
    seen: HashSet<(usize, usize)>,
}

impl EdgeSet {
    fn new(n: usize) -> Self {
        Self {
            builder: BondGraphBuilder::new(n),
            seen: HashSet::new(),
        }
    }

    fn contains(&self, a: usize, b: usize) -> bool {
        self.seen.contains(&ordered(a, b))
    }

    fn add(&mut self, a: usize, b: usize, props: BondProps) -> bool {
        if a == b || !self.seen.insert(ordered(a, b)) {
            return false;
        }
        self.builder.add(a, b, props);
        true
    }
}

#[inline]
fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Computes the bond graph of an atomic unit. Vertices are unit-local indices.
pub fn compute_intra_unit_bonds(unit: &Unit, config: &BondConfig) -> BondGraph {
    let n = unit.len();
    if !unit.is_atomic() || n == 0 {
        return BondGraph::empty(n);
    }
    let model = unit.model();
    let index_pairs = model.index_pair_bonds.as_ref().filter(|p| !p.is_empty());
    let stages = stages(config.policy, index_pairs.is_some(), model.is_coarse_grained());

    let mut edges = EdgeSet::new(n);
    if let (true, Some(pairs)) = (stages.index_pairs, index_pairs) {
        add_index_pair_bonds(unit, pairs, config, &mut edges);
    }
    if stages.struct_conn {
        add_struct_conn_bonds(unit, &mut edges);
    }
    if stages.dictionary || stages.inference {
        add_neighbor_bonds(unit, config, stages.inference, &mut edges);
    }

    let graph = edges.builder.build();
    debug!(
        unit = unit.id(),
        atoms = n,
        bonds = graph.edge_count(),
        policy = %config.policy,
        "Computed intra-unit bonds."
    );
    graph
}

fn add_index_pair_bonds(unit: &Unit, pairs: &IndexPairBonds, config: &BondConfig, edges: &mut EdgeSet) {
    let elements = unit.elements();
    let operator_key = unit.operator().key();
    let atomic = &unit.model().atomic;

    for (key, bond) in pairs.bonds.iter().enumerate() {
        let (Some(a), Some(b)) = (elements.index_of(bond.a), elements.index_of(bond.b)) else {
            continue;
        };
        if a == b {
            continue;
        }
        let operators_match = [bond.operator_a, bond.operator_b]
            .iter()
            .all(|op| op.is_none_or(|k| Some(k) == operator_key));
        if !operators_match {
            continue;
        }
        let d = nalgebra::distance(&unit.model_position(bond.a), &unit.model_position(bond.b));
        let accept = match bond.distance {
            Some(recorded) => (d - recorded).abs() <= INDEX_PAIR_DISTANCE_TOLERANCE,
            None => {
                let both_hydrogen = tables::is_hydrogen(atomic.element(bond.a))
                    && tables::is_hydrogen(atomic.element(bond.b));
                !both_hydrogen && d <= config.max_radius
            }
        };
        if accept {
            edges.add(
                a,
                b,
                BondProps {
                    flags: bond.flags,
                    order: bond.order,
                    key: key as i32,
                },
            );
        }
    }
}

fn add_struct_conn_bonds(unit: &Unit, edges: &mut EdgeSet) {
    let model = unit.model();
    if model.struct_conn.is_empty() {
        return;
    }
    let elements = unit.elements();
    for (a, atom) in elements.iter().enumerate() {
        for entry in model.struct_conn.entries_for(atom) {
            if !entry.is_bond() {
                continue;
            }
            let (own, partner) = if entry.partner_a.atom == atom {
                (&entry.partner_a, &entry.partner_b)
            } else {
                (&entry.partner_b, &entry.partner_a)
            };
            if own.symmetry != partner.symmetry {
                continue;
            }
            let Some(b) = elements.index_of(partner.atom) else {
                continue;
            };
            if b < a {
                continue;
            }
            edges.add(
                a,
                b,
                BondProps {
                    flags: entry.flags,
                    order: entry.order,
                    key: entry.row as i32,
                },
            );
        }
    }
}

fn add_neighbor_bonds(unit: &Unit, config: &BondConfig, infer: bool, edges: &mut EdgeSet) {
    let model = unit.model();
    let atomic = &model.atomic;
    let elements = unit.elements();
    let lookup = unit.lookup();
    let mut hits = LookupResult::new();

    let mut last_residue = usize::MAX;
    let mut dictionary: Option<&str> = None;

    for (a, atom_a) in elements.iter().enumerate() {
        let residue_a = atomic.residue_index(atom_a);
        if residue_a != last_residue {
            last_residue = residue_a;
            dictionary = component_for(unit, atom_a);
        }
        let element_a = atomic.element(atom_a);
        let name_a = atomic.atom_name(atom_a);
        let alt_a = atomic.alt_id(atom_a);
        let hydrogen_a = tables::is_hydrogen(element_a);
        let metal_a = tables::is_metal(element_a);
        let atom_bonds: Option<&HashMap<String, ComponentBond>> =
            dictionary.and_then(|comp| model.component_bonds.atom_bonds(comp, name_a));

        lookup.find_into(&unit.model_position(atom_a), config.max_radius, &mut hits);
        for (b, d2) in hits.iter() {
            if b <= a || edges.contains(a, b) {
                continue;
            }
            let atom_b = elements.as_slice()[b];
            let alt_b = atomic.alt_id(atom_b);
            if !alt_a.is_empty() && !alt_b.is_empty() && alt_a != alt_b {
                continue;
            }
            let element_b = atomic.element(atom_b);
            let hydrogen_b = tables::is_hydrogen(element_b);
            if hydrogen_a && hydrogen_b {
                continue;
            }
            let is_metal = (metal_a || tables::is_metal(element_b)) && !(hydrogen_a || hydrogen_b);
            let same_residue = atomic.residue_index(atom_b) == residue_a;

            let name_b = atomic.atom_name(atom_b);
            let in_dictionary = atom_bonds.is_some()
                && dictionary.is_some_and(|comp| model.component_bonds.atom_bonds(comp, name_b).is_some());
            if same_residue && in_dictionary {
                if let Some(bond) = atom_bonds.and_then(|m| m.get(name_b)) {
                    let flags = if is_metal {
                        bond.flags.remove(BondFlags::COVALENT) | BondFlags::METALLIC_COORDINATION
                    } else {
                        bond.flags
                    };
                    edges.add(
                        a,
                        b,
                        BondProps {
                            flags,
                            order: bond.order,
                            key: bond.key,
                        },
                    );
                }
                continue;
            }
            if !infer || d2 == 0.0 {
                continue;
            }
            let threshold = tables::pairing_threshold(element_a, element_b);
            if d2 <= threshold * threshold {
                let order = if same_residue {
                    tables::intra_bond_order(atomic.comp_id(atom_a), name_a, name_b)
                } else {
                    BondOrder::Single
                };
                let kind = if is_metal {
                    BondFlags::METALLIC_COORDINATION
                } else {
                    BondFlags::COVALENT
                };
                edges.add(
                    a,
                    b,
                    BondProps {
                        flags: kind | BondFlags::COMPUTED,
                        order,
                        key: -1,
                    },
                );
            }
        }
    }
}

/// Component id whose dictionary applies to the residue of `atom`, if any. Residues at
/// sequence positions with microheterogeneity fall back to distance inference.
fn component_for(unit: &Unit, atom: usize) -> Option<&str> {
    let model = unit.model();
    let atomic = &model.atomic;
    let comp = atomic.comp_id(atom);
    if !model.component_bonds.has_component(comp) {
        return None;
    }
    let residue = atomic.residue_index(atom);
    if let Some(seq) = atomic.residues.seq_id(residue) {
        if model
            .entities
            .has_microheterogeneity(atomic.entity_id(atom), seq)
        {
            return None;
        }
    }
    Some(comp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::CategoryData;
    use crate::engine::config::ModelConfigBuilder;
    use crate::test_support::{atom_site, structure, structure_with, table};

    fn bonds_of(data: &CategoryData) -> BondGraph {
        let structure = structure(data);
        structure.units()[0].bonds().as_ref().clone()
    }

    #[test]
    fn carbons_bond_by_distance_only_when_close() {
        let graph = bonds_of(&CategoryData::new().with(atom_site(&[
            ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
            ("C", "C2", "LIG", "A", 1, [1.5, 0.0, 0.0]),
            ("C", "C3", "LIG", "A", 1, [6.5, 0.0, 0.0]),
        ])));
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(1, 2));
        let edge = graph.edge_index(0, 1).unwrap();
        assert!(graph.flags()[edge].contains(BondFlags::COVALENT | BondFlags::COMPUTED));
        assert_eq!(graph.keys()[edge], -1);
    }

    #[test]
    fn graph_is_symmetric() {
        let graph = bonds_of(&CategoryData::new().with(atom_site(&[
            ("N", "N", "ALA", "A", 1, [0.0, 0.0, 0.0]),
            ("C", "CA", "ALA", "A", 1, [1.45, 0.0, 0.0]),
            ("C", "C", "ALA", "A", 1, [2.0, 1.4, 0.0]),
            ("O", "O", "ALA", "A", 1, [3.2, 1.5, 0.0]),
        ])));
        for (a, b, props) in graph.edges() {
            let reverse = graph.edge_index(b, a).unwrap();
            assert_eq!(graph.props(reverse), props);
        }
        let co = graph.edge_index(2, 3).unwrap();
        assert_eq!(graph.orders()[co], BondOrder::Double);
    }

    #[test]
    fn hydrogens_never_bond_to_each_other() {
        let graph = bonds_of(&CategoryData::new().with(atom_site(&[
            ("H", "H1", "HOH", "A", 1, [0.0, 0.0, 0.0]),
            ("H", "H2", "HOH", "A", 1, [0.7, 0.0, 0.0]),
        ])));
        assert!(graph.is_empty());
    }

    #[test]
    fn metal_contacts_are_coordination_bonds() {
        let graph = bonds_of(&CategoryData::new().with(atom_site(&[
            ("ZN", "ZN", "ZN", "A", 1, [0.0, 0.0, 0.0]),
            ("N", "NE2", "HIS", "A", 2, [2.1, 0.0, 0.0]),
        ])));
        let edge = graph.edge_index(0, 1).unwrap();
        let flags = graph.flags()[edge];
        assert!(flags.contains(BondFlags::METALLIC_COORDINATION));
        assert!(!flags.contains(BondFlags::COVALENT));
    }

    #[test]
    fn alternate_locations_only_bond_to_compatible_partners() {
        let data = CategoryData::new().with(table(
            "atom_site",
            &["id", "type_symbol", "label_atom_id", "label_alt_id", "label_comp_id",
              "label_asym_id", "label_seq_id", "Cartn_x", "Cartn_y", "Cartn_z"],
            &[
                vec!["1", "C", "CA", ".", "SER", "A", "1", "0", "0", "0"],
                vec!["2", "C", "CB", "A", "SER", "A", "1", "1.5", "0", "0"],
                vec!["3", "C", "CB", "B", "SER", "A", "1", "1.5", "0.2", "0"],
                vec!["4", "O", "OG", "A", "SER", "A", "1", "2.9", "0", "0"],
            ],
        ));
        let graph = bonds_of(&data);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(0, 2));
        assert!(graph.has_edge(1, 3));
        assert!(!graph.has_edge(1, 2));
        assert!(!graph.has_edge(2, 3));
    }

    #[test]
    fn dictionary_bonds_replace_distance_inference_within_a_residue() {
        let data = CategoryData::new()
            .with(atom_site(&[
                ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
                ("C", "C2", "LIG", "A", 1, [1.5, 0.0, 0.0]),
                ("C", "C3", "LIG", "A", 1, [3.0, 0.0, 0.0]),
            ]))
            .with(table(
                "chem_comp_bond",
                &["comp_id", "atom_id_1", "atom_id_2", "value_order"],
                &[vec!["LIG", "C1", "C2", "doub"], vec!["LIG", "C3", "O4", "sing"]],
            ));
        let graph = bonds_of(&data);
        // C2-C3 is within bonding distance, but both atoms are listed without that pair.
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.has_edge(1, 2));
        let edge = graph.edge_index(0, 1).unwrap();
        assert_eq!(graph.orders()[edge], BondOrder::Double);
        assert!(!graph.flags()[edge].contains(BondFlags::COMPUTED));
        assert!(graph.keys()[edge] >= 0);
    }

    #[test]
    fn atoms_missing_from_the_dictionary_fall_back_to_distance() {
        let dictionary = table(
            "chem_comp_bond",
            &["comp_id", "atom_id_1", "atom_id_2", "value_order"],
            &[vec!["LIG", "C1", "C2", "sing"]],
        );
        let leading = bonds_of(
            &CategoryData::new()
                .with(atom_site(&[
                    ("C", "X1", "LIG", "A", 1, [-1.5, 0.0, 0.0]),
                    ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
                    ("C", "C2", "LIG", "A", 1, [1.5, 0.0, 0.0]),
                ]))
                .with(dictionary.clone()),
        );
        assert_eq!(leading.edge_count(), 2);
        let x1 = leading.edge_index(0, 1).unwrap();
        assert!(leading.flags()[x1].contains(BondFlags::COMPUTED));
        assert!(!leading.flags()[leading.edge_index(1, 2).unwrap()].contains(BondFlags::COMPUTED));

        let trailing = bonds_of(
            &CategoryData::new()
                .with(atom_site(&[
                    ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
                    ("C", "C2", "LIG", "A", 1, [1.5, 0.0, 0.0]),
                    ("C", "X1", "LIG", "A", 1, [-1.5, 0.0, 0.0]),
                ]))
                .with(dictionary),
        );
        assert_eq!(trailing.edge_count(), 2);
        assert!(trailing.has_edge(0, 2));
    }

    #[test]
    fn carbons_five_angstroms_apart_are_not_bonded() {
        let graph = bonds_of(&CategoryData::new().with(atom_site(&[
            ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
            ("C", "C2", "LIG", "A", 1, [5.0, 0.0, 0.0]),
        ])));
        assert!(graph.is_empty());
    }

    #[test]
    fn struct_conn_bonds_beyond_inference_range() {
        let data = CategoryData::new()
            .with(atom_site(&[
                ("S", "SG", "CYS", "A", 1, [0.0, 0.0, 0.0]),
                ("S", "SG", "CYS", "A", 2, [3.0, 0.0, 0.0]),
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
                &[vec!["disulf", "A", "1", "SG", "A", "2", "SG"]],
            ));
        let graph = bonds_of(&data);
        let edge = graph.edge_index(1, 0).unwrap();
        assert!(graph.flags()[edge].contains(BondFlags::DISULFIDE));
        assert_eq!(graph.keys()[edge], 0);
    }

    fn index_pair_data(distance: &str) -> CategoryData {
        CategoryData::new()
            .with(atom_site(&[
                ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
                ("C", "C2", "LIG", "A", 1, [1.5, 0.0, 0.0]),
                ("C", "C3", "LIG", "A", 1, [3.0, 0.0, 0.0]),
            ]))
            .with(table(
                "index_pair_bond",
                &["atom_id_1", "atom_id_2", "value_order", "distance"],
                &[vec!["1", "3", "sing", distance]],
            ))
    }

    #[test]
    fn index_pairs_suppress_inference_under_auto() {
        let graph = bonds_of(&index_pair_data("3.0"));
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge(0, 2));
        assert_eq!(graph.keys()[graph.edge_index(0, 2).unwrap()], 0);
    }

    #[test]
    fn index_pairs_with_mismatched_distance_are_rejected() {
        let graph = bonds_of(&index_pair_data("1.0"));
        assert!(graph.is_empty());
    }

    #[test]
    fn always_infer_combines_index_pairs_and_inference() {
        let config = ModelConfigBuilder::new()
            .bond_policy(BondPolicy::AlwaysInfer)
            .build()
            .unwrap();
        let structure = structure_with(&index_pair_data("3.0"), config);
        let graph = structure.units()[0].bonds();
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn explicit_only_skips_distance_inference() {
        let config = ModelConfigBuilder::new()
            .bond_policy(BondPolicy::ExplicitOnly)
            .build()
            .unwrap();
        let data = CategoryData::new().with(atom_site(&[
            ("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0]),
            ("C", "C2", "LIG", "A", 1, [1.5, 0.0, 0.0]),
        ]));
        let structure = structure_with(&data, config);
        assert!(structure.units()[0].bonds().is_empty());
    }

    #[test]
    fn coarse_grained_models_skip_inference_under_auto() {
        let data = CategoryData::new().with(atom_site(&[
            ("C", "CA", "ALA", "A", 1, [0.0, 0.0, 0.0]),
            ("C", "CA", "GLY", "A", 2, [1.7, 0.0, 0.0]),
        ]));
        let structure = structure(&data);
        assert!(structure.units()[0].model().is_coarse_grained());
        assert!(structure.units()[0].bonds().is_empty());
    }
}
