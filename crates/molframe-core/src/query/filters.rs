//! Queries that keep or drop the structures selected by another query.

use super::context::{BondLocation, BondTest, ElementRadius, Query, StructureTest, query};
use super::selection::{LinearBuilder, Selection};
use crate::core::collections::sorted::SortedSet;
use crate::engine::bonds::inter::UnitElementKey;
use crate::engine::structure::set_ops::are_intersecting;
use crate::engine::structure::{Location, Structure};
use std::sync::Arc;

/// Structures of `source` accepted by `test`.
pub fn pick(source: Query, test: StructureTest) -> Query {
    query(move |ctx| {
        let selection = source(ctx);
        let mut builder = LinearBuilder::new(ctx.input_structure().clone());
        selection.for_each(|s, _| {
            if test(&s) {
                builder.add(s);
            }
        });
        builder.into_selection()
    })
}

/// The first selected structure; for singletons, the first element.
pub fn first(source: Query) -> Query {
    query(move |ctx| {
        let selection = source(ctx);
        let mut builder = LinearBuilder::new(ctx.input_structure().clone());
        match &selection {
            Selection::Singletons { structure, .. } => {
                let head = structure
                    .units()
                    .iter()
                    .find_map(|u| u.elements().first().map(|e| (u, e)));
                if let Some((unit, element)) = head {
                    let single = unit.child(SortedSet::from_sorted(vec![element]));
                    builder.add(Arc::new(Structure::new(vec![single])));
                }
            }
            Selection::Sequence { structures, .. } => {
                if let Some(s) = structures.first() {
                    builder.add(s.clone());
                }
            }
        }
        builder.into_selection()
    })
}

/// Structures of `source` sharing at least one element with what `by` selects.
pub fn are_intersected_by(source: Query, by: Query) -> Query {
    query(move |ctx| {
        let mask = by(ctx).union_structure();
        let selection = source(ctx);
        let mut builder = LinearBuilder::new(ctx.input_structure().clone());
        selection.for_each(|s, _| {
            if are_intersecting(&mask, &s) {
                builder.add(s);
            }
        });
        builder.into_selection()
    })
}

/// Parameters of [`within`].
#[derive(Clone)]
pub struct WithinParams {
    pub query: Query,
    pub target: Query,
    /// Without a minimum the target's spatial lookup answers the test directly.
    pub min_radius: Option<f64>,
    pub max_radius: f64,
    /// Radius subtracted from each element's distances; zero when unset.
    pub element_radius: Option<ElementRadius>,
    pub invert: bool,
}

impl WithinParams {
    pub fn new(query: Query, target: Query, max_radius: f64) -> Self {
        Self {
            query,
            target,
            min_radius: None,
            max_radius,
            element_radius: None,
            invert: false,
        }
    }

    pub fn min_radius(mut self, min_radius: f64) -> Self {
        self.min_radius = Some(min_radius.max(0.0));
        self
    }

    pub fn element_radius(mut self, radius: ElementRadius) -> Self {
        self.element_radius = Some(radius);
        self
    }

    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }
}

/// Structures of `params.query` with some element near an element of `params.target`.
///
/// - no minimum radius: some target element lies within `max_radius` plus the element's own
///   radius, answered by the target's structure lookup;
/// - minimum radius `0`: some pair of elements is at most `max_radius` apart after subtracting
///   both element radii;
/// - positive minimum radius: the smallest such pair distance lies in `[min, max]`.
pub fn within(params: WithinParams) -> Query {
    query(move |ctx| {
        let selection = (params.query)(ctx);
        let target = (params.target)(ctx).union_structure();
        let mut builder = LinearBuilder::new(ctx.input_structure().clone());
        let distances = params
            .min_radius
            .map(|_| PairDistances::new(&target, params.element_radius.as_ref()));
        selection.for_each(|s, _| {
            let hit = match (params.min_radius, &distances) {
                (Some(min), Some(distances)) if min > 0.0 => distances
                    .min_within(&s, params.max_radius)
                    .is_some_and(|d| d >= min),
                (Some(_), Some(distances)) => distances.min_within(&s, params.max_radius).is_some(),
                _ => within_max_radius_lookup(&target, &s, params.max_radius),
            };
            if hit != params.invert {
                builder.add(s);
            }
        });
        builder.into_selection()
    })
}

fn within_max_radius_lookup(target: &Structure, s: &Structure, max_radius: f64) -> bool {
    let lookup = target.lookup3d();
    s.units().iter().any(|unit| {
        unit.elements()
            .iter()
            .any(|e| lookup.check(&unit.position(e), max_radius + unit.element_radius(e)))
    })
}

/// Radius-adjusted distances from elements of a structure to a fixed target.
struct PairDistances<'a> {
    target: &'a Structure,
    radius: Option<&'a ElementRadius>,
    max_target_radius: f64,
}

impl<'a> PairDistances<'a> {
    fn new(target: &'a Structure, radius: Option<&'a ElementRadius>) -> Self {
        let max_target_radius = match radius {
            None => 0.0,
            Some(r) => target
                .units()
                .iter()
                .flat_map(|u| u.elements().iter().map(move |e| r(&Location::new(u.clone(), e))))
                .fold(0.0, f64::max),
        };
        Self {
            target,
            radius,
            max_target_radius,
        }
    }

    fn radius_of(&self, location: &Location) -> f64 {
        self.radius.map_or(0.0, |r| r(location))
    }

    /// The smallest adjusted distance from `s` to the target, if it is at most `max_radius`.
    fn min_within(&self, s: &Structure, max_radius: f64) -> Option<f64> {
        let lookup = self.target.lookup3d();
        let mut best: Option<f64> = None;
        for unit in s.units() {
            let mut a = Location::new(unit.clone(), 0);
            for e in unit.elements().iter() {
                a.element = e;
                let ra = self.radius_of(&a);
                let p = unit.position(e);
                let hits = lookup.find(&p, max_radius + ra + self.max_target_radius);
                for (unit_id, index, d2) in hits.iter() {
                    let Some(b) = self
                        .target
                        .unit(unit_id)
                        .and_then(|u| Location::at(u, index))
                    else {
                        continue;
                    };
                    let d = d2.sqrt() - ra - self.radius_of(&b);
                    if d <= max_radius && best.is_none_or(|current| d < current) {
                        best = Some(d);
                    }
                }
            }
        }
        best
    }
}

/// Parameters of [`is_connected_to`].
#[derive(Clone)]
pub struct ConnectedParams {
    pub query: Query,
    pub target: Query,
    /// Ignore bonds whose far end lies in the tested structure itself.
    pub disjunct: bool,
    pub invert: bool,
    pub bond_test: Option<BondTest>,
}

impl ConnectedParams {
    pub fn new(query: Query, target: Query) -> Self {
        Self {
            query,
            target,
            disjunct: false,
            invert: false,
            bond_test: None,
        }
    }

    pub fn disjunct(mut self, disjunct: bool) -> Self {
        self.disjunct = disjunct;
        self
    }

    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn bond_test(mut self, test: BondTest) -> Self {
        self.bond_test = Some(test);
        self
    }
}

/// Structures of `params.query` bonded, intra- or inter-unit, to an element of
/// `params.target`.
pub fn is_connected_to(params: ConnectedParams) -> Query {
    query(move |ctx| {
        let target_selection = (params.target)(ctx);
        if target_selection.is_empty() && !params.invert {
            return target_selection;
        }
        let selection = (params.query)(ctx);
        if selection.is_empty() {
            return selection;
        }
        let input = ctx.input_structure().clone();
        let target = target_selection.union_structure();
        let mut builder = LinearBuilder::new(input.clone());
        selection.for_each(|s, _| {
            let connected = is_connected(&input, &target, &s, &params);
            if connected != params.invert {
                builder.add(s);
            }
        });
        builder.into_selection()
    })
}

fn has_element(structure: &Structure, unit_id: u32, element: usize) -> bool {
    structure
        .unit(unit_id)
        .is_some_and(|u| u.elements().contains(element))
}

fn is_connected(
    input: &Structure,
    target: &Structure,
    s: &Structure,
    params: &ConnectedParams,
) -> bool {
    let accepts = |bond: &BondLocation| params.bond_test.as_ref().is_none_or(|t| t(bond));
    let inter = input.inter_unit_bonds();

    for unit in s.units().iter().filter(|u| u.is_atomic()) {
        let Some(input_unit) = input.unit(unit.id()) else {
            continue;
        };
        let graph = input_unit.bonds();
        let input_elements = input_unit.elements();
        for e in unit.elements().iter() {
            let Some(a_index) = input_elements.index_of(e) else {
                continue;
            };
            let a = Location::new(input_unit.clone(), e);

            for edge in graph.edge_range(a_index) {
                let b_index = graph.target(edge);
                let b_element = input_elements[b_index];
                if params.disjunct && unit.elements().contains(b_element) {
                    continue;
                }
                if !has_element(target, unit.id(), b_element) {
                    continue;
                }
                let bond = BondLocation {
                    a: a.clone(),
                    a_index,
                    b: Location::new(input_unit.clone(), b_element),
                    b_index,
                    props: graph.props(edge),
                };
                if accepts(&bond) {
                    return true;
                }
            }

            for edge in inter.edges_of(UnitElementKey::new(unit.id(), a_index)) {
                let Some(b_unit) = input.unit(edge.b.unit) else {
                    continue;
                };
                let Some(b_element) = b_unit.elements().get(edge.b.index) else {
                    continue;
                };
                if !has_element(target, edge.b.unit, b_element) {
                    continue;
                }
                if params.disjunct && has_element(s, edge.b.unit, b_element) {
                    continue;
                }
                let bond = BondLocation {
                    a: a.clone(),
                    a_index,
                    b: Location::new(b_unit.clone(), b_element),
                    b_index: edge.b.index,
                    props: edge.props,
                };
                if accepts(&bond) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::topology::BondFlags;
    use crate::query::context::{atom_name_in, bond_test, label_asym_id_in, run};
    use crate::query::generators::{AtomsQuery, all, atoms, residues};
    use crate::test_support;

    fn chain(id: &str) -> Query {
        atoms(AtomsQuery::new().chain_test(label_asym_id_in(&[id])))
    }

    fn names(selection: &Selection) -> Vec<String> {
        selection
            .structures()
            .iter()
            .map(|s| {
                let unit = &s.units()[0];
                let l = Location::at(unit, 0).unwrap();
                format!("{}:{}", l.label_asym_id(), l.atom_name())
            })
            .collect()
    }

    #[test]
    fn within_returns_query_atoms_near_the_target() {
        let s = Arc::new(test_support::two_chain_structure(3.0));
        let near = run(&within(WithinParams::new(chain("A"), chain("B"), 4.0)), &s);
        assert_eq!(names(&near), vec!["A:C"]);

        let linear = run(
            &within(WithinParams::new(chain("A"), chain("B"), 4.0).min_radius(0.0)),
            &s,
        );
        assert_eq!(names(&linear), vec!["A:C"]);

        let far = Arc::new(test_support::two_chain_structure(10.0));
        assert!(run(&within(WithinParams::new(chain("A"), chain("B"), 4.0)), &far).is_empty());
    }

    #[test]
    fn within_min_max_uses_the_closest_pair() {
        let s = Arc::new(test_support::two_chain_structure(3.0));
        let banded = run(
            &within(WithinParams::new(chain("A"), chain("B"), 5.0).min_radius(3.5)),
            &s,
        );
        assert_eq!(names(&banded), vec!["A:CA"]);
        let inverted = run(
            &within(WithinParams::new(chain("A"), chain("B"), 4.0).invert(true)),
            &s,
        );
        assert_eq!(names(&inverted), vec!["A:N", "A:CA"]);
    }

    #[test]
    fn element_radius_shrinks_distances() {
        let s = Arc::new(test_support::two_chain_structure(3.0));
        let radius: ElementRadius = Arc::new(|_: &Location| 0.5);
        let q = within(
            WithinParams::new(chain("A"), chain("B"), 4.0)
                .min_radius(0.0)
                .element_radius(radius),
        );
        assert_eq!(names(&run(&q, &s)), vec!["A:CA", "A:C"]);
    }

    #[test]
    fn pick_first_and_intersected_by() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let big = pick(residues(AtomsQuery::new()), Arc::new(|s: &Structure| s.element_count() > 2));
        assert_eq!(run(&big, &s).structure_count(), 2);

        let head = run(&first(all()), &s);
        assert_eq!(names(&head), vec!["A:N"]);
        let head = run(&first(residues(AtomsQuery::new())), &s);
        assert_eq!(head.union_structure().element_count(), 3);

        let ca = atoms(AtomsQuery::new().atom_test(atom_name_in(&["CA"])));
        let touched = run(&are_intersected_by(residues(AtomsQuery::new()), chain("B")), &s);
        assert_eq!(touched.structure_count(), 1);
        assert_eq!(run(&are_intersected_by(residues(AtomsQuery::new()), ca), &s).structure_count(), 2);
    }

    #[test]
    fn connection_respects_disjunct_and_invert() {
        let s = Arc::new(test_support::two_chain_structure(1.5));
        let disjunct = ConnectedParams::new(residues(AtomsQuery::new()), chain("B")).disjunct(true);
        let found = run(&is_connected_to(disjunct.clone()), &s);
        assert_eq!(found.structure_count(), 1);
        assert_eq!(found.union_structure().units()[0].id(), s.units()[0].id());

        let inverted = run(&is_connected_to(disjunct.invert(true)), &s);
        assert_eq!(inverted.structure_count(), 1);
        assert_eq!(inverted.union_structure().units()[0].id(), s.units()[1].id());

        let loose = ConnectedParams::new(residues(AtomsQuery::new()), chain("B"));
        assert_eq!(run(&is_connected_to(loose), &s).structure_count(), 2);
    }

    #[test]
    fn bond_test_filters_connections() {
        let s = Arc::new(test_support::two_chain_structure(1.5));
        let computed = ConnectedParams::new(chain("A"), chain("B"))
            .disjunct(true)
            .bond_test(bond_test(|b| b.props.flags.contains(BondFlags::COMPUTED)));
        assert_eq!(names(&run(&is_connected_to(computed), &s)), vec!["A:C"]);
        let disulfide = ConnectedParams::new(chain("A"), chain("B"))
            .bond_test(bond_test(|b| b.props.flags.contains(BondFlags::DISULFIDE)));
        assert!(run(&is_connected_to(disulfide), &s).is_empty());
    }
}
