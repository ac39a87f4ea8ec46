//! References to sets of elements within a structure.

use crate::core::collections::sorted::SortedSet;
use crate::core::math::NumericError;
use crate::core::math::boundary::Boundary;
use crate::core::math::eigen::PrincipalAxes;
use crate::engine::structure::{Location, Structure, Unit, UnitKind};
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Positions into `unit.elements()`.
#[derive(Debug, Clone)]
pub struct LociElement {
    pub unit: Arc<Unit>,
    pub indices: SortedSet,
}

impl LociElement {
    pub fn new(unit: Arc<Unit>, indices: SortedSet) -> Self {
        Self { unit, indices }
    }

    fn is_whole_unit(&self) -> bool {
        self.indices.len() == self.unit.len()
    }

    fn model_elements(&self) -> impl Iterator<Item = usize> + '_ {
        let elements = self.unit.elements();
        self.indices.iter().map(move |i| elements[i])
    }
}

#[derive(Debug, Clone)]
pub struct Loci {
    structure: Arc<Structure>,
    elements: Vec<LociElement>,
}

impl Loci {
    pub fn new(structure: Arc<Structure>, elements: Vec<LociElement>) -> Self {
        Self {
            structure,
            elements,
        }
    }

    pub fn all(structure: &Arc<Structure>) -> Self {
        let elements = structure
            .units()
            .iter()
            .map(|u| LociElement::new(u.clone(), SortedSet::from_range(0, u.len())))
            .collect();
        Self::new(structure.clone(), elements)
    }

    pub fn none(structure: &Arc<Structure>) -> Self {
        Self::new(structure.clone(), Vec::new())
    }

    pub fn structure(&self) -> &Arc<Structure> {
        &self.structure
    }

    pub fn elements(&self) -> &[LociElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(|e| e.indices.is_empty())
    }

    pub fn size(&self) -> usize {
        self.elements.iter().map(|e| e.indices.len()).sum()
    }

    pub fn is_whole_structure(&self) -> bool {
        self.size() == self.structure.element_count()
    }

    /// Same structure, same units in the same order, same indices.
    pub fn are_equal(a: &Loci, b: &Loci) -> bool {
        if !Arc::ptr_eq(&a.structure, &b.structure) || a.elements.len() != b.elements.len() {
            return false;
        }
        a.elements
            .iter()
            .zip(&b.elements)
            .all(|(x, y)| x.unit.id() == y.unit.id() && x.indices.are_equal(&y.indices))
    }

    pub fn first_location(&self) -> Option<Location> {
        let first = self.elements.iter().find(|e| !e.indices.is_empty())?;
        Location::at(&first.unit, first.indices.first()?)
    }

    pub fn first_element(&self) -> Loci {
        let Some(first) = self.elements.iter().find(|e| !e.indices.is_empty()) else {
            return self.clone();
        };
        let mut single = first.clone();
        single.indices = SortedSet::from_sorted(first.indices.first().into_iter().collect());
        Self::new(self.structure.clone(), vec![single])
    }

    pub fn for_each_location(&self, mut f: impl FnMut(&Location)) {
        for e in &self.elements {
            let mut location = Location::new(e.unit.clone(), 0);
            for element in e.model_elements() {
                location.element = element;
                f(&location);
            }
        }
    }

    /// Positions of every element in their unit's frame.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        let mut out = Vec::with_capacity(self.size());
        for e in &self.elements {
            out.extend(e.model_elements().map(|el| e.unit.position(el)));
        }
        out
    }

    pub fn union(xs: &Loci, ys: &Loci) -> Loci {
        if xs.elements.len() > ys.elements.len() {
            return Self::union(ys, xs);
        }
        if xs.is_empty() {
            return ys.clone();
        }
        let mut pending: HashMap<u32, &LociElement> =
            xs.elements.iter().map(|e| (e.unit.id(), e)).collect();
        let mut elements = Vec::with_capacity(xs.elements.len() + ys.elements.len());
        for e in &ys.elements {
            match pending.remove(&e.unit.id()) {
                Some(x) => elements.push(LociElement::new(e.unit.clone(), x.indices.union(&e.indices))),
                None => elements.push(e.clone()),
            }
        }
        elements.extend(
            xs.elements
                .iter()
                .filter(|e| pending.contains_key(&e.unit.id()))
                .cloned(),
        );
        elements.sort_by_key(|e| e.unit.id());
        Self::new(ys.structure.clone(), elements)
    }

    /// Elements of `xs` not in `ys`.
    pub fn subtract(xs: &Loci, ys: &Loci) -> Loci {
        let others: HashMap<u32, &SortedSet> =
            ys.elements.iter().map(|e| (e.unit.id(), &e.indices)).collect();
        let elements = xs
            .elements
            .iter()
            .filter_map(|e| match others.get(&e.unit.id()) {
                None => Some(e.clone()),
                Some(other) => {
                    let indices = e.indices.subtract(other);
                    (!indices.is_empty()).then(|| LociElement::new(e.unit.clone(), indices))
                }
            })
            .collect();
        Self::new(xs.structure.clone(), elements)
    }

    pub fn intersect(xs: &Loci, ys: &Loci) -> Loci {
        let others: HashMap<u32, &SortedSet> =
            xs.elements.iter().map(|e| (e.unit.id(), &e.indices)).collect();
        let elements = ys
            .elements
            .iter()
            .filter_map(|e| {
                let other = others.get(&e.unit.id())?;
                let indices = other.intersect(&e.indices);
                (!indices.is_empty()).then(|| LociElement::new(e.unit.clone(), indices))
            })
            .collect();
        Self::new(xs.structure.clone(), elements)
    }

    pub fn are_intersecting(xs: &Loci, ys: &Loci) -> bool {
        let others: HashMap<u32, &SortedSet> =
            xs.elements.iter().map(|e| (e.unit.id(), &e.indices)).collect();
        ys.elements.iter().any(|e| {
            others
                .get(&e.unit.id())
                .is_some_and(|other| other.are_intersecting(&e.indices))
        })
    }

    /// Whether every element of `ys` is in `xs`.
    pub fn is_subset(xs: &Loci, ys: &Loci) -> bool {
        let others: HashMap<u32, &SortedSet> =
            xs.elements.iter().map(|e| (e.unit.id(), &e.indices)).collect();
        ys.elements.iter().all(|e| {
            e.indices.is_empty()
                || others
                    .get(&e.unit.id())
                    .is_some_and(|other| e.indices.is_subset_of(other))
        })
    }

    pub fn to_structure(&self) -> Structure {
        let units = self
            .elements
            .iter()
            .filter(|e| !e.indices.is_empty())
            .map(|e| e.unit.child(SortedSet::from_sorted(e.model_elements().collect())))
            .collect();
        Structure::new(units)
    }

    /// The same elements expressed against `structure`'s units. Elements missing from
    /// `structure` are dropped.
    pub fn remap(&self, structure: &Arc<Structure>) -> Loci {
        if Arc::ptr_eq(structure, &self.structure) {
            return self.clone();
        }
        let mut elements = Vec::new();
        for e in &self.elements {
            let Some(unit) = structure.unit(e.unit.id()) else {
                continue;
            };
            let indices: Vec<usize> = e
                .model_elements()
                .filter_map(|el| unit.elements().index_of(el))
                .collect();
            if !indices.is_empty() {
                elements.push(LociElement::new(unit.clone(), SortedSet::from_sorted(indices)));
            }
        }
        Self::new(structure.clone(), elements)
    }

    /// Grows every partially selected residue to all of its atoms in the unit. With
    /// `restrict_to_conformation`, atoms of other alternate locations than the selected ones
    /// are left out unless the selection touches a shared atom of that residue.
    pub fn extend_to_whole_residues(&self, restrict_to_conformation: bool) -> Loci {
        let mut elements = Vec::with_capacity(self.elements.len());
        for e in &self.elements {
            if e.is_whole_unit() || e.unit.kind() != UnitKind::Atomic {
                elements.push(e.clone());
                continue;
            }
            let unit_elements = e.unit.elements();
            let atomic = &e.unit.model().atomic;
            let selected: Vec<usize> = e.model_elements().collect();
            let mut indices = Vec::new();
            let mut i = 0;
            while i < selected.len() {
                let residue = atomic.residue_index(selected[i]);
                let mut alt_ids: HashSet<&str> = HashSet::new();
                while i < selected.len() && atomic.residue_index(selected[i]) == residue {
                    alt_ids.insert(atomic.alt_id(selected[i]));
                    i += 1;
                }
                let shared = alt_ids.contains("");
                for atom in atomic.residue_segments.range(residue) {
                    let Some(idx) = unit_elements.index_of(atom) else {
                        continue;
                    };
                    let alt_id = atomic.alt_id(atom);
                    if !restrict_to_conformation
                        || shared
                        || alt_id.is_empty()
                        || alt_ids.contains(alt_id)
                    {
                        indices.push(idx);
                    }
                }
            }
            elements.push(LociElement::new(e.unit.clone(), SortedSet::from_sorted(indices)));
        }
        Self::new(self.structure.clone(), elements)
    }

    /// Grows every partially selected unit to all of its elements in the touched chains.
    pub fn extend_to_whole_chains(&self) -> Loci {
        let mut elements = Vec::with_capacity(self.elements.len());
        for e in &self.elements {
            if e.is_whole_unit() {
                elements.push(e.clone());
                continue;
            }
            let chains: HashSet<usize> = e.model_elements().map(|el| e.unit.chain_index(el)).collect();
            let indices: Vec<usize> = e
                .unit
                .elements()
                .iter()
                .enumerate()
                .filter(|&(_, el)| chains.contains(&e.unit.chain_index(el)))
                .map(|(i, _)| i)
                .collect();
            if !indices.is_empty() {
                elements.push(LociElement::new(e.unit.clone(), SortedSet::from_sorted(indices)));
            }
        }
        Self::new(self.structure.clone(), elements)
    }

    /// Every unit of the structure whose model and entity are touched by the loci, taken whole.
    pub fn extend_to_whole_entities(&self) -> Loci {
        let entity_key = |unit: &Arc<Unit>| {
            Location::at(unit, 0).map(|l| (unit.model().id(), l.entity_id().to_string()))
        };
        let touched: HashSet<(u64, String)> = self
            .elements
            .iter()
            .filter_map(|e| entity_key(&e.unit))
            .collect();
        let elements = self
            .structure
            .units()
            .iter()
            .filter(|u| entity_key(u).is_some_and(|k| touched.contains(&k)))
            .map(|u| LociElement::new(u.clone(), SortedSet::from_range(0, u.len())))
            .collect();
        Self::new(self.structure.clone(), elements)
    }

    /// Element radii are included, so the boundary of coarse spheres covers their extent.
    pub fn boundary(&self) -> Boundary {
        let mut positions = Vec::with_capacity(self.size());
        let mut radius = Vec::with_capacity(self.size());
        for e in &self.elements {
            for el in e.model_elements() {
                positions.push(e.unit.position(el));
                radius.push(e.unit.element_radius(el));
            }
        }
        let indices: Vec<usize> = (0..positions.len()).collect();
        let threshold = self
            .structure
            .caches()
            .map_or(usize::MAX, |c| c.config.boundary.fast_threshold);
        Boundary::from_indexed_with_radius(&positions, &radius, &indices, threshold)
    }

    pub fn principal_axes(&self) -> Result<PrincipalAxes, NumericError> {
        PrincipalAxes::from_points(&self.positions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::CategoryData;
    use crate::engine::structure::StructureSubsetBuilder;
    use crate::test_support::{self, atom_site, table};

    fn pick(structure: &Arc<Structure>, picks: &[(usize, &[usize])]) -> Loci {
        let elements = picks
            .iter()
            .map(|&(u, idx)| {
                LociElement::new(structure.units()[u].clone(), SortedSet::from_unsorted(idx.to_vec()))
            })
            .collect();
        Loci::new(structure.clone(), elements)
    }

    #[test]
    fn union_of_difference_and_intersection_restores_loci() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let a = pick(&s, &[(0, &[0, 1]), (1, &[2])]);
        let b = pick(&s, &[(0, &[1, 2]), (1, &[0])]);
        let restored = Loci::union(&Loci::subtract(&a, &b), &Loci::intersect(&a, &b));
        assert!(Loci::are_equal(&restored, &a));
        assert!(Loci::are_intersecting(&a, &b));
        assert!(!Loci::are_intersecting(&Loci::subtract(&a, &b), &b));
        assert_eq!(Loci::union(&a, &b).size(), 5);
    }

    #[test]
    fn subset_checks_every_unit() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let all = Loci::all(&s);
        let some = pick(&s, &[(1, &[0, 2])]);
        assert!(Loci::is_subset(&all, &some));
        assert!(!Loci::is_subset(&some, &all));
        assert!(Loci::is_subset(&some, &Loci::none(&s)));
        assert!(all.is_whole_structure());
    }

    #[test]
    fn to_structure_and_remap() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let loci = pick(&s, &[(0, &[2]), (1, &[0, 1])]);
        let sub = loci.to_structure();
        assert_eq!(sub.element_count(), 3);

        let mut builder = StructureSubsetBuilder::unique(&s);
        let unit = &s.units()[1];
        builder.add_to_unit(unit.id(), unit.elements()[1]);
        builder.add_to_unit(unit.id(), unit.elements()[2]);
        let target = Arc::new(builder.build());
        let remapped = loci.remap(&target);
        assert_eq!(remapped.size(), 1);
        assert_eq!(remapped.elements()[0].indices.as_slice(), &[0]);
    }

    #[test]
    fn extends_to_whole_residues_and_chains() {
        let data = CategoryData::new().with(atom_site(&[
            ("N", "N", "GLY", "A", 1, [0.0, 0.0, 0.0]),
            ("C", "CA", "GLY", "A", 1, [1.5, 0.0, 0.0]),
            ("N", "N", "GLY", "A", 2, [3.0, 0.0, 0.0]),
            ("C", "CA", "GLY", "A", 2, [4.5, 0.0, 0.0]),
        ]));
        let s = Arc::new(test_support::structure(&data));
        let loci = pick(&s, &[(0, &[3])]);
        let residues = loci.extend_to_whole_residues(false);
        assert_eq!(residues.elements()[0].indices.as_slice(), &[2, 3]);
        let chains = loci.extend_to_whole_chains();
        assert_eq!(chains.size(), 4);
    }

    #[test]
    fn conformation_restricted_residue_extension_skips_other_alt_locs() {
        let data = CategoryData::new().with(table(
            "atom_site",
            &[
                "id", "type_symbol", "label_atom_id", "label_alt_id", "label_comp_id",
                "label_asym_id", "label_seq_id", "Cartn_x", "Cartn_y", "Cartn_z",
            ],
            &[
                vec!["1", "C", "CA", "", "SER", "A", "1", "0", "0", "0"],
                vec!["2", "C", "CB", "A", "SER", "A", "1", "1.5", "0", "0"],
                vec!["3", "C", "CB", "B", "SER", "A", "1", "1.5", "0.3", "0"],
                vec!["4", "N", "N", "", "GLY", "A", "2", "5", "0", "0"],
            ],
        ));
        let s = Arc::new(test_support::structure(&data));
        let loci = pick(&s, &[(0, &[1])]);
        let restricted = loci.extend_to_whole_residues(true);
        assert_eq!(restricted.elements()[0].indices.as_slice(), &[0, 1]);
        let all = loci.extend_to_whole_residues(false);
        assert_eq!(all.elements()[0].indices.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn boundary_and_axes_follow_selected_positions() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let loci = pick(&s, &[(0, &[0, 2])]);
        let boundary = loci.boundary();
        assert!((boundary.sphere.center.x - 1.5).abs() < 1e-6);
        assert!((boundary.sphere.radius - 1.5).abs() < 1e-6);
        let axes = loci.principal_axes().unwrap();
        assert!(axes.moments_axes.dir_a.x.abs() > 0.9);
        assert!(Loci::none(&s).principal_axes().is_err());
    }

    #[test]
    fn first_location_and_element() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let loci = pick(&s, &[(1, &[1, 2])]);
        let l = loci.first_location().unwrap();
        assert_eq!(l.atom_name(), "CA");
        assert_eq!(l.label_asym_id(), "B");
        assert_eq!(loci.first_element().size(), 1);
        assert!(Loci::none(&s).first_location().is_none());
    }
}
