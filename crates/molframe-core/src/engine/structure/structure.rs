use super::builder::StructureBuilder;
use super::groups::{SymmetryGroups, TransformGroup, transform_groups};
use super::unit::{Unit, UnitKind};
use crate::core::collections::sorted::{SortedSet, hash_combine};
use crate::core::math::boundary::{Boundary, Box3, Sphere3};
use crate::core::model::{Model, ModelError};
use crate::core::symmetry::operator::{DEFAULT_OPERATOR_NAME, SymmetryOperator};
use crate::engine::bonds::inter::{InterUnitBonds, compute_inter_unit_bonds};
use crate::engine::cache::ModelCaches;
use crate::engine::config::ModelConfig;
use crate::engine::lookup::structure::StructureLookup3D;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Debug, Default)]
struct StructureProps {
    hash: OnceLock<u64>,
    boundary: OnceLock<Boundary>,
    lookup: OnceLock<StructureLookup3D>,
    inter_unit_bonds: OnceLock<Arc<InterUnitBonds>>,
    symmetry_groups: OnceLock<SymmetryGroups>,
    models: OnceLock<Vec<Arc<Model>>>,
}

/// An immutable collection of units ordered by id.
#[derive(Debug)]
pub struct Structure {
    units: Vec<Arc<Unit>>,
    unit_index: HashMap<u32, usize>,
    element_count: usize,
    props: StructureProps,
}

impl Default for Structure {
    fn default() -> Self {
        Self::empty()
    }
}

impl Structure {
    /// Builds a structure from units with distinct ids.
    pub fn new(mut units: Vec<Arc<Unit>>) -> Self {
        units.sort_by_key(|u| u.id());
        debug_assert!(units.windows(2).all(|w| w[0].id() != w[1].id()));
        let unit_index = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id(), i))
            .collect();
        let element_count = units.iter().map(|u| u.len()).sum();
        Self {
            units,
            unit_index,
            element_count,
            props: StructureProps::default(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// One atomic unit per chain and one coarse unit per coarse chain, all untransformed.
    pub fn from_model(model: Arc<Model>, config: ModelConfig) -> Self {
        let caches = ModelCaches::new(config);
        let identity = Arc::new(SymmetryOperator::identity(DEFAULT_OPERATOR_NAME));
        let mut builder = StructureBuilder::new();

        let chains = &model.atomic.chain_segments;
        for chain in 0..chains.count() {
            let range = chains.range(chain);
            if range.is_empty() {
                continue;
            }
            builder.add_unit(
                UnitKind::Atomic,
                model.clone(),
                identity.clone(),
                SortedSet::from_range(range.start, range.end),
                caches.clone(),
                None,
            );
        }
        for (kind, coarse) in [
            (UnitKind::Spheres, &model.spheres),
            (UnitKind::Gaussians, &model.gaussians),
        ] {
            let Some(coarse) = coarse else { continue };
            for chain in 0..coarse.chain_segments.count() {
                let range = coarse.chain_segments.range(chain);
                if range.is_empty() {
                    continue;
                }
                builder.add_unit(
                    kind,
                    model.clone(),
                    identity.clone(),
                    SortedSet::from_range(range.start, range.end),
                    caches.clone(),
                    None,
                );
            }
        }
        let structure = builder.build();
        debug!(
            units = structure.unit_count(),
            elements = structure.element_count(),
            "Built structure from model '{}'.",
            model.label
        );
        structure
    }

    pub fn units(&self) -> &[Arc<Unit>] {
        &self.units
    }

    pub fn unit(&self, id: u32) -> Option<&Arc<Unit>> {
        self.unit_index.get(&id).map(|&i| &self.units[i])
    }

    /// Position of unit `id` in [`Self::units`].
    pub fn unit_position(&self, id: u32) -> Option<usize> {
        self.unit_index.get(&id).copied()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    /// Distinct models referenced by the units, in unit order.
    pub fn models(&self) -> &[Arc<Model>] {
        self.props.models.get_or_init(|| {
            let mut models: Vec<Arc<Model>> = Vec::new();
            for unit in &self.units {
                if !models.iter().any(|m| m.id() == unit.model().id()) {
                    models.push(unit.model().clone());
                }
            }
            models
        })
    }

    pub fn model(&self) -> Option<&Arc<Model>> {
        self.models().first()
    }

    /// Shared configuration and caches of the first unit's model.
    pub fn caches(&self) -> Option<&Arc<ModelCaches>> {
        self.units.first().map(|u| u.caches())
    }

    pub fn is_coarse_grained(&self) -> bool {
        self.units
            .iter()
            .all(|u| !u.is_atomic() || u.model().is_coarse_grained())
    }

    /// Content hash over unit ids and element sets.
    pub fn hash_code(&self) -> u64 {
        *self.props.hash.get_or_init(|| {
            let mut hash = hash_combine(17, self.units.len() as u64);
            for unit in &self.units {
                hash = hash_combine(hash, unit.id() as u64);
                hash = hash_combine(hash, unit.elements().hash_code());
            }
            hash
        })
    }

    pub fn boundary(&self) -> &Boundary {
        self.props.boundary.get_or_init(|| {
            let mut iter = self.units.iter().filter(|u| !u.is_empty());
            let Some(first) = iter.next() else {
                return Boundary::empty();
            };
            let mut bbox = first.boundary().bbox;
            let mut sphere: Sphere3 = first.boundary().sphere;
            for unit in iter {
                let b = unit.boundary();
                bbox = union_box(&bbox, &b.bbox);
                sphere = sphere.expand(&b.sphere);
            }
            Boundary { bbox, sphere }
        })
    }

    pub fn lookup3d(&self) -> &StructureLookup3D {
        self.props
            .lookup
            .get_or_init(|| StructureLookup3D::new(self))
    }

    pub fn inter_unit_bonds(&self) -> &Arc<InterUnitBonds> {
        self.props
            .inter_unit_bonds
            .get_or_init(|| Arc::new(compute_inter_unit_bonds(self)))
    }

    pub fn symmetry_groups(&self) -> &SymmetryGroups {
        self.props
            .symmetry_groups
            .get_or_init(|| SymmetryGroups::new(&self.units))
    }

    pub fn transform_groups(&self) -> Vec<TransformGroup> {
        transform_groups(&self.units)
    }

    /// Rebuilds every unit over `model`, which must share the current model's topology.
    pub fn remap_model(&self, model: Arc<Model>) -> Result<Self, ModelError> {
        if let Some(current) = self.model() {
            if current.atom_count() != model.atom_count() {
                return Err(ModelError::ConformationMismatch {
                    expected: current.atom_count(),
                    found: model.atom_count(),
                });
            }
            if !current.shares_topology(&model) {
                return Err(ModelError::TopologyMismatch {
                    expected: current.id(),
                    found: model.id(),
                });
            }
        }
        let units = self
            .units
            .iter()
            .map(|u| Arc::new(u.remap_model(model.clone())))
            .collect();
        Ok(Self::new(units))
    }
}

fn union_box(a: &Box3, b: &Box3) -> Box3 {
    let mut out = *a;
    out.include(&b.min);
    out.include(&b.max);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::symmetry::operator::Provenance;
    use crate::test_support;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn from_model_creates_one_unit_per_chain() {
        let structure = test_support::two_chain_structure(10.0);
        assert_eq!(structure.unit_count(), 2);
        assert_eq!(structure.element_count(), 6);
        let ids: Vec<u32> = structure.units().iter().map(|u| u.id()).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_ne!(
            structure.units()[0].invariant_id(),
            structure.units()[1].invariant_id()
        );
    }

    #[test]
    fn unit_boundary_contains_all_positions() {
        let structure = test_support::two_chain_structure(10.0);
        let unit = &structure.units()[1];
        let op = Arc::new(SymmetryOperator::of_rotation_and_offset(
            "moved",
            &nalgebra::Matrix3::identity(),
            &Vector3::new(5.0, -3.0, 2.0),
            Provenance::default(),
        ));
        let moved = unit.apply_operator(9, op, false);
        for copy in [unit.as_ref(), &moved] {
            let sphere = copy.boundary().sphere;
            for e in copy.elements().iter() {
                assert!(sphere.contains(&copy.position(e), 1e-6));
            }
        }
    }

    #[test]
    fn lookup_queries_run_in_unit_frame() {
        let structure = test_support::two_chain_structure(10.0);
        let unit = &structure.units()[0];
        let op = Arc::new(SymmetryOperator::of_rotation_and_offset(
            "shifted",
            &nalgebra::Matrix3::identity(),
            &Vector3::new(100.0, 0.0, 0.0),
            Provenance::default(),
        ));
        let copy = unit.apply_operator(5, op, false);
        let first = copy.position(copy.elements()[0]);
        assert!(copy.check(&first, 0.1));
        assert!(!copy.check(&Point3::origin(), 0.1));
        assert!(unit.check(&unit.position(unit.elements()[0]), 0.1));
    }

    #[test]
    fn child_with_all_elements_is_the_same_unit() {
        let structure = test_support::two_chain_structure(10.0);
        let unit = &structure.units()[0];
        let same = unit.child(unit.elements().clone());
        assert!(Arc::ptr_eq(unit, &same));
        let smaller = unit.child(SortedSet::from_sorted(vec![unit.elements()[0]]));
        assert_eq!(smaller.len(), 1);
        assert_eq!(smaller.id(), unit.id());
    }

    #[test]
    fn remap_with_new_coordinates_invalidates_lookup() {
        let structure = test_support::two_chain_structure(10.0);
        let model = structure.model().unwrap().clone();
        let shifted: Vec<Point3<f64>> = model
            .conformation
            .positions
            .iter()
            .map(|p| p + Vector3::new(50.0, 0.0, 0.0))
            .collect();
        let remapped = structure
            .remap_model(Arc::new(model.with_positions(shifted).unwrap()))
            .unwrap();
        let unit = &remapped.units()[0];
        let original = &structure.units()[0];
        let p = original.position(original.elements()[0]);
        assert!(original.check(&p, 0.1));
        assert!(!unit.check(&p, 0.1));
        assert!(unit.check(&(p + Vector3::new(50.0, 0.0, 0.0)), 0.1));
    }

    #[test]
    fn remap_rejects_other_topologies() {
        let structure = test_support::two_chain_structure(10.0);
        let other = test_support::benzene_model(false);
        assert_eq!(other.atom_count(), structure.model().unwrap().atom_count());
        assert!(matches!(
            structure.remap_model(other),
            Err(ModelError::TopologyMismatch { .. })
        ));

        let smaller = test_support::model(&crate::core::io::CategoryData::new().with(
            test_support::atom_site(&[("C", "C1", "LIG", "A", 1, [0.0, 0.0, 0.0])]),
        ));
        assert!(matches!(
            structure.remap_model(smaller),
            Err(ModelError::ConformationMismatch { .. })
        ));
    }

    #[test]
    fn remap_accepts_a_rebuilt_model_with_the_same_atoms() {
        let structure = test_support::two_chain_structure(10.0);
        let rebuilt = test_support::two_chain_structure(10.0).model().unwrap().clone();
        assert!(structure.remap_model(rebuilt).is_ok());
    }

    #[test]
    fn hash_depends_on_content() {
        let a = test_support::two_chain_structure(10.0);
        let b = Structure::new(vec![a.units()[0].clone()]);
        assert_ne!(a.hash_code(), b.hash_code());
        let c = Structure::new(a.units().to_vec());
        assert_eq!(a.hash_code(), c.hash_code());
    }
}
