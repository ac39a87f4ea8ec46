use crate::core::collections::sorted::SortedSet;
use crate::core::math::boundary::Boundary;
use crate::core::model::Model;
use crate::core::model::coarse::CoarseElements;
use crate::core::symmetry::operator::SymmetryOperator;
use crate::engine::bonds::graph::BondGraph;
use crate::engine::bonds::intra::compute_intra_unit_bonds;
use crate::engine::cache::{BondCacheKey, ModelCaches};
use crate::engine::lookup::grid::{GridLookup3D, LookupResult};
use crate::engine::rings::UnitRings;
use nalgebra::Point3;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

static NEXT_INVARIANT_ID: AtomicU32 = AtomicU32::new(0);

/// Allocates an invariant id for a new underlying atom set.
pub fn next_invariant_id() -> u32 {
    NEXT_INVARIANT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Atomic,
    Spheres,
    Gaussians,
}

/// Derived data that depends only on the elements and the model coordinates, shared by every
/// symmetry copy of a unit.
#[derive(Debug, Default)]
struct SharedProps {
    local_boundary: OnceLock<Boundary>,
    lookup: OnceLock<GridLookup3D>,
}

/// An immutable set of elements of one model, placed by a symmetry operator.
///
/// Element sets are strictly increasing model indices. Vertex `i` of the bond graph, ring atom
/// `i` and lookup hit `i` all refer to `elements[i]`.
#[derive(Debug)]
pub struct Unit {
    id: u32,
    invariant_id: u32,
    kind: UnitKind,
    model: Arc<Model>,
    operator: Arc<SymmetryOperator>,
    elements: SortedSet,
    caches: Arc<ModelCaches>,
    shared: Arc<SharedProps>,
    boundary: OnceLock<Boundary>,
    bonds: OnceLock<Arc<BondGraph>>,
    rings: OnceLock<Arc<UnitRings>>,
}

impl Unit {
    pub(crate) fn new(
        id: u32,
        invariant_id: u32,
        kind: UnitKind,
        model: Arc<Model>,
        operator: Arc<SymmetryOperator>,
        elements: SortedSet,
        caches: Arc<ModelCaches>,
    ) -> Self {
        Self::with_shared(
            id,
            invariant_id,
            kind,
            model,
            operator,
            elements,
            caches,
            Arc::default(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn with_shared(
        id: u32,
        invariant_id: u32,
        kind: UnitKind,
        model: Arc<Model>,
        operator: Arc<SymmetryOperator>,
        elements: SortedSet,
        caches: Arc<ModelCaches>,
        shared: Arc<SharedProps>,
    ) -> Self {
        Self {
            id,
            invariant_id,
            kind,
            model,
            operator,
            elements,
            caches,
            shared,
            boundary: OnceLock::new(),
            bonds: OnceLock::new(),
            rings: OnceLock::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn invariant_id(&self) -> u32 {
        self.invariant_id
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_atomic(&self) -> bool {
        self.kind == UnitKind::Atomic
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn operator(&self) -> &Arc<SymmetryOperator> {
        &self.operator
    }

    pub fn elements(&self) -> &SortedSet {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn caches(&self) -> &Arc<ModelCaches> {
        &self.caches
    }

    /// Two units are symmetry equivalent when they are copies of the same element set.
    pub fn is_symmetry_equivalent(&self, other: &Unit) -> bool {
        self.invariant_id == other.invariant_id && self.elements.are_equal(&other.elements)
    }

    fn coarse(&self) -> Option<&CoarseElements> {
        match self.kind {
            UnitKind::Atomic => None,
            UnitKind::Spheres => self.model.spheres.as_ref(),
            UnitKind::Gaussians => self.model.gaussians.as_ref(),
        }
    }

    /// Model-frame coordinates of every element of the unit's kind.
    pub fn model_positions(&self) -> &[Point3<f64>] {
        match self.kind {
            UnitKind::Atomic => &self.model.conformation.positions,
            UnitKind::Spheres | UnitKind::Gaussians => self
                .coarse()
                .map(|c| c.conformation.positions.as_slice())
                .unwrap_or(&[]),
        }
    }

    pub fn conformation_id(&self) -> u64 {
        conformation_id(&self.model, self.kind)
    }

    /// Position of model element `element` before the operator is applied.
    #[inline]
    pub fn model_position(&self, element: usize) -> Point3<f64> {
        self.model_positions()[element]
    }

    /// Position of model element `element` in this unit's frame.
    #[inline]
    pub fn position(&self, element: usize) -> Point3<f64> {
        self.operator.apply(&self.model_position(element))
    }

    /// Element radius; zero for atoms.
    pub fn element_radius(&self, element: usize) -> f64 {
        self.coarse().map(|c| c.radius[element]).unwrap_or(0.0)
    }

    /// Element symbol; empty for coarse elements.
    pub fn element_symbol(&self, element: usize) -> &str {
        match self.kind {
            UnitKind::Atomic => self.model.atomic.element(element),
            UnitKind::Spheres | UnitKind::Gaussians => "",
        }
    }

    pub fn residue_index(&self, element: usize) -> Option<usize> {
        match self.kind {
            UnitKind::Atomic => Some(self.model.atomic.residue_index(element)),
            UnitKind::Spheres | UnitKind::Gaussians => None,
        }
    }

    pub fn chain_index(&self, element: usize) -> usize {
        match self.coarse() {
            Some(coarse) => coarse.chain_index(element),
            None => self.model.atomic.chain_index(element),
        }
    }

    /// Boundary in the model frame, shared with symmetry copies.
    pub fn local_boundary(&self) -> &Boundary {
        self.shared.local_boundary.get_or_init(|| {
            let threshold = self.caches.config.boundary.fast_threshold;
            let positions = self.model_positions();
            match self.coarse() {
                Some(coarse) => Boundary::from_indexed_with_radius(
                    positions,
                    &coarse.radius,
                    self.elements.as_slice(),
                    threshold,
                ),
                None => Boundary::from_indexed(positions, self.elements.as_slice(), threshold),
            }
        })
    }

    /// Boundary in this unit's frame.
    pub fn boundary(&self) -> &Boundary {
        self.boundary.get_or_init(|| {
            if self.operator.is_identity() {
                return *self.local_boundary();
            }
            let threshold = self.caches.config.boundary.fast_threshold;
            let positions: Vec<Point3<f64>> =
                self.elements.iter().map(|e| self.position(e)).collect();
            let indices: Vec<usize> = (0..positions.len()).collect();
            match self.coarse() {
                Some(coarse) => {
                    let radius: Vec<f64> = self.elements.iter().map(|e| coarse.radius[e]).collect();
                    Boundary::from_indexed_with_radius(&positions, &radius, &indices, threshold)
                }
                None => Boundary::from_indexed(&positions, &indices, threshold),
            }
        })
    }

    /// Spatial index over the model-frame positions of the elements.
    pub fn lookup(&self) -> &GridLookup3D {
        self.shared.lookup.get_or_init(|| {
            let radius = self
                .coarse()
                .map(|c| self.elements.iter().map(|e| c.radius[e]).collect());
            GridLookup3D::from_indexed(
                self.model_positions(),
                self.elements.as_slice(),
                radius,
                &self.caches.config.lookup,
            )
        })
    }

    /// Unit-local indices of elements within `radius` of `p`, given in this unit's frame.
    pub fn find(&self, p: &Point3<f64>, radius: f64) -> LookupResult {
        self.lookup().find(&self.operator.apply_inverse(p), radius)
    }

    pub fn find_into(&self, p: &Point3<f64>, radius: f64, out: &mut LookupResult) {
        self.lookup()
            .find_into(&self.operator.apply_inverse(p), radius, out)
    }

    pub fn check(&self, p: &Point3<f64>, radius: f64) -> bool {
        self.lookup().check(&self.operator.apply_inverse(p), radius)
    }

    /// Intra-unit bonds; always empty for coarse units.
    pub fn bonds(&self) -> &Arc<BondGraph> {
        self.bonds.get_or_init(|| {
            if !self.is_atomic() {
                return Arc::new(BondGraph::empty(self.len()));
            }
            let key = BondCacheKey {
                elements: self.elements.clone(),
                operator_key: self.operator.key(),
            };
            self.caches.bonds.get_or_insert_with(key, || {
                compute_intra_unit_bonds(self, &self.caches.config.bonds)
            })
        })
    }

    pub fn rings(&self) -> &Arc<UnitRings> {
        self.rings
            .get_or_init(|| Arc::new(UnitRings::compute(self)))
    }

    /// The same unit over `elements`, usually a subset of the current elements. Returns `self`
    /// when the element count is unchanged.
    pub fn child(self: &Arc<Self>, elements: SortedSet) -> Arc<Unit> {
        if elements.len() == self.elements.len() {
            return self.clone();
        }
        Arc::new(Self::new(
            self.id,
            self.invariant_id,
            self.kind,
            self.model.clone(),
            self.operator.clone(),
            elements,
            self.caches.clone(),
        ))
    }

    /// A symmetry copy with a new id. Unless `dont_compose`, the copy applies this unit's
    /// operator first and `operator` second.
    pub fn apply_operator(
        &self,
        id: u32,
        operator: Arc<SymmetryOperator>,
        dont_compose: bool,
    ) -> Unit {
        let operator = if dont_compose {
            operator
        } else {
            Arc::new(SymmetryOperator::compose(&self.operator, &operator))
        };
        Self::with_shared(
            id,
            self.invariant_id,
            self.kind,
            self.model.clone(),
            operator,
            self.elements.clone(),
            self.caches.clone(),
            self.shared.clone(),
        )
    }

    /// The same unit over another model with identical topology. Shared lookups are kept only
    /// when the coordinates are unchanged.
    pub fn remap_model(&self, model: Arc<Model>) -> Unit {
        let same_coordinates = conformation_id(&model, self.kind) == self.conformation_id();
        let shared = if same_coordinates {
            self.shared.clone()
        } else {
            Arc::default()
        };
        Self::with_shared(
            self.id,
            self.invariant_id,
            self.kind,
            model,
            self.operator.clone(),
            self.elements.clone(),
            self.caches.clone(),
            shared,
        )
    }
}

fn conformation_id(model: &Model, kind: UnitKind) -> u64 {
    match kind {
        UnitKind::Atomic => model.conformation.id,
        UnitKind::Spheres => model.spheres.as_ref().map_or(0, |c| c.conformation.id),
        UnitKind::Gaussians => model.gaussians.as_ref().map_or(0, |c| c.conformation.id),
    }
}
