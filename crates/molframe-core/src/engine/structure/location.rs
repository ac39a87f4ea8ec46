use super::unit::{Unit, UnitKind};
use nalgebra::Point3;
use std::sync::Arc;

/// One element of one unit.
#[derive(Debug, Clone)]
pub struct Location {
    pub unit: Arc<Unit>,
    /// Model element index.
    pub element: usize,
}

impl Location {
    pub fn new(unit: Arc<Unit>, element: usize) -> Self {
        Self { unit, element }
    }

    /// Location of the element at `index` in `unit.elements()`.
    pub fn at(unit: &Arc<Unit>, index: usize) -> Option<Self> {
        unit.elements()
            .get(index)
            .map(|element| Self::new(unit.clone(), element))
    }

    pub fn position(&self) -> Point3<f64> {
        self.unit.position(self.element)
    }

    pub fn operator_name(&self) -> &str {
        self.unit.operator().name()
    }

    pub fn residue_index(&self) -> Option<usize> {
        self.unit.residue_index(self.element)
    }

    pub fn chain_index(&self) -> usize {
        self.unit.chain_index(self.element)
    }

    pub fn type_symbol(&self) -> &str {
        self.unit.element_symbol(self.element)
    }

    /// Atom name; empty for coarse elements.
    pub fn atom_name(&self) -> &str {
        match self.unit.kind() {
            UnitKind::Atomic => self.unit.model().atomic.atom_name(self.element),
            UnitKind::Spheres | UnitKind::Gaussians => "",
        }
    }

    pub fn alt_id(&self) -> &str {
        match self.unit.kind() {
            UnitKind::Atomic => self.unit.model().atomic.alt_id(self.element),
            UnitKind::Spheres | UnitKind::Gaussians => "",
        }
    }

    /// Component id; empty for coarse elements.
    pub fn comp_id(&self) -> &str {
        match self.unit.kind() {
            UnitKind::Atomic => self.unit.model().atomic.comp_id(self.element),
            UnitKind::Spheres | UnitKind::Gaussians => "",
        }
    }

    pub fn label_asym_id(&self) -> &str {
        let model = self.unit.model();
        match self.unit.kind() {
            UnitKind::Atomic => model.atomic.label_asym_id(self.element),
            UnitKind::Spheres => model.spheres.as_ref().map_or("", |c| c.asym_id(self.element)),
            UnitKind::Gaussians => model
                .gaussians
                .as_ref()
                .map_or("", |c| c.asym_id(self.element)),
        }
    }

    pub fn auth_asym_id(&self) -> &str {
        match self.unit.kind() {
            UnitKind::Atomic => {
                let model = self.unit.model();
                &model.atomic.chains.auth_asym_id[self.chain_index()]
            }
            UnitKind::Spheres | UnitKind::Gaussians => self.label_asym_id(),
        }
    }

    pub fn entity_id(&self) -> &str {
        let model = self.unit.model();
        let chain = self.chain_index();
        match self.unit.kind() {
            UnitKind::Atomic => &model.atomic.chains.label_entity_id[chain],
            UnitKind::Spheres => model.spheres.as_ref().map_or("", |c| c.entity_id[chain].as_str()),
            UnitKind::Gaussians => model.gaussians.as_ref().map_or("", |c| c.entity_id[chain].as_str()),
        }
    }

    /// Label sequence number, falling back to the author number; the first residue of a
    /// coarse element.
    pub fn seq_id(&self) -> Option<i64> {
        let model = self.unit.model();
        match self.unit.kind() {
            UnitKind::Atomic => {
                let residue = model.atomic.residue_index(self.element);
                model.atomic.residues.seq_id(residue)
            }
            UnitKind::Spheres => model.spheres.as_ref().map(|c| c.seq_id_begin[self.element]),
            UnitKind::Gaussians => model
                .gaussians
                .as_ref()
                .map(|c| c.seq_id_begin[self.element]),
        }
    }

    pub fn auth_seq_id(&self) -> Option<i64> {
        match self.unit.kind() {
            UnitKind::Atomic => {
                let model = self.unit.model();
                let residue = model.atomic.residue_index(self.element);
                model.atomic.residues.auth_seq_id[residue]
            }
            UnitKind::Spheres | UnitKind::Gaussians => self.seq_id(),
        }
    }

    /// Chain label with the operator suffix of symmetry copies, e.g. `A_2`.
    pub fn chain_label(&self) -> String {
        format!("{}{}", self.label_asym_id(), self.unit.operator().suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn accessors_read_the_atomic_hierarchy() {
        let structure = test_support::two_chain_structure(10.0);
        let unit = &structure.units()[1];
        let location = Location::at(unit, 1).unwrap();
        assert_eq!(location.label_asym_id(), "B");
        assert_eq!(location.atom_name(), "CA");
        assert_eq!(location.comp_id(), "ALA");
        assert_eq!(location.type_symbol(), "C");
        assert_eq!(location.seq_id(), Some(1));
        assert_eq!(location.chain_label(), "B");
        assert_eq!(location.operator_name(), "1_555");
        assert!(Location::at(unit, 10).is_none());
    }
}
