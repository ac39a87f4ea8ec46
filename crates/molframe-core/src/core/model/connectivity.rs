use super::topology::{BondFlags, BondOrder};
use std::collections::HashMap;

/// One endpoint of an explicit connectivity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partner {
    pub atom: usize,
    /// Symmetry operator name the partner lives under, e.g. `1_555`.
    pub symmetry: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructConnEntry {
    pub row: usize,
    pub partner_a: Partner,
    pub partner_b: Partner,
    pub flags: BondFlags,
    pub order: BondOrder,
}

impl StructConnEntry {
    /// Whether the record should enter a bond graph at all.
    pub fn is_bond(&self) -> bool {
        self.flags
            .intersects(BondFlags::COVALENT | BondFlags::METALLIC_COORDINATION)
    }
}

/// Explicit inter-residue connectivity records, indexed by atom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructConn {
    pub entries: Vec<StructConnEntry>,
    by_atom: HashMap<usize, Vec<usize>>,
}

impl StructConn {
    pub fn new(entries: Vec<StructConnEntry>) -> Self {
        let mut by_atom: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            by_atom.entry(entry.partner_a.atom).or_default().push(i);
            if entry.partner_b.atom != entry.partner_a.atom {
                by_atom.entry(entry.partner_b.atom).or_default().push(i);
            }
        }
        Self { entries, by_atom }
    }

    pub fn entries_for(&self, atom: usize) -> impl Iterator<Item = &StructConnEntry> {
        self.by_atom
            .get(&atom)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A bond given directly between two atoms, optionally bound to specific operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexPairBond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
    pub flags: BondFlags,
    pub distance: Option<f64>,
    pub operator_a: Option<i32>,
    pub operator_b: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexPairBonds {
    pub bonds: Vec<IndexPairBond>,
    by_atom: HashMap<usize, Vec<usize>>,
}

impl IndexPairBonds {
    pub fn new(bonds: Vec<IndexPairBond>) -> Self {
        let mut by_atom: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, bond) in bonds.iter().enumerate() {
            by_atom.entry(bond.a).or_default().push(i);
            by_atom.entry(bond.b).or_default().push(i);
        }
        Self { bonds, by_atom }
    }

    pub fn bonds_for(&self, atom: usize) -> impl Iterator<Item = &IndexPairBond> {
        self.by_atom
            .get(&atom)
            .into_iter()
            .flatten()
            .map(|&i| &self.bonds[i])
    }

    /// Bonds touching `atom` together with their row in [`Self::bonds`].
    pub fn rows_for(&self, atom: usize) -> impl Iterator<Item = (usize, &IndexPairBond)> {
        self.by_atom
            .get(&atom)
            .into_iter()
            .flatten()
            .map(|&i| (i, &self.bonds[i]))
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentBond {
    pub order: BondOrder,
    pub flags: BondFlags,
    /// Stable id of the dictionary row, reused for every residue of the same component.
    pub key: i32,
}

/// Chemical-component dictionary: bonds between atom names of one residue type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentBondTable {
    entries: HashMap<String, HashMap<String, HashMap<String, ComponentBond>>>,
}

impl ComponentBondTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, comp_id: &str, atom_a: &str, atom_b: &str, bond: ComponentBond) {
        let component = self.entries.entry(comp_id.to_string()).or_default();
        component
            .entry(atom_a.to_string())
            .or_default()
            .insert(atom_b.to_string(), bond);
        component
            .entry(atom_b.to_string())
            .or_default()
            .insert(atom_a.to_string(), bond);
    }

    pub fn has_component(&self, comp_id: &str) -> bool {
        self.entries.contains_key(comp_id)
    }

    /// Bonds of `atom` in component `comp_id`, keyed by partner atom name.
    pub fn atom_bonds(&self, comp_id: &str, atom: &str) -> Option<&HashMap<String, ComponentBond>> {
        self.entries.get(comp_id)?.get(atom)
    }

    pub fn get(&self, comp_id: &str, atom_a: &str, atom_b: &str) -> Option<&ComponentBond> {
        self.atom_bonds(comp_id, atom_a)?.get(atom_b)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
