use crate::core::model::topology::BondOrder;
use phf::{Map, Set, phf_map, phf_set};

/// Threshold used for elements without an entry in [`ELEMENT_THRESHOLDS`].
pub const DEFAULT_BONDING_THRESHOLD: f64 = 2.001;

/// Maximum bond length per element, in Å. The pairing threshold of two elements is the larger of
/// their two values unless [`PAIR_THRESHOLDS`] overrides it.
#[rustfmt::skip]
static ELEMENT_THRESHOLDS: Map<&'static str, f64> = phf_map! {
    "H" => 1.42, "D" => 1.42, "T" => 1.42,
    "LI" => 2.7, "BE" => 2.7, "B" => 1.8, "C" => 1.75, "N" => 1.6, "O" => 1.52, "F" => 1.5,
    "NA" => 2.7, "MG" => 2.7, "AL" => 2.7, "SI" => 1.9, "P" => 1.9, "S" => 1.9, "CL" => 1.8,
    "K" => 2.7, "CA" => 2.7, "SC" => 2.7, "TI" => 2.7, "V" => 2.7, "CR" => 2.7, "MN" => 2.7,
    "FE" => 2.7, "CO" => 2.7, "NI" => 2.7, "CU" => 2.7, "ZN" => 2.7, "GA" => 2.7, "GE" => 2.7,
    "AS" => 2.68, "SE" => 1.95, "BR" => 1.95,
    "RB" => 2.7, "SR" => 2.7, "Y" => 2.7, "ZR" => 2.7, "NB" => 2.7, "MO" => 2.7, "TC" => 2.7,
    "RU" => 2.7, "RH" => 2.7, "PD" => 2.7, "AG" => 2.7, "CD" => 2.7, "IN" => 2.7, "SN" => 2.7,
    "SB" => 2.7, "TE" => 2.7, "I" => 2.1,
    "CS" => 2.7, "BA" => 2.7, "LA" => 2.7, "W" => 2.7, "RE" => 2.7, "OS" => 2.7, "IR" => 2.7,
    "PT" => 2.7, "AU" => 2.7, "HG" => 2.7, "TL" => 2.7, "PB" => 2.7, "BI" => 2.7,
    "U" => 2.7,
};

/// Overrides for specific element pairs, keyed `"A|B"` with `A <= B`.
#[rustfmt::skip]
static PAIR_THRESHOLDS: Map<&'static str, f64> = phf_map! {
    "H|H" => 0.8, "C|H" => 1.31, "H|N" => 1.3, "H|O" => 1.05, "H|S" => 1.45,
    "C|S" => 1.9, "N|S" => 1.8, "O|S" => 1.7, "S|S" => 2.2,
    "C|SE" => 2.0, "SE|SE" => 2.5, "O|P" => 1.7, "N|P" => 1.7, "C|P" => 1.9,
};

#[rustfmt::skip]
static METALS: Set<&'static str> = phf_set! {
    "LI", "NA", "K", "RB", "CS", "FR",
    "BE", "MG", "CA", "SR", "BA", "RA",
    "AL", "GA", "IN", "SN", "TL", "PB", "BI",
    "SC", "TI", "V", "CR", "MN", "FE", "CO", "NI", "CU", "ZN",
    "Y", "ZR", "NB", "MO", "TC", "RU", "RH", "PD", "AG", "CD",
    "LA", "HF", "TA", "W", "RE", "OS", "IR", "PT", "AU", "HG",
    "CE", "PR", "ND", "SM", "EU", "GD", "TB", "DY", "HO", "ER", "TM", "YB", "LU",
    "U", "PU",
};

#[rustfmt::skip]
static AMINO_ACIDS: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "MSE", "SEC", "PYL", "ASX", "GLX", "UNK",
    "DAL", "DAR", "DSG", "DAS", "DCY", "DGN", "DGL", "DHI", "DIL", "DLE",
    "DLY", "MED", "DPN", "DPR", "DSN", "DTH", "DTR", "DTY", "DVA",
};

#[rustfmt::skip]
static NUCLEOTIDES: Set<&'static str> = phf_set! {
    "A", "C", "G", "I", "T", "U", "N",
    "DA", "DC", "DG", "DI", "DT", "DU", "DN",
};

/// Double bonds of standard residues, keyed `"COMP|ATOM1|ATOM2"` with `ATOM1 <= ATOM2`.
#[rustfmt::skip]
static DOUBLE_BONDS: Set<&'static str> = phf_set! {
    "HIS|CD2|CG", "HIS|CE1|ND1",
    "ARG|CZ|NH2",
    "PHE|CE1|CZ", "PHE|CD2|CE2", "PHE|CD1|CG",
    "TRP|CD1|CG", "TRP|CD2|CE2", "TRP|CE3|CZ3", "TRP|CH2|CZ2",
    "ASN|CG|OD1", "GLN|CD|OE1",
    "TYR|CD1|CG", "TYR|CD2|CE2", "TYR|CE1|CZ",
    "ASP|CG|OD1", "GLU|CD|OE1",
    "G|C8|N7", "G|C4|C5", "G|C2|N3", "G|C6|O6",
    "C|C4|N3", "C|C5|C6", "C|C2|O2",
    "A|C2|N3", "A|C6|N1", "A|C4|C5", "A|C8|N7",
    "U|C5|C6", "U|C2|O2", "U|C4|O4",
    "DG|C8|N7", "DG|C4|C5", "DG|C2|N3", "DG|C6|O6",
    "DC|C4|N3", "DC|C5|C6", "DC|C2|O2",
    "DA|C2|N3", "DA|C6|N1", "DA|C4|C5", "DA|C8|N7",
    "DT|C5|C6", "DT|C2|O2", "DT|C4|O4",
};

/// Elements that may take part in an aromatic ring.
#[rustfmt::skip]
static AROMATIC_ELEMENTS: Set<&'static str> = phf_set! {
    "B", "C", "N", "O", "SI", "P", "S", "GE", "AS", "SN", "SB", "BI",
};

pub fn element_threshold(element: &str) -> f64 {
    ELEMENT_THRESHOLDS
        .get(element)
        .copied()
        .unwrap_or(DEFAULT_BONDING_THRESHOLD)
}

/// Maximum bonding distance between two elements.
pub fn pairing_threshold(element_a: &str, element_b: &str) -> f64 {
    let key = if element_a <= element_b {
        format!("{}|{}", element_a, element_b)
    } else {
        format!("{}|{}", element_b, element_a)
    };
    match PAIR_THRESHOLDS.get(key.as_str()) {
        Some(&t) => t,
        None => element_threshold(element_a).max(element_threshold(element_b)),
    }
}

#[inline]
pub fn is_hydrogen(element: &str) -> bool {
    matches!(element, "H" | "D" | "T")
}

#[inline]
pub fn is_metal(element: &str) -> bool {
    METALS.contains(element)
}

pub fn is_amino_acid(comp_id: &str) -> bool {
    AMINO_ACIDS.contains(comp_id)
}

pub fn is_nucleotide(comp_id: &str) -> bool {
    NUCLEOTIDES.contains(comp_id)
}

pub fn is_aromatic_element(element: &str) -> bool {
    AROMATIC_ELEMENTS.contains(element)
}

/// Bond order between two atoms of the same residue, defaulting to single.
pub fn intra_bond_order(comp_id: &str, atom_a: &str, atom_b: &str) -> BondOrder {
    let (first, second) = if atom_a <= atom_b {
        (atom_a, atom_b)
    } else {
        (atom_b, atom_a)
    };
    if is_amino_acid(comp_id) && first == "C" && second == "O" {
        return BondOrder::Double;
    }
    if is_nucleotide(comp_id) && first == "OP1" && second == "P" {
        return BondOrder::Double;
    }
    let key = format!("{}|{}|{}", comp_id, first, second);
    if DOUBLE_BONDS.contains(key.as_str()) {
        BondOrder::Double
    } else {
        BondOrder::Single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carbon_pair_uses_element_threshold() {
        assert_eq!(pairing_threshold("C", "C"), 1.75);
        assert_eq!(pairing_threshold("C", "FE"), 2.7);
    }

    #[test]
    fn pair_override_is_order_independent() {
        assert_eq!(pairing_threshold("O", "H"), 1.05);
        assert_eq!(pairing_threshold("H", "O"), 1.05);
    }

    #[test]
    fn unknown_elements_fall_back_to_default() {
        assert_eq!(element_threshold("XX"), DEFAULT_BONDING_THRESHOLD);
    }

    #[test]
    fn backbone_carbonyl_is_double() {
        assert_eq!(intra_bond_order("ALA", "O", "C"), BondOrder::Double);
        assert_eq!(intra_bond_order("PHE", "CZ", "CE1"), BondOrder::Double);
        assert_eq!(intra_bond_order("ALA", "CA", "CB"), BondOrder::Single);
        assert_eq!(intra_bond_order("DA", "P", "OP1"), BondOrder::Double);
    }

    #[test]
    fn metals_and_hydrogens_are_classified() {
        assert!(is_metal("ZN"));
        assert!(!is_metal("C"));
        assert!(is_hydrogen("D"));
        assert!(is_aromatic_element("N"));
        assert!(!is_aromatic_element("FE"));
    }
}
