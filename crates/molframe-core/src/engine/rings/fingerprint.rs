//! Canonical ring labels: the lexicographically smallest rotation of the element sequence in
//! either direction, joined with `-`.

use crate::core::collections::sorted::SortedSet;
use crate::engine::bonds::graph::BondGraph;
use crate::engine::structure::unit::Unit;

/// Fingerprint of a ring given as unit-local indices. Symbols are read along the ring's bonds
/// so the label does not depend on atom numbering.
pub fn ring_fingerprint(unit: &Unit, graph: &BondGraph, ring: &SortedSet) -> String {
    let elements = unit.elements();
    let symbols: Vec<&str> = cycle_order(graph, ring)
        .into_iter()
        .map(|i| unit.element_symbol(elements[i]))
        .collect();
    element_fingerprint(&symbols)
}

/// Ring atoms in bond order starting from the lowest index. Falls back to index order when the
/// ring atoms do not form a simple walk.
pub fn cycle_order(graph: &BondGraph, ring: &SortedSet) -> Vec<usize> {
    let Some(start) = ring.first() else {
        return Vec::new();
    };
    let mut order = Vec::with_capacity(ring.len());
    order.push(start);
    let mut previous = usize::MAX;
    let mut current = start;
    while order.len() < ring.len() {
        let next = graph
            .neighbors(current)
            .iter()
            .copied()
            .filter(|&n| n != previous && ring.contains(n) && !order.contains(&n))
            .min();
        match next {
            Some(n) => {
                previous = current;
                current = n;
                order.push(n);
            }
            None => return ring.iter().collect(),
        }
    }
    order
}

/// Fingerprint of a cyclic element sequence. Equal for all rotations and reflections.
pub fn element_fingerprint(symbols: &[&str]) -> String {
    if symbols.is_empty() {
        return String::new();
    }
    let len = symbols.len();
    let reversed: Vec<&str> = symbols.iter().rev().copied().collect();
    let rot_normal = minimal_rotation(symbols);
    let rot_reversed = minimal_rotation(&reversed);

    let normal_is_smaller = (0..len)
        .map(|i| (symbols[(i + rot_normal) % len], reversed[(i + rot_reversed) % len]))
        .find(|(u, v)| u != v)
        .is_some_and(|(u, v)| u < v);

    if normal_is_smaller {
        join_rotated(symbols, rot_normal)
    } else {
        join_rotated(&reversed, rot_reversed)
    }
}

/// Booth's least-rotation algorithm over a sequence of symbols.
fn minimal_rotation(s: &[&str]) -> usize {
    let len = s.len() as isize;
    let at = |i: isize| s[(i % len) as usize];
    let mut f = vec![-1isize; (2 * len) as usize];
    let mut k: isize = 0;
    for j in 1..2 * len {
        let mut i = f[(j - k - 1) as usize];
        while i != -1 {
            let (u, v) = (at(j), at(k + i + 1));
            if u == v {
                break;
            }
            if u < v {
                k = j - i - 1;
            }
            i = f[i as usize];
        }
        if i == -1 {
            let (u, v) = (at(j), at(k + i + 1));
            if u != v {
                if u < v {
                    k = j;
                }
                f[(j - k) as usize] = -1;
            } else {
                f[(j - k) as usize] = i + 1;
            }
        } else {
            f[(j - k) as usize] = i + 1;
        }
    }
    k as usize
}

fn join_rotated(s: &[&str], offset: usize) -> String {
    let len = s.len();
    (0..len)
        .map(|i| s[(i + offset) % len])
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_invariant_under_rotation_and_reflection() {
        let base = element_fingerprint(&["C", "C", "N", "C", "O"]);
        assert_eq!(element_fingerprint(&["N", "C", "O", "C", "C"]), base);
        assert_eq!(element_fingerprint(&["O", "C", "N", "C", "C"]), base);
        assert_eq!(base, "C-C-N-C-O");
    }

    #[test]
    fn ring_fingerprints_follow_bonds_not_numbering() {
        use crate::core::io::CategoryData;
        use crate::test_support::{atom_site, structure};
        // Pyridine-like ring numbered so that index order skips around the cycle.
        let hexagon = |k: f64| [1.4 * (k * std::f64::consts::PI / 3.0).cos(), 1.4 * (k * std::f64::consts::PI / 3.0).sin(), 0.0];
        let s = structure(&CategoryData::new().with(atom_site(&[
            ("N", "N1", "LIG", "A", 1, hexagon(0.0)),
            ("C", "C2", "LIG", "A", 1, hexagon(3.0)),
            ("C", "C3", "LIG", "A", 1, hexagon(1.0)),
            ("C", "C4", "LIG", "A", 1, hexagon(4.0)),
            ("O", "O5", "LIG", "A", 1, hexagon(2.0)),
            ("C", "C6", "LIG", "A", 1, hexagon(5.0)),
        ])));
        let unit = &s.units()[0];
        let ring = SortedSet::from_range(0, 6);
        assert_eq!(cycle_order(unit.bonds(), &ring), vec![0, 2, 4, 1, 3, 5]);
        assert_eq!(
            ring_fingerprint(unit, unit.bonds(), &ring),
            element_fingerprint(&["N", "C", "O", "C", "C", "C"])
        );
    }

    #[test]
    fn homogeneous_rings_have_a_repeated_label() {
        assert_eq!(element_fingerprint(&["C"; 6]), "C-C-C-C-C-C");
    }

    #[test]
    fn minimal_rotation_finds_the_smallest_start() {
        assert_eq!(minimal_rotation(&["N", "C", "C", "O"]), 1);
        assert_eq!(minimal_rotation(&["C", "C"]), 0);
    }
}
