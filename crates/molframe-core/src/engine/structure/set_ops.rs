//! Set algebra over structures that share unit ids.
//!
//! Units are matched by id. Operands are expected to derive from the same parent structure so
//! that equal ids denote the same model, operator and kind.

use super::structure::Structure;
use super::unit::Unit;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Elements present in any operand.
pub fn union(structures: &[&Structure]) -> Structure {
    match structures {
        [] => return Structure::empty(),
        [only] => return Structure::new(only.units().to_vec()),
        _ => {}
    }
    let mut merged: BTreeMap<u32, Arc<Unit>> = BTreeMap::new();
    for structure in structures {
        for unit in structure.units() {
            match merged.get(&unit.id()) {
                None => {
                    merged.insert(unit.id(), unit.clone());
                }
                Some(existing) => {
                    if unit.elements().is_subset_of(existing.elements()) {
                        continue;
                    }
                    let elements = existing.elements().union(unit.elements());
                    let widened = existing.child(elements);
                    merged.insert(unit.id(), widened);
                }
            }
        }
    }
    Structure::new(merged.into_values().collect())
}

/// Elements present in both operands.
pub fn intersect(a: &Structure, b: &Structure) -> Structure {
    let mut units = Vec::new();
    for unit in a.units() {
        let Some(other) = b.unit(unit.id()) else {
            continue;
        };
        let elements = unit.elements().intersect(other.elements());
        if !elements.is_empty() {
            units.push(unit.child(elements));
        }
    }
    Structure::new(units)
}

/// Elements of `a` that are not in `b`.
pub fn subtract(a: &Structure, b: &Structure) -> Structure {
    let mut units = Vec::new();
    for unit in a.units() {
        match b.unit(unit.id()) {
            None => units.push(unit.clone()),
            Some(other) => {
                let elements = unit.elements().subtract(other.elements());
                if !elements.is_empty() {
                    units.push(unit.child(elements));
                }
            }
        }
    }
    Structure::new(units)
}

pub fn are_intersecting(a: &Structure, b: &Structure) -> bool {
    let (small, large) = if a.unit_count() <= b.unit_count() {
        (a, b)
    } else {
        (b, a)
    };
    small.units().iter().any(|unit| {
        large
            .unit(unit.id())
            .is_some_and(|other| unit.elements().are_intersecting(other.elements()))
    })
}

/// Whether every element of `a` is in `b`.
pub fn is_subset(a: &Structure, b: &Structure) -> bool {
    if a.element_count() > b.element_count() {
        return false;
    }
    a.units().iter().all(|unit| {
        b.unit(unit.id())
            .is_some_and(|other| unit.elements().is_subset_of(other.elements()))
    })
}

/// Same unit ids with the same elements.
pub fn are_unit_ids_and_indices_equal(a: &Structure, b: &Structure) -> bool {
    if a.unit_count() != b.unit_count() || a.element_count() != b.element_count() {
        return false;
    }
    a.units().iter().zip(b.units()).all(|(x, y)| {
        x.id() == y.id() && x.elements().are_equal(y.elements())
    })
}
