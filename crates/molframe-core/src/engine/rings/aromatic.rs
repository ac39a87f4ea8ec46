use crate::core::collections::sorted::SortedSet;
use crate::core::math::eigen::PrincipalAxes;
use crate::core::model::topology::BondFlags;
use crate::engine::bonds::graph::BondGraph;
use crate::engine::bonds::tables;
use crate::engine::structure::unit::Unit;
use nalgebra::Point3;

/// Largest out-of-plane spread, in Å, for a ring to count as planar.
const PLANARITY_THRESHOLD: f64 = 0.05;

/// Whether a ring of unit-local indices is aromatic.
///
/// Rings whose bonds all carry the aromatic flag are aromatic. When any ring bond carries an
/// aromatic or non-aromatic flag the source has spoken and geometry is not consulted.
/// Otherwise rings of five or more atoms containing an aromatic-capable element are aromatic
/// when planar. Proline rings are never aromatic.
pub fn is_aromatic(unit: &Unit, graph: &BondGraph, ring: &SortedSet) -> bool {
    let elements = unit.elements();
    let atomic = &unit.model().atomic;
    let Some(first) = ring.first() else {
        return false;
    };
    if atomic.comp_id(elements[first]) == "PRO" {
        return false;
    }

    let mut aromatic_bonds = 0;
    let mut flagged_bonds = 0;
    let mut has_aromatic_element = false;
    for i in ring.iter() {
        if !has_aromatic_element && tables::is_aromatic_element(atomic.element(elements[i])) {
            has_aromatic_element = true;
        }
        for edge in graph.edge_range(i) {
            if !ring.contains(graph.target(edge)) {
                continue;
            }
            let flags = graph.flags()[edge];
            if flags.contains(BondFlags::AROMATIC) {
                aromatic_bonds += 1;
            }
            if flags.intersects(BondFlags::AROMATIC | BondFlags::NON_AROMATIC) {
                flagged_bonds += 1;
            }
        }
    }

    if aromatic_bonds == 2 * ring.len() {
        return true;
    }
    if !has_aromatic_element || ring.len() < 5 || flagged_bonds > 0 {
        return false;
    }
    let points: Vec<Point3<f64>> = ring
        .iter()
        .map(|i| unit.model_position(elements[i]))
        .collect();
    match PrincipalAxes::from_points(&points) {
        Ok(axes) => axes.moments_axes.dir_c.norm() < PLANARITY_THRESHOLD,
        Err(_) => false,
    }
}
