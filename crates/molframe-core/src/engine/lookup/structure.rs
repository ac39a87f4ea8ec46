//! Structure-wide spatial index. Units are located through a kd-tree over the centers of their
//! transformed bounding spheres; element queries are then delegated to each candidate unit.

use super::grid::LookupResult;
use crate::core::math::boundary::Sphere3;
use crate::engine::structure::{Structure, Unit};
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;
use std::sync::Arc;

/// Hits of a structure-wide query. `indices` are unit-local.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureLookupResult {
    pub unit_ids: Vec<u32>,
    pub indices: Vec<usize>,
    pub squared_distances: Vec<f64>,
}

impl StructureLookupResult {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push(&mut self, unit_id: u32, index: usize, squared_distance: f64) {
        self.unit_ids.push(unit_id);
        self.indices.push(index);
        self.squared_distances.push(squared_distance);
    }

    /// Iterates `(unit_id, unit_local_index, squared_distance)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize, f64)> + '_ {
        self.unit_ids
            .iter()
            .zip(&self.indices)
            .zip(&self.squared_distances)
            .map(|((&u, &i), &d)| (u, i, d))
    }
}

pub struct StructureLookup3D {
    tree: KdTree<f64, 3>,
    units: Vec<Arc<Unit>>,
    spheres: Vec<Sphere3>,
    max_sphere_radius: f64,
}

impl std::fmt::Debug for StructureLookup3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureLookup3D")
            .field("units", &self.units.len())
            .field("max_sphere_radius", &self.max_sphere_radius)
            .finish()
    }
}

impl StructureLookup3D {
    pub fn new(structure: &Structure) -> Self {
        let units: Vec<Arc<Unit>> = structure
            .units()
            .iter()
            .filter(|u| !u.is_empty())
            .cloned()
            .collect();
        let spheres: Vec<Sphere3> = units.iter().map(|u| u.boundary().sphere).collect();
        let mut tree: KdTree<f64, 3> = KdTree::new();
        for (i, sphere) in spheres.iter().enumerate() {
            let c = sphere.center;
            tree.add(&[c.x, c.y, c.z], i as u64);
        }
        let max_sphere_radius = spheres.iter().map(|s| s.radius).fold(0.0, f64::max);
        Self {
            tree,
            units,
            spheres,
            max_sphere_radius,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Non-empty units in structure order.
    pub fn units(&self) -> &[Arc<Unit>] {
        &self.units
    }

    /// Positions in [`Self::units`] of units whose bounding sphere comes within `radius` of
    /// `p`, ascending.
    pub fn find_unit_indices(&self, p: &Point3<f64>, radius: f64) -> Vec<usize> {
        if self.units.is_empty() {
            return Vec::new();
        }
        let reach = radius + self.max_sphere_radius;
        let mut hits: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&[p.x, p.y, p.z], reach * reach)
            .into_iter()
            .map(|n| n.item as usize)
            .filter(|&i| {
                let sphere = &self.spheres[i];
                nalgebra::distance(&sphere.center, p) <= radius + sphere.radius
            })
            .collect();
        hits.sort_unstable();
        hits
    }

    pub fn find(&self, p: &Point3<f64>, radius: f64) -> StructureLookupResult {
        let mut result = StructureLookupResult::default();
        let mut buffer = LookupResult::new();
        for i in self.find_unit_indices(p, radius) {
            let unit = &self.units[i];
            unit.find_into(p, radius, &mut buffer);
            for (index, d2) in buffer.iter() {
                result.push(unit.id(), index, d2);
            }
        }
        result
    }

    pub fn check(&self, p: &Point3<f64>, radius: f64) -> bool {
        self.find_unit_indices(p, radius)
            .into_iter()
            .any(|i| self.units[i].check(p, radius))
    }

    /// The `k` elements closest to `p` across all units, sorted by distance.
    pub fn nearest(&self, p: &Point3<f64>, k: usize) -> StructureLookupResult {
        let mut result = StructureLookupResult::default();
        if k == 0 {
            return result;
        }
        let mut order: Vec<(usize, f64)> = self
            .spheres
            .iter()
            .enumerate()
            .map(|(i, s)| (i, (nalgebra::distance(&s.center, p) - s.radius).max(0.0)))
            .collect();
        order.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut hits: Vec<(u32, usize, f64)> = Vec::new();
        for (i, lower_bound) in order {
            if hits.len() >= k && lower_bound * lower_bound > hits[k - 1].2 {
                break;
            }
            let unit = &self.units[i];
            let local = unit.lookup().nearest(&unit.operator().apply_inverse(p), k);
            hits.extend(local.iter().map(|(index, d2)| (unit.id(), index, d2)));
            hits.sort_by(|a, b| a.2.total_cmp(&b.2));
            hits.truncate(k);
        }
        for (unit_id, index, d2) in hits {
            result.push(unit_id, index, d2);
        }
        result
    }
}
