//! Uniform-cell spatial index over the positions of one unit.
//!
//! Items are binned into cubic cells stored as intrusive linked lists (`head`/`next`), so the
//! index is two flat arrays regardless of how the points are distributed.

use crate::core::math::boundary::{Boundary, Box3, DEFAULT_FAST_BOUNDARY_THRESHOLD};
use crate::engine::config::LookupConfig;
use nalgebra::{Point3, Vector3};

/// End-of-list marker in the cell linked lists.
const SENTINEL: u32 = u32::MAX;

/// Hits of a lookup query: indices into the indexed item list with their squared distances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    pub indices: Vec<usize>,
    pub squared_distances: Vec<f64>,
}

impl LookupResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.squared_distances.clear();
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push(&mut self, index: usize, squared_distance: f64) {
        self.indices.push(index);
        self.squared_distances.push(squared_distance);
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.squared_distances.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct GridLookup3D {
    cell_size: f64,
    origin: Point3<f64>,
    dims: Vector3<usize>,
    head: Vec<u32>,
    next: Vec<u32>,
    positions: Vec<Point3<f64>>,
    radius: Option<Vec<f64>>,
    max_radius: f64,
    boundary: Boundary,
}

impl GridLookup3D {
    /// Indexes `positions`; `radius`, when given, inflates every item by its own radius.
    pub fn new(positions: Vec<Point3<f64>>, radius: Option<Vec<f64>>, config: &LookupConfig) -> Self {
        let boundary = match &radius {
            Some(r) => {
                let indices: Vec<usize> = (0..positions.len()).collect();
                Boundary::from_indexed_with_radius(
                    &positions,
                    r,
                    &indices,
                    DEFAULT_FAST_BOUNDARY_THRESHOLD,
                )
            }
            None => Boundary::from_points(&positions),
        };
        let max_radius = radius
            .as_ref()
            .map(|r| r.iter().copied().fold(0.0, f64::max))
            .unwrap_or(0.0);

        if positions.is_empty() {
            return Self {
                cell_size: 1.0,
                origin: Point3::origin(),
                dims: Vector3::zeros(),
                head: Vec::new(),
                next: Vec::new(),
                positions,
                radius,
                max_radius,
                boundary,
            };
        }

        let mut bbox = Box3::empty();
        for p in &positions {
            bbox.include(p);
        }
        let epsilon = 1e-6;
        let origin = bbox.min;
        let extent = bbox.size().add_scalar(epsilon);

        let mut cell_size = config
            .cell_size
            .unwrap_or_else(|| derive_cell_size(&extent, positions.len(), config.elements_per_cell));
        let max_cells = (positions.len() * 4).max(64);
        let mut dims = grid_dims(&extent, cell_size);
        while dims.x * dims.y * dims.z > max_cells {
            cell_size *= 1.5;
            dims = grid_dims(&extent, cell_size);
        }

        let mut head = vec![SENTINEL; dims.x * dims.y * dims.z];
        let mut next = vec![SENTINEL; positions.len()];
        for (i, p) in positions.iter().enumerate() {
            let c = clamp_coords(p, &origin, cell_size, &dims);
            let cell = c.x + c.y * dims.x + c.z * dims.x * dims.y;
            next[i] = head[cell];
            head[cell] = i as u32;
        }

        Self {
            cell_size,
            origin,
            dims,
            head,
            next,
            positions,
            radius,
            max_radius,
            boundary,
        }
    }

    /// Indexes `all[indices[i]]`; results refer to positions `i` in `indices`.
    pub fn from_indexed(
        all: &[Point3<f64>],
        indices: &[usize],
        radius: Option<Vec<f64>>,
        config: &LookupConfig,
    ) -> Self {
        let positions = indices.iter().map(|&i| all[i]).collect();
        Self::new(positions, radius, config)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn find(&self, p: &Point3<f64>, radius: f64) -> LookupResult {
        let mut result = LookupResult::new();
        self.find_into(p, radius, &mut result);
        result
    }

    /// Like [`Self::find`], reusing `out`. Hits come in no particular order.
    pub fn find_into(&self, p: &Point3<f64>, radius: f64, out: &mut LookupResult) {
        out.clear();
        self.visit(p, radius, |index, d2| {
            out.push(index, d2);
            true
        });
    }

    /// Whether any item lies within `radius` of `p`.
    pub fn check(&self, p: &Point3<f64>, radius: f64) -> bool {
        let mut found = false;
        self.visit(p, radius, |_, _| {
            found = true;
            false
        });
        found
    }

    /// The `k` items closest to `p`, sorted by distance.
    pub fn nearest(&self, p: &Point3<f64>, k: usize) -> LookupResult {
        let mut result = LookupResult::new();
        if k == 0 || self.is_empty() {
            return result;
        }
        let far = self.boundary.sphere.center.coords.metric_distance(&p.coords)
            + self.boundary.sphere.radius
            + self.max_radius;
        let mut radius = self.cell_size;
        loop {
            self.find_into(p, radius, &mut result);
            if result.len() >= k || radius > far {
                break;
            }
            radius *= 2.0;
        }
        let mut hits: Vec<(usize, f64)> = result.iter().collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(k);
        result.clear();
        for (index, d2) in hits {
            result.push(index, d2);
        }
        result
    }

    /// Walks candidate cells and calls `hit(index, squared_distance)` for items within range;
    /// stops when `hit` returns `false`.
    fn visit(&self, p: &Point3<f64>, radius: f64, mut hit: impl FnMut(usize, f64) -> bool) {
        if self.is_empty() {
            return;
        }
        let reach = radius + self.max_radius;
        if !self.boundary.bbox.expanded(reach).contains(p) {
            return;
        }
        let delta = Vector3::repeat(reach);
        let lo = clamp_coords(&(p - delta), &self.origin, self.cell_size, &self.dims);
        let hi = clamp_coords(&(p + delta), &self.origin, self.cell_size, &self.dims);

        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let mut i = self.head[x + y * self.dims.x + z * self.dims.x * self.dims.y];
                    while i != SENTINEL {
                        let index = i as usize;
                        let d2 = nalgebra::distance_squared(&self.positions[index], p);
                        let cutoff = match &self.radius {
                            Some(r) => radius + r[index],
                            None => radius,
                        };
                        if d2 <= cutoff * cutoff && !hit(index, d2) {
                            return;
                        }
                        i = self.next[index];
                    }
                }
            }
        }
    }
}

fn derive_cell_size(extent: &Vector3<f64>, count: usize, elements_per_cell: usize) -> f64 {
    let cells = (count / elements_per_cell.max(1)).max(1) as f64;
    let volume = extent.x.max(1.0) * extent.y.max(1.0) * extent.z.max(1.0);
    (volume / cells).cbrt().max(0.5)
}

fn grid_dims(extent: &Vector3<f64>, cell_size: f64) -> Vector3<usize> {
    extent.map(|e| ((e / cell_size).ceil() as usize).max(1))
}

fn clamp_coords(
    p: &Point3<f64>,
    origin: &Point3<f64>,
    cell_size: f64,
    dims: &Vector3<usize>,
) -> Vector3<usize> {
    let offset = p - origin;
    Vector3::new(
        clamp_axis(offset.x, cell_size, dims.x),
        clamp_axis(offset.y, cell_size, dims.y),
        clamp_axis(offset.z, cell_size, dims.z),
    )
}

fn clamp_axis(offset: f64, cell_size: f64, dim: usize) -> usize {
    let c = (offset / cell_size).floor();
    if c <= 0.0 {
        0
    } else {
        (c as usize).min(dim - 1)
    }
}
