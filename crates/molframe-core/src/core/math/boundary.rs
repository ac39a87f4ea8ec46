use nalgebra::{Matrix4, Point3, Vector3};

/// Element count above which [`Boundary::from_indexed`] switches to the box-derived sphere.
pub const DEFAULT_FAST_BOUNDARY_THRESHOLD: usize = 250_000;

/// Relative slack added to computed radii so containment survives floating-point rounding.
const RADIUS_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3 {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Box3 {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn expanded(&self, delta: f64) -> Self {
        let d = Vector3::repeat(delta);
        Self {
            min: self.min - d,
            max: self.max + d,
        }
    }

    pub fn overlaps(&self, other: &Box3) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y
            || self.max.z < other.min.z
            || self.min.z > other.max.z)
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere3 {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl Sphere3 {
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn zero() -> Self {
        Self::new(Point3::origin(), 0.0)
    }

    pub fn contains(&self, p: &Point3<f64>, eps: f64) -> bool {
        (p - self.center).norm() <= self.radius + eps
    }

    /// Applies a rigid transform. The radius is unchanged.
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self::new(m.transform_point(&self.center), self.radius)
    }

    /// Smallest sphere containing both `self` and `other`.
    pub fn expand(&self, other: &Sphere3) -> Self {
        let offset = other.center - self.center;
        let distance = offset.norm();
        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }
        let radius = (distance + self.radius + other.radius) / 2.0;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self::new(center, radius)
    }

    pub fn distance_to(&self, other: &Sphere3) -> f64 {
        (other.center - self.center).norm() - self.radius - other.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub bbox: Box3,
    pub sphere: Sphere3,
}

impl Boundary {
    pub fn empty() -> Self {
        Self {
            bbox: Box3::empty(),
            sphere: Sphere3::zero(),
        }
    }

    /// Boundary of `positions[i]` for every `i` in `indices`.
    ///
    /// Up to `fast_threshold` elements the sphere is a Ritter sphere refined by a containment
    /// pass; above it the sphere circumscribes the bounding box. Both contain every point.
    pub fn from_indexed(positions: &[Point3<f64>], indices: &[usize], fast_threshold: usize) -> Self {
        if indices.is_empty() {
            return Self::empty();
        }
        let mut bbox = Box3::empty();
        for &i in indices {
            bbox.include(&positions[i]);
        }
        let sphere = if indices.len() > fast_threshold {
            box_sphere(&bbox)
        } else {
            ritter_sphere(positions, indices)
        };
        Self { bbox, sphere }
    }

    pub fn from_points(points: &[Point3<f64>]) -> Self {
        let indices: Vec<usize> = (0..points.len()).collect();
        Self::from_indexed(points, &indices, DEFAULT_FAST_BOUNDARY_THRESHOLD)
    }

    /// Boundary of elements that each carry their own radius.
    pub fn from_indexed_with_radius(
        positions: &[Point3<f64>],
        radius: &[f64],
        indices: &[usize],
        fast_threshold: usize,
    ) -> Self {
        let base = Self::from_indexed(positions, indices, fast_threshold);
        let max_radius = indices.iter().map(|&i| radius[i]).fold(0.0, f64::max);
        if max_radius <= 0.0 {
            return base;
        }
        Self {
            bbox: base.bbox.expanded(max_radius),
            sphere: Sphere3::new(base.sphere.center, base.sphere.radius + max_radius),
        }
    }
}

fn box_sphere(bbox: &Box3) -> Sphere3 {
    let radius = bbox.size().norm() / 2.0;
    Sphere3::new(bbox.center(), radius * (1.0 + RADIUS_SLACK))
}

fn ritter_sphere(positions: &[Point3<f64>], indices: &[usize]) -> Sphere3 {
    let first = positions[indices[0]];
    let farthest_from = |origin: &Point3<f64>| -> Point3<f64> {
        indices
            .iter()
            .map(|&i| positions[i])
            .max_by(|a, b| (a - origin).norm_squared().total_cmp(&(b - origin).norm_squared()))
            .unwrap_or(*origin)
    };
    let p = farthest_from(&first);
    let q = farthest_from(&p);

    let mut center = nalgebra::center(&p, &q);
    let mut radius = (q - p).norm() / 2.0;
    for &i in indices {
        let point = positions[i];
        let d = (point - center).norm();
        if d > radius {
            let new_radius = (radius + d) / 2.0;
            center += (point - center) * ((new_radius - radius) / d);
            radius = new_radius;
        }
    }

    // Incremental growth is containment-preserving only up to rounding; close the gap exactly.
    let max_distance = indices
        .iter()
        .map(|&i| (positions[i] - center).norm())
        .fold(0.0, f64::max);
    Sphere3::new(center, radius.max(max_distance) * (1.0 + RADIUS_SLACK))
}
