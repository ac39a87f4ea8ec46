use super::NumericError;
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

/// Eigenvalues sorted ascending with their unit eigenvectors as matching columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigen3 {
    pub values: Vector3<f64>,
    pub vectors: Matrix3<f64>,
}

pub fn symmetric_eigen3(m: &Matrix3<f64>) -> Eigen3 {
    let decomposition = SymmetricEigen::new(*m);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| decomposition.eigenvalues[a].total_cmp(&decomposition.eigenvalues[b]));

    let mut values = Vector3::zeros();
    let mut vectors = Matrix3::zeros();
    for (target, &source) in order.iter().enumerate() {
        values[target] = decomposition.eigenvalues[source];
        vectors.set_column(target, &decomposition.eigenvectors.column(source));
    }
    Eigen3 { values, vectors }
}

/// An origin plus three orthogonal direction vectors, `dir_a` being the major one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes3 {
    pub origin: Point3<f64>,
    pub dir_a: Vector3<f64>,
    pub dir_b: Vector3<f64>,
    pub dir_c: Vector3<f64>,
}

impl Axes3 {
    pub fn center(&self) -> Point3<f64> {
        self.origin
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalAxes {
    /// Directions scaled by the standard deviation of the points along each axis.
    pub moments_axes: Axes3,
    /// Same directions, scaled and centered so they span the points' extent.
    pub box_axes: Axes3,
}

impl PrincipalAxes {
    pub fn from_points(points: &[Point3<f64>]) -> Result<Self, NumericError> {
        if points.is_empty() {
            return Err(NumericError::Empty);
        }
        let n = points.len() as f64;
        let mean = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / n;

        let mut scatter = Matrix3::zeros();
        for p in points {
            let d = p.coords - mean;
            scatter += d * d.transpose();
        }
        let eigen = symmetric_eigen3(&scatter);

        let axis = |i: usize| -> Vector3<f64> {
            let v: Vector3<f64> = eigen.vectors.column(i).into_owned();
            v * (eigen.values[i].max(0.0) / n).sqrt()
        };
        let moments_axes = Axes3 {
            origin: Point3::from(mean),
            dir_a: axis(2),
            dir_b: axis(1),
            dir_c: axis(0),
        };
        let box_axes = Self::box_frame(points, &moments_axes);
        Ok(Self {
            moments_axes,
            box_axes,
        })
    }

    fn box_frame(points: &[Point3<f64>], moments: &Axes3) -> Axes3 {
        let unit = |v: &Vector3<f64>| v.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
        let directions = [unit(&moments.dir_a), unit(&moments.dir_b), unit(&moments.dir_c)];

        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for p in points {
            let d = p - moments.origin;
            for (k, dir) in directions.iter().enumerate() {
                let projection = d.dot(dir);
                min[k] = min[k].min(projection);
                max[k] = max[k].max(projection);
            }
        }

        let mut origin = moments.origin;
        for (k, dir) in directions.iter().enumerate() {
            origin += dir * ((min[k] + max[k]) / 2.0);
        }
        Axes3 {
            origin,
            dir_a: directions[0] * ((max[0] - min[0]) / 2.0),
            dir_b: directions[1] * ((max[1] - min[1]) / 2.0),
            dir_c: directions[2] * ((max[2] - min[2]) / 2.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eigenvalues_are_sorted_ascending() {
        let m = Matrix3::from_diagonal(&Vector3::new(3.0, 1.0, 2.0));
        let eigen = symmetric_eigen3(&m);
        assert!((eigen.values[0] - 1.0).abs() < 1e-12);
        assert!((eigen.values[1] - 2.0).abs() < 1e-12);
        assert!((eigen.values[2] - 3.0).abs() < 1e-12);
        assert!((eigen.vectors[(1, 0)].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn planar_points_have_vanishing_minor_axis() {
        let points: Vec<Point3<f64>> = (0..6)
            .map(|i| {
                let a = i as f64 * std::f64::consts::PI / 3.0;
                Point3::new(1.4 * a.cos(), 1.4 * a.sin(), 2.0)
            })
            .collect();
        let axes = PrincipalAxes::from_points(&points).unwrap();
        assert!(axes.moments_axes.dir_c.norm() < 1e-9);
        assert!((axes.moments_axes.origin.z - 2.0).abs() < 1e-12);
        assert!(axes.moments_axes.dir_a.norm() > 0.5);
    }

    #[test]
    fn box_axes_span_the_point_extent() {
        let points = vec![
            Point3::new(-2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let axes = PrincipalAxes::from_points(&points).unwrap();
        assert!((axes.box_axes.dir_a.norm() - 2.0).abs() < 1e-9);
        assert!((axes.box_axes.dir_b.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(PrincipalAxes::from_points(&[]), Err(NumericError::Empty));
    }
}
