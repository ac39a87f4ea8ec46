//! Least-squares rigid superposition of two equal-length point sets.
//!
//! The optimal rotation is the eigenvector of the largest eigenvalue of Horn's 4×4 key matrix,
//! read as a unit quaternion.

use super::NumericError;
use nalgebra::{Matrix3, Matrix4, Point3, Quaternion, SymmetricEigen, Translation3, UnitQuaternion, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct RmsdResult {
    /// Transform that maps the second point set onto the first.
    pub transform: Matrix4<f64>,
    pub rmsd: f64,
}

fn centroid(points: &[Point3<f64>]) -> Vector3<f64> {
    points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f64
}

fn check_lengths(a: &[Point3<f64>], b: &[Point3<f64>]) -> Result<(), NumericError> {
    if a.len() != b.len() {
        return Err(NumericError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(NumericError::Empty);
    }
    Ok(())
}

/// Root-mean-square deviation without any fitting.
pub fn rmsd(a: &[Point3<f64>], b: &[Point3<f64>]) -> Result<f64, NumericError> {
    check_lengths(a, b)?;
    let sum: f64 = a.iter().zip(b).map(|(p, q)| (p - q).norm_squared()).sum();
    Ok((sum / a.len() as f64).sqrt())
}

/// Finds the rigid transform of `b` minimizing its RMSD to `a`.
pub fn minimize_rmsd(a: &[Point3<f64>], b: &[Point3<f64>]) -> Result<RmsdResult, NumericError> {
    check_lengths(a, b)?;
    let n = a.len() as f64;
    let center_a = centroid(a);
    let center_b = centroid(b);

    let mut s = Matrix3::<f64>::zeros();
    let mut g_a = 0.0;
    let mut g_b = 0.0;
    for (p, q) in a.iter().zip(b) {
        let pa = p.coords - center_a;
        let pb = q.coords - center_b;
        g_a += pa.norm_squared();
        g_b += pb.norm_squared();
        s += pb * pa.transpose();
    }

    let (sxx, sxy, sxz) = (s[(0, 0)], s[(0, 1)], s[(0, 2)]);
    let (syx, syy, syz) = (s[(1, 0)], s[(1, 1)], s[(1, 2)]);
    let (szx, szy, szz) = (s[(2, 0)], s[(2, 1)], s[(2, 2)]);

    #[rustfmt::skip]
    let key = Matrix4::new(
        sxx + syy + szz, syz - szy,        szx - sxz,        sxy - syx,
        syz - szy,       sxx - syy - szz,  sxy + syx,        szx + sxz,
        szx - sxz,       sxy + syx,        -sxx + syy - szz, syz + szy,
        sxy - syx,       szx + sxz,        syz + szy,        -sxx - syy + szz,
    );

    let eigen = SymmetricEigen::new(key);
    let (max_index, max_value) = eigen
        .eigenvalues
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, x), (_, y)| x.total_cmp(y))
        .ok_or(NumericError::Empty)?;
    let v = eigen.eigenvectors.column(max_index);
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(v[0], v[1], v[2], v[3]));

    let transform = Translation3::from(center_a).to_homogeneous()
        * rotation.to_homogeneous()
        * Translation3::from(-center_b).to_homogeneous();

    // Rounding can push the residual slightly below zero for perfect fits.
    let msd = ((g_a + g_b - 2.0 * max_value) / n).max(0.0);
    Ok(RmsdResult {
        transform,
        rmsd: msd.sqrt(),
    })
}
