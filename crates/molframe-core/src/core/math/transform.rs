use super::NumericError;
use nalgebra::{Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Tolerance used when deciding whether a matrix is the identity.
pub const IDENTITY_EPSILON: f64 = 1e-6;

/// Tolerance of the rotation + translation sanity check applied to symmetry operators.
pub const RIGID_EPSILON: f64 = 0.005;

/// Interpolation parameters closer than this to 0 or 1 return the corresponding endpoint.
const INTERPOLATION_EPSILON: f64 = 1e-5;

pub fn is_identity(m: &Matrix4<f64>, eps: f64) -> bool {
    let identity = Matrix4::<f64>::identity();
    m.iter()
        .zip(identity.iter())
        .all(|(a, b)| (a - b).abs() <= eps)
}

pub fn rotation_part(m: &Matrix4<f64>) -> Matrix3<f64> {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

pub fn translation_part(m: &Matrix4<f64>) -> Vector3<f64> {
    Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

pub fn from_rotation_translation(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    m[(0, 3)] = translation.x;
    m[(1, 3)] = translation.y;
    m[(2, 3)] = translation.z;
    m
}

/// Checks that `m` is a proper rigid transform: homogeneous last row, orthonormal rotation block
/// and unit determinant, each within `eps`.
pub fn is_rotation_and_translation(m: &Matrix4<f64>, eps: f64) -> bool {
    if m[(3, 0)].abs() > eps
        || m[(3, 1)].abs() > eps
        || m[(3, 2)].abs() > eps
        || (m[(3, 3)] - 1.0).abs() > eps
    {
        return false;
    }
    let r = rotation_part(m);
    if (r.determinant() - 1.0).abs() > eps {
        return false;
    }
    let should_be_identity = r * r.transpose();
    let identity = Matrix3::<f64>::identity();
    should_be_identity
        .iter()
        .zip(identity.iter())
        .all(|(a, b)| (a - b).abs() <= eps)
}

/// Inverts a general 4×4 matrix, reporting singular input instead of producing NaNs.
pub fn invert(m: &Matrix4<f64>) -> Result<Matrix4<f64>, NumericError> {
    let inverse = m.try_inverse().ok_or(NumericError::Singular)?;
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(NumericError::Singular);
    }
    Ok(inverse)
}

/// Extracts the rotation block as a unit quaternion, orthonormalizing it first so that slightly
/// non-rigid input still yields a valid rotation.
pub fn rotation_quaternion(m: &Matrix4<f64>) -> UnitQuaternion<f64> {
    let rotation = Rotation3::from_matrix(&rotation_part(m));
    UnitQuaternion::from_rotation_matrix(&rotation)
}

fn compose_from_parts(rotation: &UnitQuaternion<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    Translation3::from(*translation).to_homogeneous() * rotation.to_homogeneous()
}

fn interpolate_rotation(
    from: &UnitQuaternion<f64>,
    to: &UnitQuaternion<f64>,
    t: f64,
) -> UnitQuaternion<f64> {
    // Antipodal rotations have no unique shortest arc; fall back to normalized lerp.
    from.try_slerp(to, t, 1.0e-9)
        .unwrap_or_else(|| from.nlerp(to, t))
}

/// Interpolates rotation (spherically) and translation (linearly) between two rigid transforms.
pub fn slerp(src: &Matrix4<f64>, tar: &Matrix4<f64>, t: f64) -> Matrix4<f64> {
    if t.abs() <= INTERPOLATION_EPSILON {
        return *src;
    }
    if (t - 1.0).abs() <= INTERPOLATION_EPSILON {
        return *tar;
    }
    let rotation = interpolate_rotation(&rotation_quaternion(src), &rotation_quaternion(tar), t);
    let translation = translation_part(src).lerp(&translation_part(tar), t);
    compose_from_parts(&rotation, &translation)
}

/// Transform that is the identity at `t = 0` and `m` at `t = 1`.
///
/// A rotation with a vanishing angle has no well-defined axis; in that case only the translation
/// is interpolated.
pub fn interpolate_from_identity(m: &Matrix4<f64>, t: f64) -> Matrix4<f64> {
    if t.abs() <= INTERPOLATION_EPSILON {
        return Matrix4::identity();
    }
    if (t - 1.0).abs() <= INTERPOLATION_EPSILON {
        return *m;
    }
    let translation = translation_part(m) * t;
    let rotation = match rotation_quaternion(m).axis_angle() {
        Some((axis, angle)) => UnitQuaternion::from_axis_angle(&axis, angle * t),
        None => UnitQuaternion::identity(),
    };
    compose_from_parts(&rotation, &translation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use std::f64::consts::FRAC_PI_2;

    fn rotation_z(angle: f64, translation: Vector3<f64>) -> Matrix4<f64> {
        let r = Rotation3::from_axis_angle(&Vector3::z_axis(), angle);
        from_rotation_translation(r.matrix(), &translation)
    }

    #[test]
    fn identity_is_detected_within_epsilon() {
        let mut m = Matrix4::identity();
        assert!(is_identity(&m, IDENTITY_EPSILON));
        m[(0, 3)] = 1e-3;
        assert!(!is_identity(&m, IDENTITY_EPSILON));
    }

    #[test]
    fn rigid_check_accepts_rotations_and_rejects_scaling() {
        let m = rotation_z(0.7, Vector3::new(1.0, 2.0, 3.0));
        assert!(is_rotation_and_translation(&m, RIGID_EPSILON));

        let mut scaled = m;
        scaled[(0, 0)] *= 1.1;
        assert!(!is_rotation_and_translation(&scaled, RIGID_EPSILON));

        let mirror = from_rotation_translation(
            &Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0)),
            &Vector3::zeros(),
        );
        assert!(!is_rotation_and_translation(&mirror, RIGID_EPSILON));
    }

    #[test]
    fn invert_reports_singular_matrices() {
        let singular = Matrix4::<f64>::zeros();
        assert_eq!(invert(&singular), Err(NumericError::Singular));

        let m = rotation_z(FRAC_PI_2, Vector3::new(0.0, 0.0, 5.0));
        let inverse = invert(&m).unwrap();
        assert!(is_identity(&(m * inverse), 1e-9));
    }

    #[test]
    fn slerp_returns_endpoints_and_midpoint() {
        let src = Matrix4::identity();
        let tar = rotation_z(FRAC_PI_2, Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(slerp(&src, &tar, 0.0), src);
        assert_eq!(slerp(&src, &tar, 1.0), tar);

        let mid = slerp(&src, &tar, 0.5);
        let p = mid.transform_point(&Point3::new(1.0, 0.0, 0.0));
        let expected_angle = FRAC_PI_2 / 2.0;
        assert!((p.x - (expected_angle.cos() + 1.0)).abs() < 1e-9);
        assert!((p.y - expected_angle.sin()).abs() < 1e-9);
    }

    #[test]
    fn interpolation_from_identity_is_stable_for_pure_translation() {
        let m = from_rotation_translation(&Matrix3::identity(), &Vector3::new(4.0, 0.0, 0.0));
        let half = interpolate_from_identity(&m, 0.5);
        assert!(half.iter().all(|v| v.is_finite()));
        assert!((half[(0, 3)] - 2.0).abs() < 1e-12);
        assert!(is_identity(&rotation_part(&half).to_homogeneous(), 1e-12));
    }
}
