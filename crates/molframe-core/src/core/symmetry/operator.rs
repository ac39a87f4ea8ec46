use crate::core::math::transform::{
    self, IDENTITY_EPSILON, RIGID_EPSILON, from_rotation_translation,
};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use tracing::warn;

pub const DEFAULT_OPERATOR_NAME: &str = "1_555";

/// Assembly that generated an operator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssemblyOrigin {
    pub id: String,
    pub oper_id: usize,
    pub oper_list: Vec<String>,
}

/// Where an operator came from. All tags are optional and may be combined.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provenance {
    pub assembly: Option<AssemblyOrigin>,
    pub spacegroup_op: Option<usize>,
    pub hkl: Option<Vector3<i32>>,
    pub ncs_id: Option<String>,
    /// Numeric key used by index-pair connectivity records to constrain bonds to an operator.
    pub key: Option<i32>,
}

impl Provenance {
    pub fn assembly(id: impl Into<String>, oper_id: usize, oper_list: Vec<String>) -> Self {
        Self {
            assembly: Some(AssemblyOrigin {
                id: id.into(),
                oper_id,
                oper_list,
            }),
            ..Default::default()
        }
    }

    pub fn spacegroup(op: usize, hkl: Vector3<i32>) -> Self {
        Self {
            spacegroup_op: Some(op),
            hkl: Some(hkl),
            ..Default::default()
        }
    }

    pub fn ncs(id: impl Into<String>) -> Self {
        Self {
            ncs_id: Some(id.into()),
            ..Default::default()
        }
    }
}

/// A named rigid transform with its inverse and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperator {
    name: String,
    matrix: Matrix4<f64>,
    inverse: Matrix4<f64>,
    is_identity: bool,
    provenance: Provenance,
    suffix: String,
}

impl Default for SymmetryOperator {
    fn default() -> Self {
        Self::identity(DEFAULT_OPERATOR_NAME)
    }
}

impl SymmetryOperator {
    pub fn identity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
            is_identity: true,
            provenance: Provenance::default(),
            suffix: String::new(),
        }
    }

    /// Creates an operator, validating the matrix.
    ///
    /// Matrices that fail the rigid-transform check are kept but logged. A singular matrix cannot
    /// be inverted; its inverse falls back to the identity with a warning.
    pub fn create(name: impl Into<String>, matrix: Matrix4<f64>, provenance: Provenance) -> Self {
        let name = name.into();
        if transform::is_identity(&matrix, IDENTITY_EPSILON) {
            let suffix = suffix_for(&provenance, true);
            return Self {
                name,
                matrix: Matrix4::identity(),
                inverse: Matrix4::identity(),
                is_identity: true,
                provenance,
                suffix,
            };
        }
        if !transform::is_rotation_and_translation(&matrix, RIGID_EPSILON) {
            warn!(
                "Symmetry operator '{}' is not a rotation + translation; coordinates may be distorted.",
                name
            );
        }
        let inverse = transform::invert(&matrix).unwrap_or_else(|e| {
            warn!("Symmetry operator '{}' has no inverse ({}); using identity.", name, e);
            Matrix4::identity()
        });
        let suffix = suffix_for(&provenance, false);
        Self {
            name,
            matrix,
            inverse,
            is_identity: false,
            provenance,
            suffix,
        }
    }

    pub fn of_rotation_and_offset(
        name: impl Into<String>,
        rotation: &Matrix3<f64>,
        offset: &Vector3<f64>,
        provenance: Provenance,
    ) -> Self {
        Self::create(name, from_rotation_translation(rotation, offset), provenance)
    }

    /// Operator that applies `first` and then `second`. Name and provenance come from `second`.
    pub fn compose(first: &SymmetryOperator, second: &SymmetryOperator) -> Self {
        let matrix = second.matrix * first.matrix;
        let mut composed = Self::create(second.name.clone(), matrix, second.provenance.clone());
        composed.suffix = second.suffix.clone();
        composed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn inverse(&self) -> &Matrix4<f64> {
        &self.inverse
    }

    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Label appended to chain names of units carrying this operator, e.g. `_2` or `-3_565`.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn key(&self) -> Option<i32> {
        self.provenance.key
    }

    pub fn with_key(mut self, key: i32) -> Self {
        self.provenance.key = Some(key);
        self
    }

    #[inline]
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        if self.is_identity {
            *p
        } else {
            self.matrix.transform_point(p)
        }
    }

    #[inline]
    pub fn apply_inverse(&self, p: &Point3<f64>) -> Point3<f64> {
        if self.is_identity {
            *p
        } else {
            self.inverse.transform_point(p)
        }
    }

    /// Transform running from the identity (`t = 0`) to this operator (`t = 1`).
    pub fn interpolate_from_identity(&self, t: f64) -> Matrix4<f64> {
        if self.is_identity {
            return Matrix4::identity();
        }
        transform::interpolate_from_identity(&self.matrix, t)
    }

    pub fn slerp(&self, target: &SymmetryOperator, t: f64) -> Matrix4<f64> {
        transform::slerp(&self.matrix, &target.matrix, t)
    }
}

fn suffix_for(provenance: &Provenance, is_identity: bool) -> String {
    if let Some(assembly) = &provenance.assembly {
        if is_identity {
            return String::new();
        }
        return format!("_{}", assembly.oper_id);
    }
    if let (Some(op), Some(hkl)) = (provenance.spacegroup_op, provenance.hkl) {
        return format!("-{}_{}{}{}", op + 1, 5 + hkl.x, 5 + hkl.y, 5 + hkl.z);
    }
    if let Some(ncs) = &provenance.ncs_id {
        return format!("_{}", ncs);
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn operator(name: &str, axis: Vector3<f64>, angle: f64, shift: Vector3<f64>) -> SymmetryOperator {
        let r = Rotation3::from_axis_angle(&nalgebra::Unit::new_normalize(axis), angle);
        SymmetryOperator::of_rotation_and_offset(name, r.matrix(), &shift, Provenance::default())
    }

    #[test]
    fn identity_matrix_is_flagged() {
        let op = SymmetryOperator::create("1", Matrix4::identity(), Provenance::default());
        assert!(op.is_identity());
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(op.apply(&p), p);
        assert_eq!(SymmetryOperator::default().name(), DEFAULT_OPERATOR_NAME);
    }

    #[test]
    fn matrix_times_inverse_is_identity() {
        let op = operator("2", Vector3::new(1.0, 1.0, 0.0), 1.2, Vector3::new(3.0, -1.0, 2.0));
        let product = op.matrix() * op.inverse();
        assert!(transform::is_identity(&product, 1e-9));
        let p = Point3::new(0.4, -7.0, 2.5);
        assert!((op.apply_inverse(&op.apply(&p)) - p).norm() < 1e-9);
    }

    #[test]
    fn compose_applies_first_then_second_and_keeps_second_provenance() {
        let a = operator("a", Vector3::z(), 0.5, Vector3::new(1.0, 0.0, 0.0));
        let b = SymmetryOperator::of_rotation_and_offset(
            "b",
            &Matrix3::identity(),
            &Vector3::new(0.0, 3.0, 0.0),
            Provenance::ncs("7"),
        );
        let ab = SymmetryOperator::compose(&a, &b);
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!((ab.apply(&p) - b.apply(&a.apply(&p))).norm() < 1e-12);
        assert_eq!(ab.name(), "b");
        assert_eq!(ab.provenance().ncs_id.as_deref(), Some("7"));
        assert_eq!(ab.suffix(), "_7");

        let ba = SymmetryOperator::compose(&b, &a);
        assert!((ba.apply(&p) - ab.apply(&p)).norm() > 1e-3);
    }

    #[test]
    fn composition_is_associative_on_points() {
        let a = operator("a", Vector3::x(), 0.3, Vector3::new(1.0, 2.0, 0.0));
        let b = operator("b", Vector3::y(), -1.1, Vector3::new(0.0, 0.5, 4.0));
        let c = operator("c", Vector3::new(1.0, 2.0, 3.0), 2.2, Vector3::new(-3.0, 0.0, 1.0));
        let left = SymmetryOperator::compose(&SymmetryOperator::compose(&a, &b), &c);
        let right = SymmetryOperator::compose(&a, &SymmetryOperator::compose(&b, &c));
        for p in [Point3::origin(), Point3::new(5.0, -2.0, 9.0), Point3::new(-1.0, 0.3, 0.7)] {
            assert!((left.apply(&p) - right.apply(&p)).norm() < 1e-9);
        }
    }

    #[test]
    fn suffixes_follow_provenance() {
        let m = operator("x", Vector3::z(), 1.0, Vector3::zeros()).matrix;
        let asm = SymmetryOperator::create("ASM_2", m, Provenance::assembly("1", 2, vec!["2".into()]));
        assert_eq!(asm.suffix(), "_2");
        let asm_identity = SymmetryOperator::create(
            "ASM_1",
            Matrix4::identity(),
            Provenance::assembly("1", 1, vec!["1".into()]),
        );
        assert_eq!(asm_identity.suffix(), "");
        let sg = SymmetryOperator::create("3_565", m, Provenance::spacegroup(2, Vector3::new(0, 1, 0)));
        assert_eq!(sg.suffix(), "-3_565");
    }

    #[test]
    fn singular_matrix_falls_back_to_identity_inverse() {
        let mut m = Matrix4::identity();
        m[(0, 0)] = 0.0;
        let op = SymmetryOperator::create("bad", m, Provenance::default());
        assert!(!op.is_identity());
        assert_eq!(*op.inverse(), Matrix4::identity());
    }

    #[test]
    fn interpolation_endpoints_match_identity_and_operator() {
        let op = operator("r", Vector3::z(), 1.0, Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(op.interpolate_from_identity(0.0), Matrix4::identity());
        assert_eq!(op.interpolate_from_identity(1.0), *op.matrix());
        let other = operator("s", Vector3::z(), 2.0, Vector3::zeros());
        assert_eq!(op.slerp(&other, 1.0), *other.matrix());
    }
}
