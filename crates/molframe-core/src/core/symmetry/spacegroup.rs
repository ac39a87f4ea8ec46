use super::error::SymmetryError;
use super::operator::{Provenance, SymmetryOperator};
use crate::core::math::transform;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Unit cell with the matrices converting between fractional and Cartesian coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacegroupCell {
    pub size: Vector3<f64>,
    /// Cell angles alpha, beta, gamma in radians.
    pub angles: Vector3<f64>,
    pub from_fractional: Matrix4<f64>,
    pub to_fractional: Matrix4<f64>,
}

impl SpacegroupCell {
    /// Builds a cell with `a` along x and `b` in the xy plane.
    pub fn new(size: Vector3<f64>, angles_degrees: Vector3<f64>) -> Result<Self, SymmetryError> {
        let angles = angles_degrees.map(f64::to_radians);
        let (ca, cb, cg) = (angles.x.cos(), angles.y.cos(), angles.z.cos());
        let sg = angles.z.sin();
        let volume_factor = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        if volume_factor <= 0.0 || sg.abs() < 1e-12 || size.iter().any(|&l| l <= 0.0) {
            return Err(SymmetryError::DegenerateCell);
        }
        let v = volume_factor.sqrt();

        #[rustfmt::skip]
        let rotation = Matrix3::new(
            size.x, size.y * cg, size.z * cb,
            0.0,    size.y * sg, size.z * (ca - cb * cg) / sg,
            0.0,    0.0,         size.z * v / sg,
        );
        let from_fractional = transform::from_rotation_translation(&rotation, &Vector3::zeros());
        let to_fractional =
            transform::invert(&from_fractional).map_err(|_| SymmetryError::DegenerateCell)?;
        Ok(Self {
            size,
            angles,
            from_fractional,
            to_fractional,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spacegroup {
    pub name: String,
    pub cell: SpacegroupCell,
    /// Operations in fractional coordinates.
    pub operators: Vec<Matrix4<f64>>,
}

impl Spacegroup {
    pub fn new(
        name: impl Into<String>,
        cell: SpacegroupCell,
        symops: &[&str],
    ) -> Result<Self, SymmetryError> {
        let operators = symops
            .iter()
            .map(|s| parse_symop(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            cell,
            operators,
        })
    }

    /// Cartesian operator for operation `index` shifted by `(i, j, k)` cells.
    pub fn operator(&self, index: usize, i: i32, j: i32, k: i32) -> SymmetryOperator {
        let hkl = Vector3::new(i, j, k);
        self.build(index, hkl)
    }

    /// Like [`Self::operator`], but first shifts the operation so that `reference` (Cartesian)
    /// maps into the unit cell at the origin.
    pub fn operator_ref(
        &self,
        index: usize,
        i: i32,
        j: i32,
        k: i32,
        reference: &Point3<f64>,
    ) -> SymmetryOperator {
        let fractional = self.cell.to_fractional.transform_point(reference);
        let mapped = self.operators[index].transform_point(&fractional);
        let hkl = Vector3::new(
            i - mapped.x.floor() as i32,
            j - mapped.y.floor() as i32,
            k - mapped.z.floor() as i32,
        );
        self.build(index, hkl)
    }

    fn build(&self, index: usize, hkl: Vector3<i32>) -> SymmetryOperator {
        let shift = transform::from_rotation_translation(&Matrix3::identity(), &hkl.cast::<f64>());
        let matrix =
            self.cell.from_fractional * shift * self.operators[index] * self.cell.to_fractional;
        let name = format!("{}_{}{}{}", index + 1, 5 + hkl.x, 5 + hkl.y, 5 + hkl.z);
        SymmetryOperator::create(name, matrix, Provenance::spacegroup(index, hkl))
    }
}

/// Parses a symmetry operation in `x,y,z` notation (e.g. `-x+1/2,y,-z+1/3`) into a fractional
/// 4×4 matrix.
pub fn parse_symop(symop: &str) -> Result<Matrix4<f64>, SymmetryError> {
    let invalid = || SymmetryError::InvalidSymop(symop.to_string());
    let cleaned: String = symop
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
        .collect::<String>()
        .to_lowercase();
    let components: Vec<&str> = cleaned.split(',').collect();
    if components.len() != 3 {
        return Err(invalid());
    }

    let mut m = Matrix4::zeros();
    m[(3, 3)] = 1.0;
    for (row, component) in components.iter().enumerate() {
        let (coefficients, offset) = parse_component(component).ok_or_else(invalid)?;
        for (col, c) in coefficients.iter().enumerate() {
            m[(row, col)] = *c;
        }
        m[(row, 3)] = offset;
    }
    Ok(m)
}

fn axis_of(c: char) -> Option<usize> {
    match c {
        'x' => Some(0),
        'y' => Some(1),
        'z' => Some(2),
        _ => None,
    }
}

fn parse_component(component: &str) -> Option<([f64; 3], f64)> {
    let chars: Vec<char> = component.chars().collect();
    if chars.is_empty() {
        return None;
    }
    let mut coefficients = [0.0; 3];
    let mut offset = 0.0;
    let mut i = 0;
    while i < chars.len() {
        let mut sign = 1.0;
        if chars[i] == '+' || chars[i] == '-' {
            if chars[i] == '-' {
                sign = -1.0;
            }
            i += 1;
        }
        if i >= chars.len() {
            return None;
        }
        if let Some(axis) = axis_of(chars[i]) {
            coefficients[axis] += sign;
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
            i += 1;
        }
        if start == i {
            return None;
        }
        let mut value: f64 = chars[start..i].iter().collect::<String>().parse().ok()?;
        if i < chars.len() && chars[i] == '/' {
            i += 1;
            let denominator_start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let denominator: f64 = chars[denominator_start..i]
                .iter()
                .collect::<String>()
                .parse()
                .ok()?;
            if denominator == 0.0 {
                return None;
            }
            value /= denominator;
        }
        if i < chars.len() && chars[i] == '*' {
            i += 1;
        }
        match chars.get(i).copied().and_then(axis_of) {
            Some(axis) => {
                coefficients[axis] += sign * value;
                i += 1;
            }
            None => offset += sign * value,
        }
    }
    Some((coefficients, offset))
}
