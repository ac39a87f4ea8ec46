use super::error::SymmetryError;
use super::expression::{expand_operator_products, parse_operator_groups};
use super::operator::{Provenance, SymmetryOperator};
use nalgebra::Matrix4;
use std::collections::HashMap;
use std::sync::Arc;

/// Operator matrices keyed by their id in the operator list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorTable {
    matrices: HashMap<String, Matrix4<f64>>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, matrix: Matrix4<f64>) {
        self.matrices.insert(id.into(), matrix);
    }

    pub fn get(&self, id: &str) -> Option<&Matrix4<f64>> {
        self.matrices.get(id)
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

/// Operators applied to a subset of chains (all chains when `asym_ids` is `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorGroup {
    pub asym_ids: Option<Vec<String>>,
    pub operators: Vec<Arc<SymmetryOperator>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub id: String,
    pub details: String,
    pub operator_groups: Vec<OperatorGroup>,
}

/// One generator row: an operator expression applied to a list of chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyGenerator {
    pub expression: String,
    pub asym_ids: Option<Vec<String>>,
}

impl Assembly {
    /// Resolves every generator of an assembly against the operator table.
    ///
    /// Operators are numbered consecutively across generators, starting at 1.
    pub fn build(
        id: impl Into<String>,
        details: impl Into<String>,
        generators: &[AssemblyGenerator],
        table: &OperatorTable,
    ) -> Result<Self, SymmetryError> {
        let id = id.into();
        let mut next_index = 1;
        let mut operator_groups = Vec::with_capacity(generators.len());
        for generator in generators {
            let operators = build_operators(&id, &generator.expression, table, next_index)?;
            next_index += operators.len();
            operator_groups.push(OperatorGroup {
                asym_ids: generator.asym_ids.clone(),
                operators,
            });
        }
        Ok(Self {
            id,
            details: details.into(),
            operator_groups,
        })
    }

    pub fn operator_count(&self) -> usize {
        self.operator_groups.iter().map(|g| g.operators.len()).sum()
    }
}

/// Expands `expression` into operators. The matrix of a product `(a)(b)` is `M_a * M_b`, so the
/// rightmost operator is applied first.
pub fn build_operators(
    assembly_id: &str,
    expression: &str,
    table: &OperatorTable,
    start_index: usize,
) -> Result<Vec<Arc<SymmetryOperator>>, SymmetryError> {
    let groups = parse_operator_groups(expression)?;
    let products = expand_operator_products(&groups);
    let mut operators = Vec::with_capacity(products.len());
    for (offset, ids) in products.into_iter().enumerate() {
        let mut matrix = Matrix4::identity();
        for op_id in &ids {
            let m = table.get(op_id).ok_or_else(|| SymmetryError::UndefinedOperator {
                assembly: assembly_id.to_string(),
                id: op_id.clone(),
            })?;
            matrix *= m;
        }
        let oper_id = start_index + offset;
        let name = format!("ASM_{}", oper_id);
        let provenance = Provenance::assembly(assembly_id, oper_id, ids);
        operators.push(Arc::new(SymmetryOperator::create(name, matrix, provenance)));
    }
    Ok(operators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::transform::from_rotation_translation;
    use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

    fn two_fold_table() -> OperatorTable {
        let mut table = OperatorTable::new();
        table.insert("1", Matrix4::identity());
        let r = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI);
        table.insert("2", from_rotation_translation(r.matrix(), &Vector3::zeros()));
        table.insert(
            "3",
            from_rotation_translation(&Matrix3::identity(), &Vector3::new(10.0, 0.0, 0.0)),
        );
        table
    }

    #[test]
    fn simple_list_yields_one_operator_per_id() {
        let ops = build_operators("1", "(1,2)", &two_fold_table(), 1).unwrap();
        assert_eq!(ops.len(), 2);
        assert!(ops[0].is_identity());
        assert_eq!(ops[1].name(), "ASM_2");
        assert_eq!(ops[1].suffix(), "_2");
        let p = ops[1].apply(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn products_compose_left_to_right_as_matrices() {
        let ops = build_operators("1", "(3)(2)", &two_fold_table(), 1).unwrap();
        assert_eq!(ops.len(), 1);
        let p = ops[0].apply(&Point3::new(1.0, 0.0, 0.0));
        // Rotate first, then translate.
        assert!((p - Point3::new(9.0, 0.0, 0.0)).norm() < 1e-9);
        let assembly = &ops[0].provenance().assembly;
        assert_eq!(assembly.as_ref().map(|a| a.oper_list.clone()), Some(vec!["3".to_string(), "2".to_string()]));
    }

    #[test]
    fn undefined_operator_is_an_error() {
        let err = build_operators("A", "(1,9)", &two_fold_table(), 1).unwrap_err();
        assert_eq!(
            err,
            SymmetryError::UndefinedOperator {
                assembly: "A".into(),
                id: "9".into()
            }
        );
    }

    #[test]
    fn assembly_numbers_operators_across_generators() {
        let generators = vec![
            AssemblyGenerator {
                expression: "1,2".into(),
                asym_ids: Some(vec!["A".into()]),
            },
            AssemblyGenerator {
                expression: "3".into(),
                asym_ids: None,
            },
        ];
        let assembly = Assembly::build("1", "complete", &generators, &two_fold_table()).unwrap();
        assert_eq!(assembly.operator_count(), 3);
        assert_eq!(assembly.operator_groups[1].operators[0].name(), "ASM_3");
    }
}
