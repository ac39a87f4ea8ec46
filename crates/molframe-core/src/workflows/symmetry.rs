use crate::core::model::{Model, ModelError};
use crate::core::symmetry::ModelSymmetry;
use crate::core::symmetry::operator::{DEFAULT_OPERATOR_NAME, Provenance, SymmetryOperator};
use crate::core::symmetry::spacegroup::Spacegroup;
use crate::engine::config::SymmetryMatesConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::structure::{Structure, StructureBuilder, Unit};
use crate::engine::task::{Outcome, RuntimeContext, run_chunked};
use crate::query::context::{QueryContext, element_test};
use crate::query::generators::{AtomsQuery, atoms};
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn single_model(structure: &Structure) -> Result<&Arc<Model>, EngineError> {
    match structure.models() {
        [model] => Ok(model),
        models => Err(EngineError::NotSingleModel(models.len())),
    }
}

/// Units of `structure` placed by the identity operator and, when given, belonging to one of
/// the listed chains.
fn identity_units(structure: &Arc<Structure>, asym_ids: Option<&[String]>) -> Vec<Arc<Unit>> {
    let asym_ids: Option<HashSet<String>> = asym_ids.map(|ids| ids.iter().cloned().collect());
    let test = element_test(move |l| {
        l.unit.operator().is_identity()
            && asym_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(l.label_asym_id()))
    });
    let mut ctx = QueryContext::new(structure.clone());
    let selection = ctx.run(&atoms(AtomsQuery::new().chain_test(test)));
    selection.union_structure().units().to_vec()
}

/// Builds the biological assembly `id` of a single-model structure. Every operator of a group
/// is applied to every selected unit, so copies of one unit share its invariant id.
#[instrument(skip_all, name = "build_assembly", fields(assembly = id))]
pub fn build_assembly(structure: &Arc<Structure>, id: &str) -> Result<Structure, EngineError> {
    let model = single_model(structure)?;
    let assembly = model
        .symmetry
        .assembly(id)
        .ok_or_else(|| ModelError::UnknownAssembly(id.to_string()))?;

    let mut builder = StructureBuilder::new();
    for group in &assembly.operator_groups {
        let units = identity_units(structure, group.asym_ids.as_deref());
        if units.is_empty() {
            debug!(chains = ?group.asym_ids, "Operator group selects no units.");
            continue;
        }
        for operator in &group.operators {
            for unit in &units {
                builder.add_with_operator(unit, operator.clone(), false);
            }
        }
    }
    info!(
        operators = assembly.operator_count(),
        units = builder.len(),
        "Assembly built."
    );
    Ok(builder.build())
}

/// Copies of every unit under the identity and each NCS operator. A structure without NCS
/// operators is returned as a plain copy.
#[instrument(skip_all, name = "build_ncs")]
pub fn build_ncs(structure: &Arc<Structure>) -> Result<Structure, EngineError> {
    let model = single_model(structure)?;
    let ncs = &model.symmetry.ncs_operators;
    if ncs.is_empty() {
        debug!("No NCS operators defined.");
        return Ok(Structure::new(structure.units().to_vec()));
    }
    let mut operators = Vec::with_capacity(ncs.len() + 1);
    operators.push(Arc::new(SymmetryOperator::identity(DEFAULT_OPERATOR_NAME)));
    operators.extend(ncs.iter().cloned());
    Ok(assemble_operators(structure, &operators))
}

/// Crystal copies for every space-group operation shifted by each cell offset in
/// `ijk_min..=ijk_max`.
#[instrument(skip_all, name = "build_symmetry_range")]
pub fn build_symmetry_range(
    structure: &Arc<Structure>,
    ijk_min: Vector3<i32>,
    ijk_max: Vector3<i32>,
) -> Result<Structure, EngineError> {
    let model = single_model(structure)?;
    let spacegroup = spacegroup_of(&model.symmetry)?;
    let reference = structure.boundary().sphere.center;
    let operators = operators_for_range(spacegroup, &model.symmetry, ijk_min, ijk_max, &reference);
    info!(operators = operators.len(), "Applying crystal symmetry.");
    Ok(assemble_operators(structure, &operators))
}

/// Crystal copies of each unit whose bounding sphere comes within `config.radius` of the
/// original structure, searched over `config.cell_range` cells in every direction. Cancellation
/// is checked between chunks of operators.
#[instrument(skip_all, name = "find_symmetry_mates", fields(radius = config.radius))]
pub fn find_symmetry_mates<C>(
    structure: &Arc<Structure>,
    config: &SymmetryMatesConfig,
    ctx: &C,
) -> Result<Outcome<Structure>, EngineError>
where
    C: RuntimeContext + ?Sized,
{
    let model = single_model(structure)?;
    let spacegroup = spacegroup_of(&model.symmetry)?;
    if ctx
        .update(Progress::PhaseStart {
            name: "Symmetry Mates",
        })
        .is_err()
    {
        return Ok(Outcome::Cancelled);
    }

    let reference = structure.boundary().sphere.center;
    let range = Vector3::repeat(config.cell_range);
    let operators = operators_for_range(spacegroup, &model.symmetry, -range, range, &reference);
    debug!(operators = operators.len(), "Testing crystal operators.");

    let lookup = structure.lookup3d();
    let units = structure.units();
    let mut added: HashSet<(u32, String)> = HashSet::new();
    let mut builder = StructureBuilder::new();

    let outcome = run_chunked(ctx, operators.len(), config.chunk_size, |chunk| {
        for operator in &operators[chunk] {
            for unit in units {
                let sphere = unit.boundary().sphere;
                let center = operator.apply(&sphere.center);
                let reach = sphere.radius + config.radius;
                let close = lookup
                    .find_unit_indices(&center, reach)
                    .into_iter()
                    .any(|i| units[i].check(&center, reach));
                if close && added.insert((unit.invariant_id(), operator.name().to_string())) {
                    builder.add_with_operator(unit, operator.clone(), false);
                }
            }
        }
        Ok::<(), EngineError>(())
    })?;
    let _ = ctx.update(Progress::PhaseFinish);

    Ok(outcome.map(|()| {
        info!(units = builder.len(), "Symmetry mates found.");
        builder.build()
    }))
}

fn spacegroup_of(symmetry: &ModelSymmetry) -> Result<&Spacegroup, EngineError> {
    symmetry
        .spacegroup
        .as_ref()
        .ok_or_else(|| ModelError::MissingSymmetry.into())
}

fn assemble_operators(structure: &Structure, operators: &[Arc<SymmetryOperator>]) -> Structure {
    let mut builder = StructureBuilder::new();
    for operator in operators {
        for unit in structure.units() {
            builder.add_with_operator(unit, operator.clone(), false);
        }
    }
    builder.build()
}

/// Operation `index` shifted by `(i, j, k)` relative to the cell containing `reference`,
/// combined with each NCS operator when there are any.
fn operators_for_index(
    spacegroup: &Spacegroup,
    symmetry: &ModelSymmetry,
    index: usize,
    ijk: Vector3<i32>,
    reference: &Point3<f64>,
) -> Vec<Arc<SymmetryOperator>> {
    let symop = spacegroup.operator_ref(index, ijk.x, ijk.y, ijk.z, reference);
    if symmetry.ncs_operators.is_empty() {
        return vec![Arc::new(symop)];
    }
    let mut operators = Vec::with_capacity(symmetry.ncs_operators.len() + 1);
    operators.push(Arc::new(symop.clone()));
    for ncs in &symmetry.ncs_operators {
        let provenance = Provenance {
            ncs_id: ncs.provenance().ncs_id.clone(),
            ..symop.provenance().clone()
        };
        operators.push(Arc::new(SymmetryOperator::create(
            format!("{} {}", symop.name(), ncs.name()),
            symop.matrix() * ncs.matrix(),
            provenance,
        )));
    }
    operators
}

/// Without NCS operators and with the origin cell in range, the identity comes first.
fn operators_for_range(
    spacegroup: &Spacegroup,
    symmetry: &ModelSymmetry,
    ijk_min: Vector3<i32>,
    ijk_max: Vector3<i32>,
    reference: &Point3<f64>,
) -> Vec<Arc<SymmetryOperator>> {
    let identity_first = symmetry.ncs_operators.is_empty()
        && (0..3).all(|d| ijk_min[d] <= 0 && ijk_max[d] >= 0);
    let mut operators = Vec::new();
    if identity_first {
        operators.push(Arc::new(spacegroup.operator(0, 0, 0, 0)));
    }
    for index in 0..spacegroup.operators.len() {
        for i in ijk_min.x..=ijk_max.x {
            for j in ijk_min.y..=ijk_max.y {
                for k in ijk_min.z..=ijk_max.z {
                    if identity_first && index == 0 && i == 0 && j == 0 && k == 0 {
                        continue;
                    }
                    let ijk = Vector3::new(i, j, k);
                    operators.extend(operators_for_index(
                        spacegroup, symmetry, index, ijk, reference,
                    ));
                }
            }
        }
    }
    operators
}
