use super::coarse::{CoarseElements, CoarseKind};
use super::connectivity::{
    ComponentBond, ComponentBondTable, IndexPairBond, IndexPairBonds, Partner, StructConn,
    StructConnEntry,
};
use super::entities::Entities;
use super::hierarchy::{AtomicHierarchy, Conformation, normalize_element};
use super::topology::{BondFlags, BondOrder};
use super::{Model, ModelError, ModelParts};
use crate::core::collections::segmentation::Segmentation;
use crate::core::io::{CategorySource, Column, Table};
use crate::core::symmetry::ModelSymmetry;
use crate::core::symmetry::assembly::{Assembly, AssemblyGenerator, OperatorTable};
use crate::core::symmetry::operator::{DEFAULT_OPERATOR_NAME, Provenance, SymmetryOperator};
use crate::core::symmetry::spacegroup::{Spacegroup, SpacegroupCell};
use nalgebra::{Matrix4, Point3, Vector3};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds one [`Model`] per `atom_site.pdbx_PDB_model_num` block.
///
/// Symmetry, dictionary and entity categories are shared by all models. Connectivity records are
/// resolved against each model's own atoms.
pub fn build_models(source: &dyn CategorySource, label: &str) -> Result<Vec<Model>, ModelError> {
    let symmetry = read_symmetry(source)?;
    let component_bonds = read_component_bonds(source)?;
    let entities = read_entities(source)?;

    let blocks = match source.category("atom_site") {
        Some(atom_site) => model_blocks(atom_site)?,
        None => Vec::new(),
    };
    let has_coarse = source.category("ihm_sphere_obj_site").is_some()
        || source.category("ihm_gaussian_obj_site").is_some();
    if blocks.is_empty() && !has_coarse {
        return Err(ModelError::Empty);
    }

    let model_nums: Vec<i64> = if blocks.is_empty() {
        vec![1]
    } else {
        blocks.iter().map(|(num, _)| *num).collect()
    };

    let mut models = Vec::with_capacity(model_nums.len());
    for (i, model_num) in model_nums.into_iter().enumerate() {
        let (atomic, positions) = match (source.category("atom_site"), blocks.get(i)) {
            (Some(atom_site), Some((_, rows))) => read_atomic(atom_site, rows.clone())?,
            _ => (AtomicHierarchy::default(), Vec::new()),
        };
        let struct_conn = read_struct_conn(source, &atomic)?;
        let index_pair_bonds = read_index_pair_bonds(source, &atomic)?;
        let spheres = read_coarse(source, CoarseKind::Spheres, model_num)?;
        let gaussians = read_coarse(source, CoarseKind::Gaussians, model_num)?;

        let model = Model::new(ModelParts {
            label: label.to_string(),
            model_num,
            atomic,
            positions,
            spheres,
            gaussians,
            entities: entities.clone(),
            struct_conn,
            index_pair_bonds,
            component_bonds: component_bonds.clone(),
            symmetry: symmetry.clone(),
        })?;
        info!(
            "Built model {} of '{}': {} atoms, {} residues, {} chains.",
            model_num,
            label,
            model.atom_count(),
            model.atomic.residue_count(),
            model.atomic.chain_count()
        );
        models.push(model);
    }
    Ok(models)
}

fn column_or<'a>(table: &'a Table, primary: &'a str, fallback: &'a str) -> Column<'a> {
    if table.has_field(primary) {
        table.column(primary)
    } else {
        table.column(fallback)
    }
}

fn model_blocks(atom_site: &Table) -> Result<Vec<(i64, Range<usize>)>, ModelError> {
    let model_num = atom_site.column("pdbx_PDB_model_num");
    let mut blocks: Vec<(i64, Range<usize>)> = Vec::new();
    for row in 0..atom_site.row_count() {
        let num = model_num.int(row)?.unwrap_or(1);
        match blocks.last_mut() {
            Some((current, rows)) if *current == num => rows.end = row + 1,
            _ => blocks.push((num, row..row + 1)),
        }
    }
    Ok(blocks)
}

fn read_atomic(
    atom_site: &Table,
    rows: Range<usize>,
) -> Result<(AtomicHierarchy, Vec<Point3<f64>>), ModelError> {
    let x = atom_site.require_column("Cartn_x")?;
    let y = atom_site.require_column("Cartn_y")?;
    let z = atom_site.require_column("Cartn_z")?;
    let asym = atom_site.require_column("label_asym_id")?;
    let id = atom_site.column("id");
    let type_symbol = atom_site.column("type_symbol");
    let atom_name = column_or(atom_site, "label_atom_id", "auth_atom_id");
    let alt = atom_site.column("label_alt_id");
    let comp = column_or(atom_site, "label_comp_id", "auth_comp_id");
    let label_seq = atom_site.column("label_seq_id");
    let auth_seq = atom_site.column("auth_seq_id");
    let ins = atom_site.column("pdbx_PDB_ins_code");
    let auth_asym = atom_site.column("auth_asym_id");
    let entity = atom_site.column("label_entity_id");

    let mut h = AtomicHierarchy::default();
    let mut positions = Vec::with_capacity(rows.len());
    let mut residue_offsets = vec![];
    let mut chain_offsets = vec![];
    let mut previous_residue: Option<(&str, Option<i64>, Option<i64>, &str, &str)> = None;

    for (atom, row) in rows.enumerate() {
        let asym_id = asym.str(row);
        let residue_key = (
            asym_id,
            label_seq.int(row)?,
            auth_seq.int(row)?,
            ins.str(row),
            comp.str(row),
        );

        let new_chain = previous_residue.is_none_or(|p| p.0 != asym_id);
        if new_chain {
            chain_offsets.push(atom);
            h.chains.label_asym_id.push(asym_id.to_string());
            let auth = if auth_asym.is_defined(row) { auth_asym.str(row) } else { asym_id };
            h.chains.auth_asym_id.push(auth.to_string());
            h.chains.label_entity_id.push(entity.str(row).to_string());
        }
        if new_chain || previous_residue != Some(residue_key) {
            residue_offsets.push(atom);
            h.residues.label_comp_id.push(residue_key.4.to_string());
            h.residues.label_seq_id.push(residue_key.1);
            h.residues.auth_seq_id.push(residue_key.2);
            h.residues.ins_code.push(residue_key.3.to_string());
            h.residue_chain.push(chain_offsets.len() - 1);
        }
        previous_residue = Some(residue_key);

        let name = atom_name.str(row);
        h.atoms.source_id.push(id.str(row).to_string());
        h.atoms.label_atom_id.push(name.to_string());
        h.atoms.label_alt_id.push(alt.str(row).to_string());
        h.atoms.type_symbol.push(normalize_element(type_symbol.str(row), name));
        positions.push(Point3::new(
            x.required_float(row)?,
            y.required_float(row)?,
            z.required_float(row)?,
        ));
    }

    let atom_count = positions.len();
    if atom_count > 0 {
        residue_offsets.push(atom_count);
        chain_offsets.push(atom_count);
    }
    h.residue_segments = Segmentation::from_offsets(residue_offsets);
    h.chain_segments = Segmentation::from_offsets(chain_offsets);
    Ok((h, positions))
}

/// Resolves `(asym, seq, atom name, alt)` references to atom indices.
struct AtomResolver<'a> {
    hierarchy: &'a AtomicHierarchy,
    index: HashMap<(&'a str, Option<i64>, &'a str), Vec<usize>>,
}

impl<'a> AtomResolver<'a> {
    fn new(hierarchy: &'a AtomicHierarchy) -> Self {
        let mut index: HashMap<(&str, Option<i64>, &str), Vec<usize>> = HashMap::new();
        for atom in 0..hierarchy.atom_count() {
            let residue = hierarchy.residue_index(atom);
            let key = (
                hierarchy.label_asym_id(atom),
                hierarchy.residues.seq_id(residue),
                hierarchy.atom_name(atom),
            );
            index.entry(key).or_default().push(atom);
        }
        Self { hierarchy, index }
    }

    fn resolve(&self, asym: &str, seq: Option<i64>, atom: &str, alt: &str) -> Option<usize> {
        let candidates = self.index.get(&(asym, seq, atom))?;
        if !alt.is_empty() {
            if let Some(&found) = candidates
                .iter()
                .find(|&&c| self.hierarchy.alt_id(c) == alt)
            {
                return Some(found);
            }
        }
        candidates.first().copied()
    }
}

fn read_struct_conn(
    source: &dyn CategorySource,
    hierarchy: &AtomicHierarchy,
) -> Result<StructConn, ModelError> {
    let Some(table) = source.category("struct_conn") else {
        return Ok(StructConn::default());
    };
    let resolver = AtomResolver::new(hierarchy);
    let conn_type = table.column("conn_type_id");
    let order = table.column("pdbx_value_order");

    let partner = |n: u8, row: usize| -> Result<Option<Partner>, ModelError> {
        let field = |name: &str| format!("ptnr{}_{}", n, name);
        let asym_field = field("label_asym_id");
        let label_seq_field = field("label_seq_id");
        let auth_seq_field = field("auth_seq_id");
        let atom_field = field("label_atom_id");
        let alt_field = format!("pdbx_ptnr{}_label_alt_id", n);
        let symmetry_field = field("symmetry");

        let seq = match table.column(&label_seq_field).int(row)? {
            Some(s) => Some(s),
            None => table.column(&auth_seq_field).int(row)?,
        };
        let atom = resolver.resolve(
            table.column(&asym_field).str(row),
            seq,
            table.column(&atom_field).str(row),
            table.column(&alt_field).str(row),
        );
        let symmetry = match table.column(&symmetry_field).str(row) {
            "" => DEFAULT_OPERATOR_NAME.to_string(),
            s => s.to_string(),
        };
        Ok(atom.map(|atom| Partner { atom, symmetry }))
    };

    let mut entries = Vec::new();
    for row in 0..table.row_count() {
        let (Some(partner_a), Some(partner_b)) = (partner(1, row)?, partner(2, row)?) else {
            debug!("Skipping struct_conn row {}: partner atom not found.", row);
            continue;
        };
        let flags = BondFlags::from_conn_type(conn_type.str(row));
        let order = order.str(row).parse::<BondOrder>().unwrap_or_default();
        entries.push(StructConnEntry {
            row,
            partner_a,
            partner_b,
            // Explicit records never describe aromatic bonds.
            flags: if flags.is_covalent() { flags | BondFlags::NON_AROMATIC } else { flags },
            order,
        });
    }
    Ok(StructConn::new(entries))
}

fn read_index_pair_bonds(
    source: &dyn CategorySource,
    hierarchy: &AtomicHierarchy,
) -> Result<Option<IndexPairBonds>, ModelError> {
    let Some(table) = source.category("index_pair_bond") else {
        return Ok(None);
    };
    let by_source_id: HashMap<&str, usize> = hierarchy
        .atoms
        .source_id
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let atom_a = table.require_column("atom_id_1")?;
    let atom_b = table.require_column("atom_id_2")?;
    let order = table.column("value_order");
    let distance = table.column("distance");
    let kind = table.column("type_id");
    let op_a = table.column("operator_1");
    let op_b = table.column("operator_2");

    let mut bonds = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let (Some(&a), Some(&b)) = (
            by_source_id.get(atom_a.str(row)),
            by_source_id.get(atom_b.str(row)),
        ) else {
            continue;
        };
        let flags = if kind.is_defined(row) {
            BondFlags::from_conn_type(kind.str(row))
        } else {
            BondFlags::COVALENT
        };
        bonds.push(IndexPairBond {
            a,
            b,
            order: order.str(row).parse().unwrap_or_default(),
            flags,
            distance: distance.float(row)?,
            operator_a: op_a.int(row)?.map(|v| v as i32),
            operator_b: op_b.int(row)?.map(|v| v as i32),
        });
    }
    Ok(Some(IndexPairBonds::new(bonds)))
}

fn read_component_bonds(source: &dyn CategorySource) -> Result<ComponentBondTable, ModelError> {
    let mut table = ComponentBondTable::new();
    let Some(rows) = source.category("chem_comp_bond") else {
        return Ok(table);
    };
    let comp = rows.require_column("comp_id")?;
    let a = rows.require_column("atom_id_1")?;
    let b = rows.require_column("atom_id_2")?;
    let order = rows.column("value_order");
    let aromatic = rows.column("pdbx_aromatic_flag");
    for row in 0..rows.row_count() {
        let mut flags = BondFlags::COVALENT;
        match aromatic.str(row) {
            "Y" | "y" => flags |= BondFlags::AROMATIC,
            "N" | "n" => flags |= BondFlags::NON_AROMATIC,
            _ => {}
        }
        let order: BondOrder = order.str(row).parse().unwrap_or_default();
        table.add(
            comp.str(row),
            a.str(row),
            b.str(row),
            ComponentBond {
                order,
                flags,
                key: row as i32,
            },
        );
    }
    Ok(table)
}

fn read_entities(source: &dyn CategorySource) -> Result<Entities, ModelError> {
    let Some(table) = source.category("entity_poly_seq") else {
        return Ok(Entities::default());
    };
    let entity = table.column("entity_id");
    let num = table.column("num");
    let mon = table.column("mon_id");
    let mut rows = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        if let Some(n) = num.int(row)? {
            rows.push((entity.str(row), n, mon.str(row)));
        }
    }
    Ok(Entities::from_sequence(rows))
}

fn read_matrix(table: &Table, row: usize) -> Result<Matrix4<f64>, ModelError> {
    let mut m = Matrix4::identity();
    for i in 0..3 {
        for j in 0..3 {
            let field = format!("matrix[{}][{}]", i + 1, j + 1);
            m[(i, j)] = table.column(&field).float_or(row, if i == j { 1.0 } else { 0.0 })?;
        }
        let field = format!("vector[{}]", i + 1);
        m[(i, 3)] = table.column(&field).float_or(row, 0.0)?;
    }
    Ok(m)
}

fn read_symmetry(source: &dyn CategorySource) -> Result<ModelSymmetry, ModelError> {
    Ok(ModelSymmetry {
        assemblies: read_assemblies(source)?,
        spacegroup: read_spacegroup(source)?,
        ncs_operators: read_ncs(source)?,
    })
}

fn read_assemblies(source: &dyn CategorySource) -> Result<Vec<Assembly>, ModelError> {
    let Some(gen_table) = source.category("pdbx_struct_assembly_gen") else {
        return Ok(Vec::new());
    };

    let mut operators = OperatorTable::new();
    if let Some(oper_list) = source.category("pdbx_struct_oper_list") {
        let id = oper_list.require_column("id")?;
        for row in 0..oper_list.row_count() {
            operators.insert(id.str(row), read_matrix(oper_list, row)?);
        }
    }

    let assembly_id = gen_table.require_column("assembly_id")?;
    let expression = gen_table.require_column("oper_expression")?;
    let asym_list = gen_table.column("asym_id_list");

    let mut order: Vec<String> = Vec::new();
    let mut details: HashMap<String, String> = HashMap::new();
    if let Some(assembly_table) = source.category("pdbx_struct_assembly") {
        let id = assembly_table.require_column("id")?;
        let detail = assembly_table.column("details");
        for row in 0..assembly_table.row_count() {
            order.push(id.str(row).to_string());
            details.insert(id.str(row).to_string(), detail.str(row).to_string());
        }
    }

    let mut generators: HashMap<String, Vec<AssemblyGenerator>> = HashMap::new();
    for row in 0..gen_table.row_count() {
        let id = assembly_id.str(row).to_string();
        if !order.contains(&id) {
            order.push(id.clone());
        }
        let asym_ids = asym_list.is_defined(row).then(|| {
            asym_list
                .str(row)
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });
        generators.entry(id).or_default().push(AssemblyGenerator {
            expression: expression.str(row).to_string(),
            asym_ids,
        });
    }

    let mut assemblies = Vec::with_capacity(order.len());
    for id in order {
        let Some(gens) = generators.get(&id) else {
            continue;
        };
        let detail = details.get(&id).cloned().unwrap_or_default();
        assemblies.push(Assembly::build(id, detail, gens, &operators)?);
    }
    Ok(assemblies)
}

fn read_spacegroup(source: &dyn CategorySource) -> Result<Option<Spacegroup>, ModelError> {
    let Some(cell) = source.category("cell") else {
        return Ok(None);
    };
    if cell.row_count() == 0 {
        return Ok(None);
    }
    let size = Vector3::new(
        cell.column("length_a").float_or(0, 1.0)?,
        cell.column("length_b").float_or(0, 1.0)?,
        cell.column("length_c").float_or(0, 1.0)?,
    );
    let angles = Vector3::new(
        cell.column("angle_alpha").float_or(0, 90.0)?,
        cell.column("angle_beta").float_or(0, 90.0)?,
        cell.column("angle_gamma").float_or(0, 90.0)?,
    );
    let cell = SpacegroupCell::new(size, angles)?;

    let name = source
        .category("symmetry")
        .map(|t| t.column("space_group_name_H-M").str(0).to_string())
        .unwrap_or_else(|| "P 1".to_string());

    let mut symops: Vec<String> = Vec::new();
    for (category, field) in [
        ("symmetry_equiv", "pos_as_xyz"),
        ("space_group_symop", "operation_xyz"),
    ] {
        if let Some(table) = source.category(category) {
            let column = table.column(field);
            symops.extend((0..table.row_count()).map(|r| column.str(r).to_string()));
            break;
        }
    }
    if symops.is_empty() {
        symops.push("x,y,z".to_string());
    }
    let refs: Vec<&str> = symops.iter().map(String::as_str).collect();
    Ok(Some(Spacegroup::new(name, cell, &refs)?))
}

fn read_ncs(source: &dyn CategorySource) -> Result<Vec<Arc<SymmetryOperator>>, ModelError> {
    let Some(table) = source.category("struct_ncs_oper") else {
        return Ok(Vec::new());
    };
    let id = table.require_column("id")?;
    let code = table.column("code");
    let mut operators = Vec::new();
    for row in 0..table.row_count() {
        if code.is_defined(row) && code.str(row) != "generate" {
            continue;
        }
        let matrix = read_matrix(table, row)?;
        let ncs_id = id.str(row);
        let op = SymmetryOperator::create(format!("ncs_{}", ncs_id), matrix, Provenance::ncs(ncs_id));
        if !op.is_identity() {
            operators.push(Arc::new(op));
        }
    }
    Ok(operators)
}

fn read_coarse(
    source: &dyn CategorySource,
    kind: CoarseKind,
    model_num: i64,
) -> Result<Option<CoarseElements>, ModelError> {
    let (category, x_field, y_field, z_field) = match kind {
        CoarseKind::Spheres => ("ihm_sphere_obj_site", "Cartn_x", "Cartn_y", "Cartn_z"),
        CoarseKind::Gaussians => (
            "ihm_gaussian_obj_site",
            "mean_Cartn_x",
            "mean_Cartn_y",
            "mean_Cartn_z",
        ),
    };
    let Some(table) = source.category(category) else {
        return Ok(None);
    };
    let x = table.require_column(x_field)?;
    let y = table.require_column(y_field)?;
    let z = table.require_column(z_field)?;
    let asym = table.require_column("asym_id")?;
    let entity = table.column("entity_id");
    let begin = table.column("seq_id_begin");
    let end = table.column("seq_id_end");
    let model_id = table.column("model_id");

    let mut positions = Vec::new();
    let mut radius = Vec::new();
    let mut seq_id_begin = Vec::new();
    let mut seq_id_end = Vec::new();
    let mut chain_offsets = Vec::new();
    let mut asym_ids: Vec<String> = Vec::new();
    let mut entity_ids = Vec::new();

    for row in 0..table.row_count() {
        if model_id.int(row)?.is_some_and(|m| m != model_num) {
            continue;
        }
        let asym_id = asym.str(row);
        if asym_ids.last().is_none_or(|last| last != asym_id) {
            chain_offsets.push(positions.len());
            asym_ids.push(asym_id.to_string());
            entity_ids.push(entity.str(row).to_string());
        }
        positions.push(Point3::new(
            x.required_float(row)?,
            y.required_float(row)?,
            z.required_float(row)?,
        ));
        radius.push(match kind {
            CoarseKind::Spheres => table.column("object_radius").float_or(row, 0.0)?,
            CoarseKind::Gaussians => {
                let trace = table.column("covariance_matrix[1][1]").float_or(row, 0.0)?
                    + table.column("covariance_matrix[2][2]").float_or(row, 0.0)?
                    + table.column("covariance_matrix[3][3]").float_or(row, 0.0)?;
                (trace / 3.0).max(0.0).sqrt()
            }
        });
        let b = begin.int(row)?.unwrap_or(0);
        seq_id_begin.push(b);
        seq_id_end.push(end.int(row)?.unwrap_or(b));
    }
    if positions.is_empty() {
        return Ok(None);
    }
    chain_offsets.push(positions.len());
    Ok(Some(CoarseElements {
        kind,
        conformation: Conformation::new(positions),
        radius,
        seq_id_begin,
        seq_id_end,
        chain_segments: Segmentation::from_offsets(chain_offsets),
        asym_id: asym_ids,
        entity_id: entity_ids,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::CategoryData;
    use crate::test_support::{atom_site, table};

    #[test]
    fn atom_site_rows_are_segmented_into_residues_and_chains() {
        let data = CategoryData::new().with(atom_site(&[
            ("C", "C1", "ETH", "A", 1, [0.0, 0.0, 0.0]),
            ("C", "C2", "ETH", "A", 1, [1.5, 0.0, 0.0]),
            ("O", "O", "HOH", "A", 2, [5.0, 0.0, 0.0]),
            ("N", "N", "GLY", "B", 1, [9.0, 0.0, 0.0]),
        ]));
        let models = build_models(&data, "test").unwrap();
        assert_eq!(models.len(), 1);
        let model = &models[0];
        assert_eq!(model.atom_count(), 4);
        assert_eq!(model.atomic.residue_count(), 3);
        assert_eq!(model.atomic.chain_count(), 2);
        assert_eq!(model.atomic.comp_id(2), "HOH");
        assert_eq!(model.atomic.label_asym_id(3), "B");
        assert_eq!(model.atomic.residue_chain, vec![0, 0, 1]);
        assert!(!model.is_coarse_grained());
    }

    #[test]
    fn missing_atoms_and_coarse_data_is_an_error() {
        let data = CategoryData::new();
        assert!(matches!(build_models(&data, "empty"), Err(ModelError::Empty)));
    }

    #[test]
    fn struct_conn_partners_resolve_to_atoms() {
        let data = CategoryData::new()
            .with(atom_site(&[
                ("S", "SG", "CYS", "A", 1, [0.0, 0.0, 0.0]),
                ("S", "SG", "CYS", "A", 2, [2.0, 0.0, 0.0]),
            ]))
            .with(table(
                "struct_conn",
                &[
                    "conn_type_id",
                    "ptnr1_label_asym_id",
                    "ptnr1_label_seq_id",
                    "ptnr1_label_atom_id",
                    "ptnr2_label_asym_id",
                    "ptnr2_label_seq_id",
                    "ptnr2_label_atom_id",
                ],
                &[vec!["disulf", "A", "1", "SG", "A", "2", "SG"]],
            ));
        let model = build_models(&data, "ss").unwrap().remove(0);
        let entry = &model.struct_conn.entries[0];
        assert_eq!((entry.partner_a.atom, entry.partner_b.atom), (0, 1));
        assert!(entry.flags.contains(BondFlags::DISULFIDE));
        assert_eq!(entry.partner_a.symmetry, DEFAULT_OPERATOR_NAME);
    }

    #[test]
    fn assemblies_with_undefined_operators_fail() {
        let data = CategoryData::new()
            .with(atom_site(&[("C", "C1", "ETH", "A", 1, [0.0, 0.0, 0.0])]))
            .with(table(
                "pdbx_struct_assembly_gen",
                &["assembly_id", "oper_expression", "asym_id_list"],
                &[vec!["1", "(1,2)", "A"]],
            ));
        assert!(matches!(
            build_models(&data, "bad"),
            Err(ModelError::Symmetry(_))
        ));
    }

    #[test]
    fn multiple_models_are_split() {
        let data = CategoryData::new().with(table(
            "atom_site",
            &["id", "type_symbol", "label_atom_id", "label_comp_id", "label_asym_id",
              "label_seq_id", "Cartn_x", "Cartn_y", "Cartn_z", "pdbx_PDB_model_num"],
            &[
                vec!["1", "C", "C1", "ETH", "A", "1", "0.0", "0", "0", "1"],
                vec!["2", "C", "C1", "ETH", "A", "1", "0.5", "0", "0", "2"],
            ],
        ));
        let models = build_models(&data, "nmr").unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].model_num, 2);
        assert_eq!(models[1].position(0).x, 0.5);
        assert_ne!(models[0].id(), models[1].id());
    }

    #[test]
    fn sphere_sites_become_coarse_elements() {
        let data = CategoryData::new().with(table(
            "ihm_sphere_obj_site",
            &["asym_id", "seq_id_begin", "seq_id_end", "Cartn_x", "Cartn_y", "Cartn_z", "object_radius"],
            &[
                vec!["A", "1", "10", "0", "0", "0", "3.0"],
                vec!["A", "11", "20", "6", "0", "0", "3.0"],
                vec!["B", "1", "5", "20", "0", "0", "2.0"],
            ],
        ));
        let model = build_models(&data, "ihm").unwrap().remove(0);
        let spheres = model.spheres.as_ref().unwrap();
        assert_eq!(spheres.count(), 3);
        assert_eq!(spheres.chain_segments.count(), 2);
        assert_eq!(spheres.asym_id(2), "B");
        assert_eq!(model.atom_count(), 0);
    }
}
