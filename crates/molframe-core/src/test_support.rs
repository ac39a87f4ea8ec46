//! In-memory fixtures shared by unit tests.

use crate::core::io::{CategoryData, Table};
use crate::core::model::Model;
use crate::core::model::builder::build_models;
use crate::engine::config::ModelConfig;
use crate::engine::structure::Structure;
use std::sync::Arc;

pub type AtomRow<'a> = (&'a str, &'a str, &'a str, &'a str, i64, [f64; 3]);

pub fn table(name: &str, fields: &[&str], rows: &[Vec<&str>]) -> Table {
    Table::from_rows(name, fields, rows).unwrap()
}

/// `atom_site` rows of `(type_symbol, atom_name, comp_id, asym_id, seq_id, xyz)`, with ids
/// numbered from 1.
pub fn atom_site(rows: &[AtomRow<'_>]) -> Table {
    let owned: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, (element, name, comp, asym, seq, p))| {
            vec![
                (i + 1).to_string(),
                element.to_string(),
                name.to_string(),
                comp.to_string(),
                asym.to_string(),
                seq.to_string(),
                p[0].to_string(),
                p[1].to_string(),
                p[2].to_string(),
            ]
        })
        .collect();
    Table::from_rows(
        "atom_site",
        &[
            "id",
            "type_symbol",
            "label_atom_id",
            "label_comp_id",
            "label_asym_id",
            "label_seq_id",
            "Cartn_x",
            "Cartn_y",
            "Cartn_z",
        ],
        &owned,
    )
    .unwrap()
}

pub fn model(data: &CategoryData) -> Arc<Model> {
    Arc::new(build_models(data, "test").unwrap().remove(0))
}

pub fn structure(data: &CategoryData) -> Structure {
    Structure::from_model(model(data), ModelConfig::default())
}

pub fn structure_with(data: &CategoryData, config: ModelConfig) -> Structure {
    Structure::from_model(model(data), config)
}

/// Chains `A` and `B`, each one ALA residue of three atoms spaced 1.5 Å along x. The last atom
/// of `A` and the first atom of `B` are `separation` Å apart.
pub fn two_chain_structure(separation: f64) -> Structure {
    let b = 3.0 + separation;
    structure(&CategoryData::new().with(atom_site(&[
        ("N", "N", "ALA", "A", 1, [0.0, 0.0, 0.0]),
        ("C", "CA", "ALA", "A", 1, [1.5, 0.0, 0.0]),
        ("C", "C", "ALA", "A", 1, [3.0, 0.0, 0.0]),
        ("N", "N", "ALA", "B", 1, [b, 0.0, 0.0]),
        ("C", "CA", "ALA", "B", 1, [b + 1.5, 0.0, 0.0]),
        ("C", "C", "ALA", "B", 1, [b + 3.0, 0.0, 0.0]),
    ])))
}

const BENZENE_ATOMS: [&str; 6] = ["C1", "C2", "C3", "C4", "C5", "C6"];

/// A planar six-carbon ring with 1.39 Å sides in residue `BNZ` of chain `A`. With
/// `non_aromatic`, a component dictionary marks every ring bond as explicitly non-aromatic.
pub fn benzene_model(non_aromatic: bool) -> Arc<Model> {
    let rows: Vec<AtomRow<'static>> = BENZENE_ATOMS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let angle = i as f64 * std::f64::consts::PI / 3.0;
            ("C", *name, "BNZ", "A", 1, [1.39 * angle.cos(), 1.39 * angle.sin(), 0.0])
        })
        .collect();
    let mut data = CategoryData::new().with(atom_site(&rows));
    if non_aromatic {
        let bonds: Vec<Vec<&str>> = (0..6)
            .map(|i| vec!["BNZ", BENZENE_ATOMS[i], BENZENE_ATOMS[(i + 1) % 6], "sing", "N"])
            .collect();
        data.insert(table(
            "chem_comp_bond",
            &["comp_id", "atom_id_1", "atom_id_2", "value_order", "pdbx_aromatic_flag"],
            &bonds,
        ));
    }
    model(&data)
}

/// One chain `A` with a two-operator assembly `1`: identity and a 180° rotation about z.
pub fn dimer_assembly_data() -> CategoryData {
    CategoryData::new()
        .with(atom_site(&[
            ("N", "N", "ALA", "A", 1, [5.0, 0.0, 0.0]),
            ("C", "CA", "ALA", "A", 1, [6.5, 0.0, 0.0]),
            ("C", "C", "ALA", "A", 1, [8.0, 0.0, 0.0]),
        ]))
        .with(table(
            "pdbx_struct_oper_list",
            &["id", "matrix[1][1]", "matrix[2][2]", "matrix[3][3]"],
            &[vec!["1", "1", "1", "1"], vec!["2", "-1", "-1", "1"]],
        ))
        .with(table(
            "pdbx_struct_assembly_gen",
            &["assembly_id", "oper_expression", "asym_id_list"],
            &[vec!["1", "(1,2)", "A"]],
        ))
}

/// Chain `A` along x in a 10 Å cubic cell with operations `x,y,z` and `-x,-y,z`.
pub fn crystal_data() -> CategoryData {
    CategoryData::new()
        .with(atom_site(&[
            ("N", "N", "ALA", "A", 1, [1.0, 0.0, 0.0]),
            ("C", "CA", "ALA", "A", 1, [2.5, 0.0, 0.0]),
            ("C", "C", "ALA", "A", 1, [4.0, 0.0, 0.0]),
        ]))
        .with(table(
            "cell",
            &["length_a", "length_b", "length_c", "angle_alpha", "angle_beta", "angle_gamma"],
            &[vec!["10", "10", "10", "90", "90", "90"]],
        ))
        .with(table(
            "symmetry_equiv",
            &["id", "pos_as_xyz"],
            &[vec!["1", "x,y,z"], vec!["2", "-x,-y,z"]],
        ))
}

/// Chain `A` with one generated NCS copy shifted 20 Å along y.
pub fn ncs_data() -> CategoryData {
    CategoryData::new()
        .with(atom_site(&[
            ("N", "N", "ALA", "A", 1, [1.0, 0.0, 0.0]),
            ("C", "CA", "ALA", "A", 1, [2.5, 0.0, 0.0]),
        ]))
        .with(table(
            "struct_ncs_oper",
            &["id", "code", "vector[1]", "vector[2]", "vector[3]"],
            &[vec!["1", "given", "0", "0", "0"], vec!["2", "generate", "0", "20", "0"]],
        ))
}
