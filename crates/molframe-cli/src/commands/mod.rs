use molframe::engine::structure::Structure;
use std::fmt::Write;

pub mod assembly;
pub mod info;
pub mod input;
pub mod mates;
pub mod select;

/// One line per unit: id, invariant id, operator and element count.
pub(crate) fn format_units(structure: &Structure) -> String {
    let mut out = String::from("  unit  invariant  operator          elements\n");
    for unit in structure.units() {
        let _ = writeln!(
            out,
            "{:>6}  {:>9}  {:<16}  {:>8}",
            unit.id(),
            unit.invariant_id(),
            unit.operator().name(),
            unit.len()
        );
    }
    out
}
