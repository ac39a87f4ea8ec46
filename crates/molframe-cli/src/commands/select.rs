use super::input::load_structure;
use crate::cli::SelectArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use molframe::engine::structure::Location;
use molframe::query::Bundle;
use molframe::query::context::{Query, atom_name_in, comp_id_in, label_asym_id_in, run as run_query};
use molframe::query::filters::{WithinParams, within};
use molframe::query::generators::{AtomsQuery, atoms};
use std::sync::Arc;
use tracing::info;

pub fn run(args: SelectArgs, config: &PartialConfig) -> Result<()> {
    let bundle = select(&args, config)?;
    let text = toml::to_string(&bundle).map_err(|e| CliError::Other(e.into()))?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Bundle written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn refs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

/// Chain, component and atom-name filters are intersected; empty filters accept everything.
fn build_query(args: &SelectArgs) -> Query {
    let mut params = AtomsQuery::new();
    if !args.chains.is_empty() {
        params = params.chain_test(label_asym_id_in(&refs(&args.chains)));
    }
    if !args.comps.is_empty() {
        params = params.residue_test(comp_id_in(&refs(&args.comps)));
    }
    if !args.atoms.is_empty() {
        params = params.atom_test(atom_name_in(&refs(&args.atoms)));
    }

    match args.within {
        Some(radius) => {
            // One group per atom so the distance filter keeps atoms, not the whole match.
            let per_atom = params.group_by(Arc::new(|l: &Location| l.element as u64));
            let target =
                atoms(AtomsQuery::new().chain_test(label_asym_id_in(&refs(&args.target_chains))));
            within(WithinParams::new(atoms(per_atom), target, radius))
        }
        None => atoms(params),
    }
}

fn select(args: &SelectArgs, config: &PartialConfig) -> Result<Bundle> {
    if args.within.is_some_and(|r| !(r.is_finite() && r >= 0.0)) {
        return Err(CliError::Argument(
            "--within must be a non-negative distance".to_string(),
        ));
    }
    let structure = load_structure(&args.input, config.model_config()?)?;
    let selection = run_query(&build_query(args), &structure);

    let mut loci = selection.to_loci_with_source_units();
    if args.whole_residues {
        loci = loci.extend_to_whole_residues(false);
    }
    info!("Selected {} element(s).", loci.size());
    Ok(Bundle::from_loci(&loci))
}
