use super::format_units;
use super::input::load_structure;
use crate::cli::AssemblyArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use molframe::engine::structure::Structure;
use molframe::workflows::analysis::summarize;
use molframe::workflows::symmetry::{build_assembly, build_ncs};
use tracing::info;

pub fn run(args: AssemblyArgs, config: &PartialConfig) -> Result<()> {
    let expanded = expand(&args, config)?;
    print!("{}", format_units(&expanded));
    println!();
    println!("{}", summarize(&expanded));
    Ok(())
}

fn expand(args: &AssemblyArgs, config: &PartialConfig) -> Result<Structure> {
    let structure = load_structure(&args.input, config.model_config()?)?;
    let expanded = if args.ncs {
        info!("Expanding NCS operators.");
        build_ncs(&structure)?
    } else {
        info!("Building assembly '{}'.", args.assembly_id);
        build_assembly(&structure, &args.assembly_id)?
    };
    info!("Expanded structure has {} unit(s).", expanded.unit_count());
    Ok(expanded)
}
