use super::format_units;
use super::input::load_structure;
use crate::cli::MatesArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::ProgressDisplay;
use molframe::engine::progress::ProgressReporter;
use molframe::engine::structure::Structure;
use molframe::engine::task::{CancellationToken, Outcome, TaskContext};
use molframe::workflows::symmetry::find_symmetry_mates;
use tracing::info;

pub fn run(args: MatesArgs, config: &PartialConfig, show_progress: bool) -> Result<()> {
    let mates = search(&args, config, show_progress)?;
    print!("{}", format_units(&mates));
    Ok(())
}

fn search(args: &MatesArgs, config: &PartialConfig, show_progress: bool) -> Result<Structure> {
    let mates_config = config.mates_config(args.radius, args.cell_range)?;
    let structure = load_structure(&args.input, config.model_config()?)?;

    let display = ProgressDisplay::new(show_progress);
    let reporter = ProgressReporter::with_callback(display.callback());
    let ctx = TaskContext::new(&reporter, CancellationToken::new());

    info!(
        "Searching symmetry mates within {:.2} Å over ±{} cells.",
        mates_config.radius, mates_config.cell_range
    );
    match find_symmetry_mates(&structure, &mates_config, &ctx)? {
        Outcome::Completed(mates) => {
            info!("Found {} unit(s) in contact.", mates.unit_count());
            Ok(mates)
        }
        Outcome::Cancelled => Err(CliError::Cancelled),
    }
}
