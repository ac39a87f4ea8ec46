use super::input::load_structure;
use crate::cli::InfoArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::ProgressDisplay;
use molframe::engine::progress::ProgressReporter;
use molframe::engine::task::{CancellationToken, TaskContext};
use molframe::workflows::analysis::{StructureSummary, precompute, summarize};
use tracing::info;

pub fn run(args: InfoArgs, config: &PartialConfig, show_progress: bool) -> Result<()> {
    let summary = collect(&args, config, show_progress)?;
    println!("{}", summary);
    Ok(())
}

fn collect(args: &InfoArgs, config: &PartialConfig, show_progress: bool) -> Result<StructureSummary> {
    let structure = load_structure(&args.input, config.model_config()?)?;

    if args.precompute {
        let display = ProgressDisplay::new(show_progress);
        let reporter = ProgressReporter::with_callback(display.callback());
        let ctx = TaskContext::new(&reporter, CancellationToken::new());
        if precompute(&structure, &ctx).is_cancelled() {
            return Err(CliError::Cancelled);
        }
    }

    info!("Summarizing {} unit(s).", structure.unit_count());
    Ok(summarize(&structure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InputArgs;
    use crate::commands::input::fixtures;
    use tempfile::tempdir;

    #[test]
    fn summary_reflects_the_input_chain() {
        let dir = tempdir().unwrap();
        fixtures::write_crystal(dir.path());
        let args = InfoArgs {
            input: InputArgs {
                input: dir.path().to_path_buf(),
                model: 0,
            },
            precompute: true,
        };
        let summary = collect(&args, &PartialConfig::default(), false).unwrap();
        assert_eq!(summary.units, 1);
        assert_eq!(summary.elements, 3);
        assert_eq!(summary.intra_unit_bonds, 2);
    }

    #[test]
    fn explicit_only_policy_leaves_the_chain_unbonded() {
        let dir = tempdir().unwrap();
        fixtures::write_crystal(dir.path());
        let args = InfoArgs {
            input: InputArgs {
                input: dir.path().to_path_buf(),
                model: 0,
            },
            precompute: false,
        };
        let config =
            PartialConfig::load(None, &["bonds.policy=explicit-only".to_string()]).unwrap();
        let summary = collect(&args, &config, false).unwrap();
        assert_eq!(summary.intra_unit_bonds, 0);
    }
}
