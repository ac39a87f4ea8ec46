use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The molframe developers",
    version,
    about = "molframe - inspect macromolecular structures, expand their symmetry and export atom selections.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override a configuration value (e.g., -S bonds.max-radius=3.5). Can be used multiple times.
    #[arg(short = 'S', long = "set", global = true, value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a structure: units, bonds, rings and extent.
    Info(InfoArgs),
    /// Build a biological assembly and report its units.
    Assembly(AssemblyArgs),
    /// Find crystal symmetry mates within a radius of the structure.
    Mates(MatesArgs),
    /// Select atoms and write the selection as a TOML bundle.
    Select(SelectArgs),
}

/// Options shared by every command that loads a structure.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Directory of `<category>.csv` files describing the structure.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub input: PathBuf,

    /// Zero-based index of the model to use when the input holds several.
    #[arg(long, default_value_t = 0, value_name = "INDEX")]
    pub model: usize,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Build all derived data before summarizing and show progress.
    #[arg(long)]
    pub precompute: bool,
}

#[derive(Args, Debug)]
pub struct AssemblyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Assembly identifier.
    #[arg(long = "id", default_value = "1", value_name = "ID")]
    pub assembly_id: String,

    /// Expand NCS operators instead of building an assembly.
    #[arg(long, conflicts_with = "assembly_id")]
    pub ncs: bool,
}

#[derive(Args, Debug)]
pub struct MatesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Contact radius in Å. Overrides `mates.radius` from the config file.
    #[arg(short, long, value_name = "FLOAT")]
    pub radius: Option<f64>,

    /// Unit-cell offsets searched in every direction. Overrides `mates.cell-range`.
    #[arg(long, value_name = "NUM")]
    pub cell_range: Option<i32>,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Keep only these chains (label asym ids). Can be used multiple times.
    #[arg(long = "chain", value_name = "ID")]
    pub chains: Vec<String>,

    /// Keep only these components (e.g., HEM). Can be used multiple times.
    #[arg(long = "comp", value_name = "ID")]
    pub comps: Vec<String>,

    /// Keep only these atom names (e.g., CA). Can be used multiple times.
    #[arg(long = "atom", value_name = "NAME")]
    pub atoms: Vec<String>,

    /// Keep only atoms within this distance (Å) of the target chains.
    #[arg(long, value_name = "FLOAT", requires = "target_chains")]
    pub within: Option<f64>,

    /// Target chains for `--within`.
    #[arg(long = "target-chain", value_name = "ID")]
    pub target_chains: Vec<String>,

    /// Grow the selection to whole residues.
    #[arg(long)]
    pub whole_residues: bool,

    /// Output path for the bundle. Printed to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::parse_from([
            "molframe", "info", "-i", "data", "-vv", "-j", "4", "-S", "bonds.max-radius=3.5",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.set_values, vec!["bonds.max-radius=3.5".to_string()]);
        let Commands::Info(args) = cli.command else {
            panic!("expected info");
        };
        assert_eq!(args.input.input, PathBuf::from("data"));
        assert_eq!(args.input.model, 0);
    }

    #[test]
    fn select_collects_repeated_filters() {
        let cli = Cli::parse_from([
            "molframe", "select", "-i", "d", "--chain", "A", "--chain", "B", "--within", "5",
            "--target-chain", "C", "-o", "out.toml",
        ]);
        let Commands::Select(args) = cli.command else {
            panic!("expected select");
        };
        assert_eq!(args.chains, vec!["A", "B"]);
        assert_eq!(args.within, Some(5.0));
        assert_eq!(args.target_chains, vec!["C"]);
        assert_eq!(args.output, Some(PathBuf::from("out.toml")));
    }

    #[test]
    fn within_requires_a_target() {
        assert!(Cli::try_parse_from(["molframe", "select", "-i", "d", "--within", "5"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["molframe", "info", "-i", "d", "-q", "-v"]).is_err());
    }
}
