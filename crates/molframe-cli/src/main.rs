mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Error: failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match run_app(cli) {
        Ok(()) => info!("Command completed successfully."),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_app(cli: Cli) -> Result<()> {
    info!("molframe CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!("Setting Rayon global thread pool to {} threads.", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
            })?;
    }

    let config = PartialConfig::load(cli.config.as_deref(), &cli.set_values)?;
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Info(args) => {
            info!("Dispatching to 'info' command.");
            commands::info::run(args, &config, show_progress)
        }
        Commands::Assembly(args) => {
            info!("Dispatching to 'assembly' command.");
            commands::assembly::run(args, &config)
        }
        Commands::Mates(args) => {
            info!("Dispatching to 'mates' command.");
            commands::mates::run(args, &config, show_progress)
        }
        Commands::Select(args) => {
            info!("Dispatching to 'select' command.");
            commands::select::run(args, &config)
        }
    }
}
