mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::PartialBuildConfig;
use crate::error::{CliError, Result};
use blockforge::workflows::build::BuildContext;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("bforge v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!(
            "Setting Rayon global thread pool to {} threads.",
            num_threads
        );
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
            })?;
    }

    let build_config = PartialBuildConfig::resolve(&cli.build)?;
    let context = BuildContext::new(build_config)?;

    let command_result = match cli.command {
        Commands::Inspect(args) => {
            info!("Dispatching to 'inspect' command.");
            commands::inspect::run(args, &context)
        }
        Commands::Dump(args) => {
            info!("Dispatching to 'dump' command.");
            commands::dump::run(args, &context)
        }
        Commands::Export(args) => {
            info!("Dispatching to 'export' command.");
            commands::export::run(args, &context)
        }
        Commands::Batch(args) => {
            info!("Dispatching to 'batch' command.");
            commands::batch::run(args, &context)
        }
        Commands::Motifs => commands::motifs::run(&context),
    };

    match &command_result {
        Ok(_) => info!("Command completed successfully."),
        Err(e) => error!("Command failed: {}", e),
    }
    command_result
}
