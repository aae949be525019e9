//! # sst CLI entry point
//!
//! Parses arguments, installs logging, loads configuration, and dispatches
//! to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sst_cli::commands::evidence::{run_export, run_seal, run_verify, ExportArgs, SealArgs, VerifyArgs};
use sst_cli::commands::exposure::{run_exposure, ExposureArgs};
use sst_cli::commands::pipeline::{run_pipeline, PipelineArgs};
use sst_cli::commands::state::{run_state, StateArgs};
use sst_cli::config::CliConfig;
use sst_cli::{exit_code_for, init_tracing, EXIT_FAILURE};

/// SST evidence stack: occupational exposure, regulatory state, and
/// hash-sealed compliance evidence.
#[derive(Parser, Debug)]
#[command(name = "sst", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rate risks and sum worker exposure.
    Exposure(ExposureArgs),

    /// Evaluate the regulatory state.
    State(StateArgs),

    /// Run the technical, legal, and fiscal agents.
    Pipeline(PipelineArgs),

    /// Render and seal compliance evidence.
    Seal(SealArgs),

    /// Verify the integrity of sealed evidence.
    Verify(VerifyArgs),

    /// Export sealed evidence as a paginated document.
    Export(ExportArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Exposure(args) => run_exposure(args, &config),
            Commands::State(args) => run_state(args, &config),
            Commands::Pipeline(args) => run_pipeline(args, &config).await,
            Commands::Seal(args) => run_seal(args, &config).await,
            Commands::Verify(args) => run_verify(args, &config).await,
            Commands::Export(args) => run_export(args, &config).await,
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}
