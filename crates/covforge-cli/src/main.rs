//! covforge: lcov coverage reports for Rust workspaces
//!
//! ## Usage
//!
//! ```bash
//! covforge                          # Run the full pipeline
//! covforge run -- --locked          # Extra cargo test arguments
//! covforge plan                     # Show the commands without running them
//! covforge clean --all              # Delete profiles and the report directory
//! ```

use clap::Parser;
use covforge_cli::{
    handlers::{execute_clean, execute_plan, execute_run},
    logging, Cli, CliConfig, CliResult, ColorChoice, Commands, PipelineArgs, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(command: Option<Commands>, config: &CliConfig) -> CliResult<()> {
    match command {
        None => execute_run(config, &PipelineArgs::default()),
        Some(Commands::Run(args)) => execute_run(config, &args),
        Some(Commands::Plan(args)) => execute_plan(config, &args),
        Some(Commands::Clean(args)) => execute_clean(config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_config_file(cli.config.clone())
}
