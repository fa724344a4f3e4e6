//! covforge CLI library
//!
//! Command-line front end for the covforge coverage pipeline: argument
//! parsing, configuration layering, logging and progress output.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{CleanArgs, Cli, ColorArg, Commands, LlvmToolsArg, PipelineArgs};
pub use config::{apply_pipeline_args, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_plan, render_removed, render_report, OutputFormat, ProgressReporter};
