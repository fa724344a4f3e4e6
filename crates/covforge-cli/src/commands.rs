//! CLI command definitions using clap

use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// covforge: lcov coverage reports for Rust workspaces
///
/// Without a subcommand, runs the full pipeline with default settings.
#[derive(Parser, Debug)]
#[command(name = "covforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML configuration file [default: <root>/covforge.yaml when present]
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the instrumented tests and write the lcov report
    Run(PipelineArgs),

    /// Show each stage and the command it would run, without running it
    Plan(PipelineArgs),

    /// Delete raw and merged profiles
    Clean(CleanArgs),
}

/// Pipeline settings; each flag overrides the configuration file
#[derive(Args, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PipelineArgs {
    /// Workspace root [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Report directory, relative to the root [default: coverage]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report file name [default: coverage.info]
    #[arg(long, value_name = "NAME")]
    pub report_name: Option<String>,

    /// LLVM_PROFILE_FILE template; must contain %p [default: coverage-%p-%m.profraw]
    #[arg(long, value_name = "TEMPLATE")]
    pub profile_template: Option<String>,

    /// Merged profile path, relative to the root [default: coverage.profdata]
    #[arg(long, value_name = "PATH")]
    pub merged_profile: Option<PathBuf>,

    /// Rustup toolchain for cargo and rustc (e.g. nightly)
    #[arg(long, env = "COVFORGE_TOOLCHAIN")]
    pub toolchain: Option<String>,

    /// How llvm-profdata and llvm-cov are found
    #[arg(long, value_name = "KIND")]
    pub llvm_tools: Option<LlvmToolsArg>,

    /// Path to llvm-profdata (implies --llvm-tools explicit)
    #[arg(long, value_name = "PATH")]
    pub llvm_profdata: Option<PathBuf>,

    /// Path to llvm-cov (implies --llvm-tools explicit)
    #[arg(long, value_name = "PATH")]
    pub llvm_cov: Option<PathBuf>,

    /// Source files matching this regex are left out of the report
    #[arg(long, value_name = "REGEX")]
    pub ignore_filename_regex: Option<String>,

    /// Symbol demangler passed to llvm-cov [default: rustfilt]
    #[arg(long, value_name = "PROGRAM", conflicts_with = "no_demangle")]
    pub demangler: Option<String>,

    /// Leave symbol names mangled
    #[arg(long)]
    pub no_demangle: bool,

    /// Keep raw and merged profiles after a successful run
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Summary format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Extra arguments for `cargo test` (after --)
    #[arg(last = true, value_name = "CARGO_ARGS")]
    pub cargo_args: Vec<String>,
}

/// Arguments for the clean command
#[derive(Args, Debug, Default)]
pub struct CleanArgs {
    /// Workspace root [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// LLVM_PROFILE_FILE template whose files are deleted
    #[arg(long, value_name = "TEMPLATE")]
    pub profile_template: Option<String>,

    /// Merged profile path, relative to the root
    #[arg(long, value_name = "PATH")]
    pub merged_profile: Option<PathBuf>,

    /// Also delete the report directory
    #[arg(long)]
    pub all: bool,
}

/// LLVM tool resolution strategy
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlvmToolsArg {
    /// `cargo profdata` / `cargo cov` from cargo-binutils
    CargoBinutils,
    /// Binaries shipped by the llvm-tools rustup component
    Sysroot,
    /// Paths given by --llvm-profdata and --llvm-cov
    Explicit,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
