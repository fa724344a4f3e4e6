//! CLI configuration

use crate::commands::{CleanArgs, LlvmToolsArg, PipelineArgs};
use crate::error::{CliError, CliResult};
use covforge::{LlvmTools, PipelineConfig, DEFAULT_CONFIG_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - stage logs
    Verbose,
    /// Debug - every command line
    Debug,
    /// Trace - everything
    Trace,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug | Self::Trace)
    }

    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when stderr is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Explicit configuration file
    pub config_file: Option<PathBuf>,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set the configuration file
    #[must_use]
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Defaults, overlaid by the explicit config file or `<root>/covforge.yaml`
    pub fn load_pipeline_config(&self, root: Option<&Path>) -> CliResult<PipelineConfig> {
        let base = root.unwrap_or_else(|| Path::new("."));
        let file = match &self.config_file {
            Some(path) if !path.is_file() => {
                return Err(CliError::config(format!("{} does not exist", path.display())));
            }
            Some(path) => Some(path.clone()),
            None => Some(base.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let mut config = match file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                PipelineConfig::from_yaml_file(&path)?
            }
            None => PipelineConfig::default(),
        };
        if let Some(root) = root {
            config = config.with_root(root);
        }
        Ok(config)
    }

    /// Configuration for `run` and `plan`
    pub fn pipeline_config(&self, args: &PipelineArgs) -> CliResult<PipelineConfig> {
        let config = self.load_pipeline_config(args.root.as_deref())?;
        apply_pipeline_args(config, args)
    }

    /// Configuration for `clean`
    pub fn clean_config(&self, args: &CleanArgs) -> CliResult<PipelineConfig> {
        let mut config = self.load_pipeline_config(args.root.as_deref())?;
        if let Some(template) = &args.profile_template {
            config = config.with_profile_template(template.clone());
        }
        if let Some(merged) = &args.merged_profile {
            config = config.with_merged_profile(merged.clone());
        }
        Ok(config)
    }
}

/// Overlay command-line flags on a loaded configuration
pub fn apply_pipeline_args(
    mut config: PipelineConfig,
    args: &PipelineArgs,
) -> CliResult<PipelineConfig> {
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    if let Some(name) = &args.report_name {
        config = config.with_report_name(name.clone());
    }
    if let Some(template) = &args.profile_template {
        config = config.with_profile_template(template.clone());
    }
    if let Some(merged) = &args.merged_profile {
        config = config.with_merged_profile(merged.clone());
    }
    if args.toolchain.is_some() {
        config = config.with_toolchain(args.toolchain.clone());
    }
    if let Some(regex) = &args.ignore_filename_regex {
        config = config.with_ignore_filename_regex(regex.clone());
    }
    if args.no_demangle {
        config = config.with_demangler(None);
    } else if args.demangler.is_some() {
        config = config.with_demangler(args.demangler.clone());
    }
    if args.keep_intermediates {
        config = config.with_keep_intermediates(true);
    }
    if !args.cargo_args.is_empty() {
        config = config.with_cargo_args(args.cargo_args.clone());
    }

    let tools = llvm_tools(&config.llvm_tools, args)?;
    Ok(config.with_llvm_tools(tools))
}

fn llvm_tools(current: &LlvmTools, args: &PipelineArgs) -> CliResult<LlvmTools> {
    let paths_given = args.llvm_profdata.is_some() || args.llvm_cov.is_some();
    match args.llvm_tools {
        Some(LlvmToolsArg::CargoBinutils) if !paths_given => Ok(LlvmTools::CargoBinutils),
        Some(LlvmToolsArg::Sysroot) if !paths_given => Ok(LlvmTools::Sysroot),
        Some(LlvmToolsArg::CargoBinutils | LlvmToolsArg::Sysroot) => Err(
            CliError::invalid_argument("--llvm-profdata/--llvm-cov require --llvm-tools explicit"),
        ),
        Some(LlvmToolsArg::Explicit) => explicit_tools(current, args),
        None if paths_given => explicit_tools(current, args),
        None => Ok(current.clone()),
    }
}

/// Flags take precedence; missing paths fall back to an explicit config file entry
fn explicit_tools(current: &LlvmTools, args: &PipelineArgs) -> CliResult<LlvmTools> {
    let (file_profdata, file_cov) = match current {
        LlvmTools::Explicit { profdata, cov } => (Some(profdata.clone()), Some(cov.clone())),
        _ => (None, None),
    };
    let profdata = args.llvm_profdata.clone().or(file_profdata);
    let cov = args.llvm_cov.clone().or(file_cov);
    match (profdata, cov) {
        (Some(profdata), Some(cov)) => Ok(LlvmTools::Explicit { profdata, cov }),
        _ => Err(CliError::invalid_argument(
            "explicit llvm tools need both --llvm-profdata and --llvm-cov",
        )),
    }
}
