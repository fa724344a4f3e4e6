//! Pipeline configuration
//!
//! Defaults reproduce the classic CI coverage recipe:
//!
//! ```text
//! RUSTFLAGS="-C instrument-coverage" LLVM_PROFILE_FILE="coverage-%p-%m.profraw" \
//!     cargo test --workspace --all-features
//! cargo profdata -- merge -sparse <raw profiles> -o coverage.profdata
//! cargo cov -- export --format=lcov ... > coverage/coverage.info
//! ```
//!
//! A YAML file can override any field; CLI flags override the file.

use crate::result::{CovError, CovResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Default raw profile file name template
pub const DEFAULT_PROFILE_TEMPLATE: &str = "coverage-%p-%m.profraw";

/// Default merged profile database file name
pub const DEFAULT_MERGED_PROFILE: &str = "coverage.profdata";

/// Default report directory
pub const DEFAULT_OUTPUT_DIR: &str = "coverage";

/// Default report file name
pub const DEFAULT_REPORT_NAME: &str = "coverage.info";

/// Default rustc instrumentation flag
pub const DEFAULT_INSTRUMENT_FLAGS: &str = "-C instrument-coverage";

/// Default demangler passed to `llvm-cov --Xdemangler`
pub const DEFAULT_DEMANGLER: &str = "rustfilt";

/// Default exclusion regex: dependency cache, toolchain source mirror,
/// build output, test sources, toolchain installer.
pub const DEFAULT_IGNORE_FILENAME_REGEX: &str = r"/\.cargo/|/rustc/|/target/|(^|/)tests/|/\.rustup/";

/// Config file picked up from the root when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "covforge.yaml";

/// How the LLVM coverage tools are invoked
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum LlvmTools {
    /// `cargo profdata --` and `cargo cov --` (cargo-binutils)
    #[default]
    CargoBinutils,
    /// `llvm-tools` component of the active toolchain
    Sysroot,
    /// Explicit tool paths
    Explicit {
        /// Path to `llvm-profdata`
        profdata: PathBuf,
        /// Path to `llvm-cov`
        cov: PathBuf,
    },
}

impl LlvmTools {
    /// Short name used in logs and on the command line
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CargoBinutils => "cargo-binutils",
            Self::Sysroot => "sysroot",
            Self::Explicit { .. } => "explicit",
        }
    }
}

/// Coverage pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Working tree root; every command runs here
    pub root: PathBuf,
    /// Report directory, relative to `root`; wiped on every run
    pub output_dir: PathBuf,
    /// Report file name inside `output_dir`
    pub report_name: String,
    /// `LLVM_PROFILE_FILE` template for raw profiles
    pub profile_template: String,
    /// Merged profile file, relative to `root`
    pub merged_profile: PathBuf,
    /// Rustup toolchain override (`cargo +<toolchain>`)
    pub toolchain: Option<String>,
    /// Flags appended to `RUSTFLAGS`
    pub instrument_flags: String,
    /// Extra arguments for `cargo test`
    pub cargo_args: Vec<String>,
    /// LLVM tool invocation
    pub llvm_tools: LlvmTools,
    /// Source paths matching this regex are left out of the report
    pub ignore_filename_regex: String,
    /// Symbol demangler, `None` to keep mangled names
    pub demangler: Option<String>,
    /// Leave raw and merged profiles on disk after a successful run
    pub keep_intermediates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            report_name: DEFAULT_REPORT_NAME.to_string(),
            profile_template: DEFAULT_PROFILE_TEMPLATE.to_string(),
            merged_profile: PathBuf::from(DEFAULT_MERGED_PROFILE),
            toolchain: None,
            instrument_flags: DEFAULT_INSTRUMENT_FLAGS.to_string(),
            cargo_args: Vec::new(),
            llvm_tools: LlvmTools::default(),
            ignore_filename_regex: DEFAULT_IGNORE_FILENAME_REGEX.to_string(),
            demangler: Some(DEFAULT_DEMANGLER.to_string()),
            keep_intermediates: false,
        }
    }
}

impl PipelineConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file; absent fields keep their defaults
    pub fn from_yaml_file(path: &Path) -> CovResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CovError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&text).map_err(|e| CovError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml_ng::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(text)
    }

    /// Set the working tree root
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the report directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the report file name
    #[must_use]
    pub fn with_report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = name.into();
        self
    }

    /// Set the raw profile template
    #[must_use]
    pub fn with_profile_template(mut self, template: impl Into<String>) -> Self {
        self.profile_template = template.into();
        self
    }

    /// Set the merged profile path
    #[must_use]
    pub fn with_merged_profile(mut self, path: impl Into<PathBuf>) -> Self {
        self.merged_profile = path.into();
        self
    }

    /// Set the rustup toolchain
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Option<String>) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Set extra `cargo test` arguments
    #[must_use]
    pub fn with_cargo_args(mut self, args: Vec<String>) -> Self {
        self.cargo_args = args;
        self
    }

    /// Set LLVM tool invocation
    #[must_use]
    pub fn with_llvm_tools(mut self, tools: LlvmTools) -> Self {
        self.llvm_tools = tools;
        self
    }

    /// Set the exclusion regex
    #[must_use]
    pub fn with_ignore_filename_regex(mut self, regex: impl Into<String>) -> Self {
        self.ignore_filename_regex = regex.into();
        self
    }

    /// Set the demangler
    #[must_use]
    pub fn with_demangler(mut self, demangler: Option<String>) -> Self {
        self.demangler = demangler;
        self
    }

    /// Keep intermediates after a successful run
    #[must_use]
    pub const fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Report directory resolved against `root`
    #[must_use]
    pub fn output_dir_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Report file resolved against `root`
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir_path().join(&self.report_name)
    }

    /// Merged profile resolved against `root`
    #[must_use]
    pub fn merged_profile_path(&self) -> PathBuf {
        self.root.join(&self.merged_profile)
    }

    /// Check the configuration is usable before anything runs
    pub fn validate(&self) -> CovResult<()> {
        Regex::new(&self.ignore_filename_regex).map_err(|e| {
            CovError::invalid_config(format!("ignore_filename_regex does not compile: {e}"))
        })?;

        if !self.profile_template.contains("%p") {
            return Err(CovError::invalid_config(format!(
                "profile_template `{}` must contain %p so each test process writes its own raw profile",
                self.profile_template
            )));
        }

        if self.report_name.is_empty() || self.report_name.contains(['/', '\\']) {
            return Err(CovError::invalid_config(format!(
                "report_name `{}` must be a plain file name",
                self.report_name
            )));
        }

        if self.output_dir.as_os_str().is_empty() || self.output_dir == Path::new(".") {
            return Err(CovError::invalid_config(
                "output_dir must name a dedicated directory, it is deleted on every run",
            ));
        }

        for (field, path) in [
            ("output_dir", &self.output_dir),
            ("merged_profile", &self.merged_profile),
        ] {
            if !stays_under_root(path) {
                return Err(CovError::invalid_config(format!(
                    "{field} `{}` must be a relative path inside root, it is deleted by reset and clean",
                    path.display()
                )));
            }
        }

        if let LlvmTools::Explicit { profdata, cov } = &self.llvm_tools {
            if profdata.as_os_str().is_empty() || cov.as_os_str().is_empty() {
                return Err(CovError::invalid_config(
                    "explicit llvm tools need both llvm-profdata and llvm-cov paths",
                ));
            }
        }

        Ok(())
    }
}

/// Relative path made of plain names only, so `root.join(path)` cannot escape `root`
fn stays_under_root(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
