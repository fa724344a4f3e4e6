//! The coverage pipeline
//!
//! Six stages run strictly in order; the first failure aborts the run:
//!
//! ```text
//! reset ──► test ──► merge ──► discover ──► export ──► cleanup
//!   │         │        │          │           │           │
//!   │         │        │          │           │           └─ delete raw + merged profiles
//!   │         │        │          │           └─ llvm-cov export --format=lcov >> report
//!   │         │        │          └─ cargo test --no-run --message-format=json
//!   │         │        └─ llvm-profdata merge -sparse *.profraw
//!   │         └─ cargo test with RUSTFLAGS + LLVM_PROFILE_FILE
//!   └─ wipe output dir, drop stale profiles
//! ```
//!
//! The report is written only after the exporter succeeded and its output
//! passed [`LcovSummary::parse`], so a failed run never leaves a report
//! behind.

use crate::artifacts;
use crate::command::{run_checked, Capture, CommandRunner, ToolCommand};
use crate::config::PipelineConfig;
use crate::lcov::LcovSummary;
use crate::profraw::{find_raw_profiles, remove_files, ProfileTemplate};
use crate::result::{CovError, CovResult};
use crate::toolchain::{Cargo, ResolvedTools};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Placeholder for raw profiles in planned commands
pub const RAW_PROFILES_PLACEHOLDER: &str = "<raw-profiles>";

/// Placeholder for test binaries in planned commands
pub const TEST_BINARIES_PLACEHOLDER: &str = "<test-binaries>";

/// A pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Wipe the output directory and stale profiles
    Reset,
    /// Run the instrumented test suite
    Test,
    /// Merge raw profiles
    Merge,
    /// Enumerate test binaries
    Discover,
    /// Export the lcov report
    Export,
    /// Delete intermediates
    Cleanup,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Self; 6] = [
        Self::Reset,
        Self::Test,
        Self::Merge,
        Self::Discover,
        Self::Export,
        Self::Cleanup,
    ];

    /// Lowercase stage name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Test => "test",
            Self::Merge => "merge",
            Self::Discover => "discover",
            Self::Export => "export",
            Self::Cleanup => "cleanup",
        }
    }

    /// One-line description for progress output
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Reset => "Resetting output directory",
            Self::Test => "Running instrumented tests",
            Self::Merge => "Merging raw profiles",
            Self::Discover => "Locating test binaries",
            Self::Export => "Exporting lcov report",
            Self::Cleanup => "Removing intermediate profiles",
        }
    }

    /// 1-based position in the pipeline
    #[must_use]
    pub const fn position(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives stage progress notifications
pub trait StageObserver {
    /// A stage is about to run
    fn stage_started(&mut self, _stage: Stage) {}

    /// A stage completed
    fn stage_finished(&mut self, _stage: Stage, _elapsed: Duration) {}

    /// A stage failed; the run stops after this call
    fn stage_failed(&mut self, _stage: Stage, _error: &CovError) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}

/// Time spent in one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Stage
    pub stage: Stage,
    /// Wall-clock duration
    pub duration: Duration,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Raw profiles merged
    pub raw_profiles: usize,
    /// Binaries passed to the exporter
    pub test_binaries: Vec<PathBuf>,
    /// Report file written
    pub report_path: PathBuf,
    /// Shape of the written report
    pub lcov: LcovSummary,
    /// Intermediate files deleted by cleanup
    pub removed_intermediates: usize,
    /// Per-stage timings, in order
    pub timings: Vec<StageTiming>,
    /// Total wall-clock duration
    pub duration: Duration,
}

/// One stage as it would run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStage {
    /// Stage
    pub stage: Stage,
    /// What the stage does with the current configuration
    pub summary: String,
    /// Rendered command line, for tool stages
    pub command: Option<String>,
}

/// Drives the coverage stages through a [`CommandRunner`]
#[derive(Debug)]
pub struct CoveragePipeline<R: CommandRunner> {
    config: PipelineConfig,
    runner: R,
    cargo: Cargo,
    template: ProfileTemplate,
}

impl<R: CommandRunner> CoveragePipeline<R> {
    /// Validate `config` and anchor it at an absolute root
    pub fn new(config: PipelineConfig, runner: R) -> CovResult<Self> {
        config.validate()?;
        let root = std::fs::canonicalize(&config.root)
            .map_err(|e| CovError::path_io(&config.root, e))?;
        let config = config.with_root(root);
        let cargo = Cargo::new(config.toolchain.clone());
        let template = ProfileTemplate::new(config.profile_template.clone());
        template.compile()?;
        Ok(Self {
            config,
            runner,
            cargo,
            template,
        })
    }

    /// Effective configuration (root is absolute)
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The runner
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Give the runner back
    #[must_use]
    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Run every stage in order
    pub fn run(&mut self, observer: &mut dyn StageObserver) -> CovResult<PipelineReport> {
        let start = Instant::now();
        let mut timings = Vec::with_capacity(Stage::ALL.len());

        self.stage(Stage::Reset, observer, &mut timings, Self::reset)?;
        self.stage(Stage::Test, observer, &mut timings, Self::run_tests)?;
        let (tools, raw) = self.stage(Stage::Merge, observer, &mut timings, |p| {
            let tools = ResolvedTools::resolve(&p.config, &mut p.runner)?;
            let raw = p.merge(&tools)?;
            Ok((tools, raw))
        })?;
        let binaries = self.stage(Stage::Discover, observer, &mut timings, Self::discover)?;
        let lcov = self.stage(Stage::Export, observer, &mut timings, |p| {
            p.export(&tools, &binaries)
        })?;
        let removed = self.stage(Stage::Cleanup, observer, &mut timings, |p| p.cleanup(&raw))?;

        let report = PipelineReport {
            raw_profiles: raw.len(),
            test_binaries: binaries,
            report_path: self.config.report_path(),
            lcov,
            removed_intermediates: removed,
            timings,
            duration: start.elapsed(),
        };
        tracing::info!(
            report = %report.report_path.display(),
            records = report.lcov.records(),
            "coverage report written"
        );
        Ok(report)
    }

    fn stage<T>(
        &mut self,
        stage: Stage,
        observer: &mut dyn StageObserver,
        timings: &mut Vec<StageTiming>,
        body: impl FnOnce(&mut Self) -> CovResult<T>,
    ) -> CovResult<T> {
        tracing::info!(%stage, "{}", stage.description());
        observer.stage_started(stage);
        let started = Instant::now();
        match body(self) {
            Ok(value) => {
                let duration = started.elapsed();
                observer.stage_finished(stage, duration);
                timings.push(StageTiming { stage, duration });
                Ok(value)
            }
            Err(err) => {
                tracing::error!(%stage, error = %err, "stage failed");
                observer.stage_failed(stage, &err);
                Err(err)
            }
        }
    }

    /// Describe every stage without running any tool except LLVM tool
    /// resolution
    pub fn plan(&mut self) -> CovResult<Vec<PlannedStage>> {
        let tools = ResolvedTools::resolve(&self.config, &mut self.runner)?;
        let pattern = self.template.glob_pattern();
        let merged = self.config.merged_profile_path();

        let merge = self.merge_command(&tools, &[PathBuf::from(RAW_PROFILES_PLACEHOLDER)]);
        let export = self.export_command(&tools, &[PathBuf::from(TEST_BINARIES_PLACEHOLDER)]);

        let cleanup = if self.config.keep_intermediates {
            "keep raw and merged profiles".to_string()
        } else {
            format!("delete raw profiles and {}", merged.display())
        };

        Ok(vec![
            PlannedStage {
                stage: Stage::Reset,
                summary: format!(
                    "recreate {} and delete stale `{pattern}` and {}",
                    self.config.output_dir_path().display(),
                    merged.display()
                ),
                command: None,
            },
            PlannedStage {
                stage: Stage::Test,
                summary: "run the test suite with coverage instrumentation".to_string(),
                command: Some(self.test_command().to_string()),
            },
            PlannedStage {
                stage: Stage::Merge,
                summary: format!("merge every `{pattern}` under {}", self.config.root.display()),
                command: Some(merge.to_string()),
            },
            PlannedStage {
                stage: Stage::Discover,
                summary: "list test-profile binaries, dropping .dSYM bundles".to_string(),
                command: Some(self.discover_command().to_string()),
            },
            PlannedStage {
                stage: Stage::Export,
                summary: format!("append lcov to {}", self.config.report_path().display()),
                command: Some(export.to_string()),
            },
            PlannedStage {
                stage: Stage::Cleanup,
                summary: cleanup,
                command: None,
            },
        ])
    }

    fn rustflags(&self) -> OsString {
        let mut flags = std::env::var_os("RUSTFLAGS").unwrap_or_default();
        if !flags.is_empty() {
            flags.push(" ");
        }
        flags.push(&self.config.instrument_flags);
        flags
    }

    fn instrumented_cargo_test(&self) -> ToolCommand {
        self.cargo
            .command("test")
            .args(["--workspace", "--all-features"])
            .env("RUSTFLAGS", self.rustflags())
            .env("LLVM_PROFILE_FILE", self.template.as_str())
            .current_dir(&self.config.root)
    }

    /// `cargo test` with instrumentation
    #[must_use]
    pub fn test_command(&self) -> ToolCommand {
        self.instrumented_cargo_test()
            .args(&self.config.cargo_args)
            .capture(Capture::ToStderr)
    }

    /// `cargo test --no-run --message-format=json` with instrumentation
    #[must_use]
    pub fn discover_command(&self) -> ToolCommand {
        self.instrumented_cargo_test()
            .args(["--no-run", "--message-format=json"])
            .args(&self.config.cargo_args)
            .capture(Capture::Stdout)
    }

    fn merge_command(&self, tools: &ResolvedTools, raw: &[PathBuf]) -> ToolCommand {
        tools
            .profdata()
            .args(["merge", "-sparse"])
            .args(raw)
            .arg("-o")
            .arg(self.config.merged_profile_path())
            .current_dir(&self.config.root)
            .capture(Capture::ToStderr)
    }

    fn export_command(&self, tools: &ResolvedTools, binaries: &[PathBuf]) -> ToolCommand {
        let mut instr_profile = OsString::from("--instr-profile=");
        instr_profile.push(self.config.merged_profile_path());

        let mut cmd = tools
            .cov()
            .args(["export", "--format=lcov"])
            .arg(format!(
                "--ignore-filename-regex={}",
                self.config.ignore_filename_regex
            ))
            .arg(instr_profile);
        if let Some(demangler) = &self.config.demangler {
            cmd = cmd.arg(format!("--Xdemangler={demangler}"));
        }
        for binary in binaries {
            cmd = cmd.arg("-object").arg(binary);
        }
        cmd.current_dir(&self.config.root).capture(Capture::Stdout)
    }

    fn reset(&mut self) -> CovResult<()> {
        let output_dir = self.config.output_dir_path();
        match std::fs::remove_dir_all(&output_dir) {
            Ok(()) => tracing::debug!(dir = %output_dir.display(), "removed output directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CovError::path_io(&output_dir, e)),
        }
        std::fs::create_dir_all(&output_dir).map_err(|e| CovError::path_io(&output_dir, e))?;

        let stale = stale_intermediates(&self.config, &self.template)?;
        let removed = remove_files(&stale)?;
        if !removed.is_empty() {
            tracing::warn!(count = removed.len(), "removed intermediates left by an earlier run");
        }
        Ok(())
    }

    fn run_tests(&mut self) -> CovResult<()> {
        let cmd = self.test_command();
        run_checked(&mut self.runner, Stage::Test, &cmd)?;
        Ok(())
    }

    fn merge(&mut self, tools: &ResolvedTools) -> CovResult<Vec<PathBuf>> {
        let pattern = self.template.compile()?;
        let raw = find_raw_profiles(&self.config.root, &pattern)?;
        if raw.is_empty() {
            return Err(CovError::NoRawProfiles {
                root: self.config.root.clone(),
                pattern: pattern.as_str().to_string(),
            });
        }
        tracing::info!(count = raw.len(), "merging raw profiles");

        let cmd = self.merge_command(tools, &raw);
        run_checked(&mut self.runner, Stage::Merge, &cmd)?;

        let merged = self.config.merged_profile_path();
        if !merged.is_file() {
            return Err(CovError::ToolFailed {
                stage: Stage::Merge,
                command: cmd.to_string(),
                code: Some(0),
                stderr: format!("{} was not created", merged.display()),
            });
        }
        Ok(raw)
    }

    fn discover(&mut self) -> CovResult<Vec<PathBuf>> {
        let cmd = self.discover_command();
        let output = run_checked(&mut self.runner, Stage::Discover, &cmd)?;
        let binaries = artifacts::test_binaries(&output.stdout_text())?;
        if binaries.is_empty() {
            return Err(CovError::NoTestBinaries);
        }
        tracing::info!(count = binaries.len(), "found test binaries");
        Ok(binaries)
    }

    fn export(&mut self, tools: &ResolvedTools, binaries: &[PathBuf]) -> CovResult<LcovSummary> {
        let cmd = self.export_command(tools, binaries);
        let output = run_checked(&mut self.runner, Stage::Export, &cmd)?;
        let text = output.stdout_text();
        let summary = LcovSummary::parse(&text)?;

        if summary.mangled_functions > 0 && self.config.demangler.is_some() {
            tracing::warn!(
                mangled = summary.mangled_functions,
                total = summary.functions,
                "report still contains mangled symbols; is the demangler installed?"
            );
        }

        let report = self.config.report_path();
        append(&report, text.as_bytes())?;
        Ok(summary)
    }

    fn cleanup(&mut self, raw: &[PathBuf]) -> CovResult<usize> {
        if self.config.keep_intermediates {
            tracing::info!("keeping intermediate profiles");
            return Ok(0);
        }
        let mut doomed = raw.to_vec();
        doomed.push(self.config.merged_profile_path());
        Ok(remove_files(&doomed)?.len())
    }
}

fn append(path: &Path, bytes: &[u8]) -> CovResult<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CovError::path_io(path, e))?;
    file.write_all(bytes).map_err(|e| CovError::path_io(path, e))?;
    file.flush().map_err(|e| CovError::path_io(path, e))
}

fn stale_intermediates(config: &PipelineConfig, template: &ProfileTemplate) -> CovResult<Vec<PathBuf>> {
    let mut paths = find_raw_profiles(&config.root, &template.compile()?)?;
    let merged = config.merged_profile_path();
    if merged.is_file() {
        paths.push(merged);
    }
    Ok(paths)
}

/// Delete raw and merged profiles; with `all`, the output directory too.
/// Returns every removed path.
pub fn clean(config: &PipelineConfig, all: bool) -> CovResult<Vec<PathBuf>> {
    config.validate()?;
    let template = ProfileTemplate::new(config.profile_template.clone());
    let mut removed = remove_files(&stale_intermediates(config, &template)?)?;

    if all {
        let output_dir = config.output_dir_path();
        match std::fs::remove_dir_all(&output_dir) {
            Ok(()) => removed.push(output_dir),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CovError::path_io(&output_dir, e)),
        }
    }
    tracing::info!(count = removed.len(), "cleaned");
    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use tempfile::TempDir;

    /// Runner that fails every command; enough for plan() and command shape
    struct Unreachable;

    impl CommandRunner for Unreachable {
        fn run(&mut self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
            panic!("unexpected command: {command}");
        }
    }

    fn pipeline(temp: &TempDir) -> CoveragePipeline<Unreachable> {
        CoveragePipeline::new(PipelineConfig::new().with_root(temp.path()), Unreachable).unwrap()
    }

    mod stage_tests {
        use super::*;

        #[test]
        fn test_order_and_names() {
            let names: Vec<_> = Stage::ALL.iter().map(|s| s.to_string()).collect();
            assert_eq!(names, ["reset", "test", "merge", "discover", "export", "cleanup"]);
            assert_eq!(Stage::Reset.position(), 1);
            assert_eq!(Stage::Cleanup.position(), 6);
        }

        #[test]
        fn test_serialize_lowercase() {
            assert_eq!(serde_json::to_string(&Stage::Discover).unwrap(), "\"discover\"");
        }
    }

    mod command_shape_tests {
        use super::*;

        #[test]
        fn test_test_command_instruments() {
            let temp = TempDir::new().unwrap();
            let p = pipeline(&temp);
            let cmd = p.test_command();
            assert_eq!(cmd.program(), "cargo");
            assert!(cmd.has_arg("--workspace"));
            assert!(cmd.has_arg("--all-features"));
            assert!(!cmd.has_arg("--no-run"));
            let flags = cmd.get_env("RUSTFLAGS").unwrap().to_string_lossy().into_owned();
            assert!(flags.ends_with("-C instrument-coverage"));
            assert_eq!(cmd.get_env("LLVM_PROFILE_FILE").unwrap(), "coverage-%p-%m.profraw");
            assert_eq!(cmd.get_current_dir(), Some(p.config().root.as_path()));
        }

        #[test]
        fn test_discover_command_uses_same_env() {
            let temp = TempDir::new().unwrap();
            let p = pipeline(&temp);
            let test = p.test_command();
            let discover = p.discover_command();
            assert!(discover.has_arg("--no-run"));
            assert!(discover.has_arg("--message-format=json"));
            assert_eq!(discover.get_env("RUSTFLAGS"), test.get_env("RUSTFLAGS"));
            assert_eq!(discover.get_capture(), Capture::Stdout);
        }

        #[test]
        fn test_streaming_tools_keep_stdout_clear() {
            let temp = TempDir::new().unwrap();
            let p = pipeline(&temp);
            assert_eq!(p.test_command().get_capture(), Capture::ToStderr);
            let tools = ResolvedTools::CargoBinutils(Cargo::new(None));
            let merge = p.merge_command(&tools, &[PathBuf::from("/w/coverage-1-a.profraw")]);
            assert_eq!(merge.get_capture(), Capture::ToStderr);
        }

        #[test]
        fn test_cargo_args_follow_discovery_flags() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new()
                .with_root(temp.path())
                .with_cargo_args(vec!["--locked".to_string(), "--".to_string(), "--test-threads=1".to_string()]);
            let p = CoveragePipeline::new(config, Unreachable).unwrap();
            let args: Vec<_> = p
                .discover_command()
                .get_args()
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            let no_run = args.iter().position(|a| a == "--no-run").unwrap();
            let dashdash = args.iter().position(|a| a == "--").unwrap();
            assert!(no_run < dashdash);
        }

        #[test]
        fn test_toolchain_pins_cargo() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new()
                .with_root(temp.path())
                .with_toolchain(Some("nightly".to_string()));
            let p = CoveragePipeline::new(config, Unreachable).unwrap();
            assert_eq!(p.test_command().get_args()[0], "+nightly");
        }

        #[test]
        fn test_export_command_shape() {
            let temp = TempDir::new().unwrap();
            let p = pipeline(&temp);
            let tools = ResolvedTools::CargoBinutils(Cargo::new(None));
            let cmd = p.export_command(
                &tools,
                &[PathBuf::from("/t/deps/a-1"), PathBuf::from("/t/deps/b-2")],
            );
            let rendered = cmd.to_string();
            assert!(rendered.starts_with("cargo cov -- export --format=lcov"));
            assert!(rendered.contains("--ignore-filename-regex="));
            assert!(rendered.contains("--instr-profile="));
            assert!(rendered.contains("--Xdemangler=rustfilt"));
            assert!(rendered.ends_with("-object /t/deps/a-1 -object /t/deps/b-2"));
        }

        #[test]
        fn test_export_without_demangler() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new().with_root(temp.path()).with_demangler(None);
            let p = CoveragePipeline::new(config, Unreachable).unwrap();
            let tools = ResolvedTools::CargoBinutils(Cargo::new(None));
            let cmd = p.export_command(&tools, &[PathBuf::from("/t/deps/a-1")]);
            assert!(!cmd.to_string().contains("Xdemangler"));
        }

        #[test]
        fn test_merge_command_shape() {
            let temp = TempDir::new().unwrap();
            let p = pipeline(&temp);
            let tools = ResolvedTools::Paths {
                profdata: PathBuf::from("/llvm/llvm-profdata"),
                cov: PathBuf::from("/llvm/llvm-cov"),
            };
            let cmd = p.merge_command(&tools, &[PathBuf::from("/w/coverage-1-a.profraw")]);
            let args: Vec<_> = cmd.get_args().iter().map(|a| a.to_string_lossy().into_owned()).collect();
            assert_eq!(cmd.program(), "/llvm/llvm-profdata");
            assert_eq!(args[..3], ["merge", "-sparse", "/w/coverage-1-a.profraw"]);
            assert_eq!(args[3], "-o");
            assert!(args[4].ends_with("coverage.profdata"));
        }
    }

    mod plan_tests {
        use super::*;

        #[test]
        fn test_plan_covers_every_stage() {
            let temp = TempDir::new().unwrap();
            let plan = pipeline(&temp).plan().unwrap();
            let stages: Vec<_> = plan.iter().map(|p| p.stage).collect();
            assert_eq!(stages, Stage::ALL);
            assert!(plan[0].command.is_none());
            assert!(plan[2].command.as_deref().unwrap().contains(RAW_PROFILES_PLACEHOLDER));
            assert!(plan[4].command.as_deref().unwrap().contains(TEST_BINARIES_PLACEHOLDER));
            assert!(plan[5].summary.contains("coverage.profdata"));
        }

        #[test]
        fn test_plan_keep_intermediates() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new()
                .with_root(temp.path())
                .with_keep_intermediates(true);
            let plan = CoveragePipeline::new(config, Unreachable).unwrap().plan().unwrap();
            assert_eq!(plan[5].summary, "keep raw and merged profiles");
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_invalid_config_rejected() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new()
                .with_root(temp.path())
                .with_profile_template("fixed.profraw");
            assert!(matches!(
                CoveragePipeline::new(config, Unreachable),
                Err(CovError::InvalidConfig { .. })
            ));
        }

        #[test]
        fn test_missing_root_rejected() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new().with_root(temp.path().join("absent"));
            assert!(matches!(
                CoveragePipeline::new(config, Unreachable),
                Err(CovError::PathIo { .. })
            ));
        }

        #[test]
        fn test_root_made_absolute() {
            let temp = TempDir::new().unwrap();
            let p = pipeline(&temp);
            assert!(p.config().root.is_absolute());
        }
    }

    mod clean_tests {
        use super::*;

        #[test]
        fn test_clean_removes_intermediates_only() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new().with_root(temp.path());
            std::fs::write(temp.path().join("coverage-1-a.profraw"), b"").unwrap();
            std::fs::write(temp.path().join("coverage.profdata"), b"").unwrap();
            std::fs::create_dir_all(config.output_dir_path()).unwrap();
            std::fs::write(config.report_path(), b"SF:x\nend_of_record\n").unwrap();

            let removed = clean(&config, false).unwrap();
            assert_eq!(removed.len(), 2);
            assert!(config.report_path().exists());
        }

        #[test]
        fn test_clean_all_removes_output_dir() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new().with_root(temp.path());
            std::fs::create_dir_all(config.output_dir_path()).unwrap();
            std::fs::write(config.report_path(), b"").unwrap();

            let removed = clean(&config, true).unwrap();
            assert_eq!(removed, vec![config.output_dir_path()]);
            assert!(!config.output_dir_path().exists());
        }

        #[test]
        fn test_clean_all_refuses_sibling_directory() {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("ws");
            let precious = temp.path().join("precious");
            std::fs::create_dir_all(&root).unwrap();
            std::fs::create_dir_all(&precious).unwrap();
            std::fs::write(precious.join("notes.txt"), b"keep").unwrap();

            let config = PipelineConfig::new().with_root(&root).with_output_dir("../precious");
            assert!(matches!(clean(&config, true), Err(CovError::InvalidConfig { .. })));
            assert!(precious.join("notes.txt").exists());
        }

        #[test]
        fn test_clean_nothing_to_do() {
            let temp = TempDir::new().unwrap();
            let config = PipelineConfig::new().with_root(temp.path());
            assert!(clean(&config, true).unwrap().is_empty());
        }
    }
}
