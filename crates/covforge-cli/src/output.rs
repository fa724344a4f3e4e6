//! Output formatting and progress reporting

use clap::ValueEnum;
use console::{style, Term};
use covforge::{CovError, PipelineReport, PlannedStage, Stage, StageObserver};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

/// Output format for summaries
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Stage progress on stderr
///
/// Stages whose tools stream to the terminal (`cargo test`, the merge and
/// discovery runs) only get a header line; the quiet stages get a spinner.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    fn start_spinner(&mut self, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a stage header
    pub fn header(&self, stage: Stage) {
        if self.quiet {
            return;
        }

        let step = format!("[{}/{}]", stage.position(), Stage::ALL.len());
        let line = if self.use_color {
            format!("{} {}", style(step).dim(), style(stage.description()).bold())
        } else {
            format!("{step} {}", stage.description())
        };
        let _ = self.term.write_line(&line);
    }
}

const fn streams_output(stage: Stage) -> bool {
    matches!(stage, Stage::Test | Stage::Merge | Stage::Discover)
}

impl StageObserver for ProgressReporter {
    fn stage_started(&mut self, stage: Stage) {
        if self.quiet {
            return;
        }
        if streams_output(stage) {
            self.header(stage);
        } else {
            let step = format!("[{}/{}]", stage.position(), Stage::ALL.len());
            self.start_spinner(format!("{step} {}", stage.description()));
        }
    }

    fn stage_finished(&mut self, stage: Stage, elapsed: Duration) {
        self.stop_spinner();
        self.success(&format!("{stage} ({})", HumanDuration(elapsed)));
    }

    fn stage_failed(&mut self, stage: Stage, error: &CovError) {
        self.stop_spinner();
        self.failure(&failure_line(stage, error));
    }
}

/// Tool errors already lead with their stage
fn failure_line(stage: Stage, error: &CovError) -> String {
    match error {
        CovError::ToolSpawn { .. } | CovError::ToolFailed { .. } => error.to_string(),
        _ => format!("{stage}: {error}"),
    }
}

/// Run summary
pub fn render_report(report: &PipelineReport, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "Coverage report: {}", report.report_path.display());
            let _ = writeln!(out, "  Source files:  {}", report.lcov.records());
            let _ = writeln!(out, "  Functions:     {}", report.lcov.functions);
            if report.lcov.mangled_functions > 0 {
                let _ = writeln!(out, "  Still mangled: {}", report.lcov.mangled_functions);
            }
            let _ = writeln!(out, "  Test binaries: {}", report.test_binaries.len());
            let _ = writeln!(out, "  Raw profiles:  {}", report.raw_profiles);
            let _ = writeln!(out, "  Cleaned up:    {} files", report.removed_intermediates);
            let _ = writeln!(out, "  Duration:      {:.2}s", report.duration.as_secs_f64());
            Ok(out)
        }
    }
}

/// Planned stages
pub fn render_plan(plan: &[PlannedStage], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(plan),
        OutputFormat::Text => {
            let mut out = String::new();
            for planned in plan {
                let _ = writeln!(
                    out,
                    "[{}/{}] {}: {}",
                    planned.stage.position(),
                    plan.len(),
                    planned.stage,
                    planned.summary
                );
                if let Some(command) = &planned.command {
                    let _ = writeln!(out, "      $ {command}");
                }
            }
            Ok(out)
        }
    }
}

/// Paths deleted by `clean`
#[must_use]
pub fn render_removed(removed: &[PathBuf]) -> String {
    if removed.is_empty() {
        return "Nothing to clean\n".to_string();
    }
    let mut out = String::new();
    for path in removed {
        let _ = writeln!(out, "removed {}", path.display());
    }
    out
}
