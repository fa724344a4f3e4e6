//! covforge: source-based coverage reports for Rust workspaces
//!
//! Runs the test suite with `-C instrument-coverage`, merges the per-process
//! raw profiles with `llvm-profdata`, finds the test binaries cargo built and
//! exports an lcov report with `llvm-cov`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       COVFORGE Pipeline                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  PipelineConfig ──► CoveragePipeline ──► CommandRunner ──► tools  │
//! │                          │                                       │
//! │                          ├─ profraw   (raw profile discovery)    │
//! │                          ├─ artifacts (cargo JSON messages)      │
//! │                          ├─ toolchain (llvm tool resolution)     │
//! │                          └─ lcov      (report shape checks)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use covforge::{CoveragePipeline, NoopObserver, PipelineConfig, SystemRunner};
//!
//! let mut pipeline = CoveragePipeline::new(PipelineConfig::default(), SystemRunner::new())?;
//! let report = pipeline.run(&mut NoopObserver)?;
//! println!("{} source files in {}", report.lcov.records(), report.report_path.display());
//! # Ok::<(), covforge::CovError>(())
//! ```

#![warn(missing_docs)]

pub mod artifacts;
pub mod command;
pub mod config;
pub mod lcov;
pub mod pipeline;
pub mod profraw;
mod result;
pub mod toolchain;

pub use artifacts::{is_debug_symbol_bundle, test_binaries, CargoArtifact};
pub use command::{run_checked, Capture, CommandOutput, CommandRunner, SystemRunner, ToolCommand};
pub use config::{LlvmTools, PipelineConfig, DEFAULT_CONFIG_FILE};
pub use lcov::LcovSummary;
pub use pipeline::{
    clean, CoveragePipeline, NoopObserver, PipelineReport, PlannedStage, Stage, StageObserver,
    StageTiming,
};
pub use profraw::{find_raw_profiles, ProfileTemplate};
pub use result::{CovError, CovResult};
pub use toolchain::ResolvedTools;
