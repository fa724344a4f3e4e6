//! Command handlers - extracted from main.rs for testability
//!
//! Each handler builds the pipeline configuration from the config file and
//! flags, drives the library, and prints its summary to stdout.

pub mod clean;
pub mod plan;
pub mod run;

pub use clean::execute_clean;
pub use plan::execute_plan;
pub use run::{execute_run, run_pipeline};
