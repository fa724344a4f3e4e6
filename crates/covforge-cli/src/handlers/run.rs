//! Run command handler

use crate::commands::PipelineArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{render_report, ProgressReporter};
use covforge::{CommandRunner, CoveragePipeline, PipelineConfig, PipelineReport, SystemRunner};

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &PipelineArgs) -> CliResult<()> {
    let pipeline_config = config.pipeline_config(args)?;
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let report = run_pipeline(pipeline_config, SystemRunner::new(), &mut reporter)?;
    if let Some(hint) = mangled_hint(&report) {
        reporter.info(hint);
    }
    print!("{}", render_report(&report, args.format)?);
    Ok(())
}

fn mangled_hint(report: &PipelineReport) -> Option<&'static str> {
    (report.lcov.mangled_functions > 0)
        .then_some("Some symbols are still mangled; install the demangler with `cargo install rustfilt`")
}

/// Build the pipeline around `runner` and run every stage
pub fn run_pipeline<R: CommandRunner>(
    config: PipelineConfig,
    runner: R,
    reporter: &mut ProgressReporter,
) -> CliResult<PipelineReport> {
    let mut pipeline = CoveragePipeline::new(config, runner)?;
    tracing::info!(
        root = %pipeline.config().root.display(),
        tools = pipeline.config().llvm_tools.name(),
        "starting coverage run"
    );
    Ok(pipeline.run(reporter)?)
}
