//! Plan command handler

use crate::commands::PipelineArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::render_plan;
use covforge::{CoveragePipeline, SystemRunner};

/// Execute the plan command
///
/// Nothing is run except `rustc` when the sysroot tools are selected.
pub fn execute_plan(config: &CliConfig, args: &PipelineArgs) -> CliResult<()> {
    let pipeline_config = config.pipeline_config(args)?;
    let mut pipeline = CoveragePipeline::new(pipeline_config, SystemRunner::new())?;
    let plan = pipeline.plan()?;
    print!("{}", render_plan(&plan, args.format)?);
    Ok(())
}
