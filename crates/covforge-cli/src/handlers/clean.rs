//! Clean command handler

use crate::commands::CleanArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::render_removed;

/// Execute the clean command
pub fn execute_clean(config: &CliConfig, args: &CleanArgs) -> CliResult<()> {
    let pipeline_config = config.clean_config(args)?;
    let removed = covforge::clean(&pipeline_config, args.all)?;
    if !config.verbosity.is_quiet() {
        print!("{}", render_removed(&removed));
    }
    Ok(())
}
