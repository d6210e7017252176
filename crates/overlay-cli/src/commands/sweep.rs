//! Sweep command implementation.

use crate::cli::SweepArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the sweep command.
pub async fn execute_sweep(args: SweepArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut janitor_config = config.janitor.clone();
    janitor_config.dry_run |= args.dry_run;

    let janitor = super::build_janitor(config, janitor_config)?;
    let report = janitor.run().await?;

    println!("{}", formatter.format_report(&report)?);

    Ok(())
}
