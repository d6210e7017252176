//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::config::Config;
use crate::error::Result;
use overlay_janitor::JanitorWorker;

/// Execute the watch command.
pub async fn execute_watch(args: WatchArgs, config: &Config) -> Result<()> {
    let mut janitor_config = config.janitor.clone();
    janitor_config.dry_run |= args.dry_run;

    if let Some(secs) = args.interval {
        janitor_config.sweep_interval_secs = secs;
    }

    let janitor = super::build_janitor(config, janitor_config)?;
    let mut worker = JanitorWorker::from_config(janitor);
    worker.run().await?;

    Ok(())
}
