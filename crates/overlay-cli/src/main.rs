//! Overlay Janitor CLI - peer health maintenance for overlay services.

use clap::Parser;
use overlay_cli::commands;
use overlay_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> overlay_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.store.path = database;
    }

    init_tracing(&config.logging.filter);

    let formatter = Formatter::new(cli.format.map(Into::into).unwrap_or_default());

    match cli.command {
        Command::Sweep(args) => commands::execute_sweep(args, &config, &formatter).await?,
        Command::Watch(args) => commands::execute_watch(args, &config).await?,
        Command::List(args) => commands::execute_list(args, &config, &formatter).await?,
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` takes precedence over the configured filter
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
