//! gpt-saver - bookmarks for individual chat messages
//!
#![doc = "Main entry point for the gpt-saver CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gpt_saver::cli::Cli;
use gpt_saver::commands;
use gpt_saver::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref(), &cli)?;
    config.validate()?;

    if let Err(e) = commands::run(cli.command, config).await {
        tracing::error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

/// Initialize tracing; `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "gpt_saver=debug"
    } else {
        "gpt_saver=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
