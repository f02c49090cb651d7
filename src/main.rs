mod cli;
mod config;
mod logging;
mod output;
mod scanner;

use std::fs::OpenOptions;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use config::Config;
use output::JsonLinesPublisher;
use scanner::ScanScheduler;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logger();

    let mut config = Config::load(args.config.as_deref()).context("Error reading config file")?;
    args.apply_overrides(&mut config);

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Error opening output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let cancel_token = CancellationToken::new();
    let mut scheduler = ScanScheduler::new(config, JsonLinesPublisher::new(writer), cancel_token);

    // Handle Ctrl+C gracefully
    let cancel_clone = scheduler.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    if args.once {
        scheduler.run_once().await?;
    } else {
        info!("efs-meter is running! Hit CTRL-C to stop it.");
        scheduler.run().await?;
    }

    Ok(())
}
