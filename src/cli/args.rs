use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "efs-meter")]
#[command(about = "Periodically report real and EFS-metered sizes of configured paths")]
#[command(version)]
pub struct Args {
    /// Config file (TOML). Defaults to ./efs-meter.toml when present
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Write events to this file instead of stdout (appends)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Scan once and exit instead of running periodically
    #[arg(long)]
    pub once: bool,

    /// Only report directories, skipping top-level files
    #[arg(long)]
    pub directories_only: bool,
}

impl Args {
    pub fn apply_overrides(&self, config: &mut crate::config::Config) {
        if self.directories_only {
            config.directories_only = true;
        }
    }
}
