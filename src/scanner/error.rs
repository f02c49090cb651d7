use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinError;

use super::size::SizeTotals;
use crate::config::ConfigError;

/// Whether an error ends the run loop or only degrades one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Partial,
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("error resolving path pattern {pattern}: {reason}")]
    PathResolution { pattern: String, reason: String },
    #[error("error getting stats for {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error walking {} (partial sizes kept): {source}", .path.display())]
    Traversal {
        path: PathBuf,
        totals: SizeTotals,
        #[source]
        source: ignore::Error,
    },
    #[error("error publishing event for {}: {source}", .path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("size task for {} did not finish: {source}", .path.display())]
    Task {
        path: PathBuf,
        #[source]
        source: JoinError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ScanError {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Traversal { .. } => Severity::Partial,
            Self::PathResolution { .. }
            | Self::Stat { .. }
            | Self::Publish { .. }
            | Self::Task { .. }
            | Self::Config(_) => Severity::Fatal,
        }
    }

    /// Sums accumulated before a traversal failure.
    pub const fn partial_totals(&self) -> Option<SizeTotals> {
        match self {
            Self::Traversal { totals, .. } => Some(*totals),
            _ => None,
        }
    }
}
