mod stream;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scanner::SizeTotals;

pub use stream::JsonLinesPublisher;

/// Value of the `type` field on every event.
pub const EVENT_TYPE: &str = "efs-meter";

/// One size report for a top-level path.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SizeEvent {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub path: PathBuf,
    #[serde(rename = "size.real")]
    pub real: u64,
    #[serde(rename = "size.efsmetered")]
    pub efs_metered: u64,
}

impl SizeEvent {
    pub fn new(path: &Path, totals: SizeTotals) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: EVENT_TYPE,
            path: path.to_path_buf(),
            real: totals.real,
            efs_metered: totals.billed,
        }
    }
}

/// Sink for size events.
pub trait Publisher {
    fn publish(&mut self, event: &SizeEvent) -> io::Result<()>;
}
