mod error;
mod resolve;
mod schedule;
mod size;

pub use error::{ScanError, Severity};
pub use schedule::ScanScheduler;
pub use size::SizeTotals;
