use std::fs;
use std::path::Path;
use std::time::Duration;

use bytesize::ByteSize;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::resolve::{GlobResolver, PathResolver};
use super::size::calculate_size;
use super::{ScanError, Severity};
use crate::config::Config;
use crate::output::{Publisher, SizeEvent};

/// Periodically scans every configured path and publishes one event per
/// resolved entry. Ticks never overlap; a slow tick delays the next one.
pub struct ScanScheduler<P, R = GlobResolver> {
    config: Config,
    publisher: P,
    resolver: R,
    cancel_token: CancellationToken,
}

impl<P: Publisher> ScanScheduler<P> {
    pub fn new(config: Config, publisher: P, cancel_token: CancellationToken) -> Self {
        Self {
            config,
            publisher,
            resolver: GlobResolver,
            cancel_token,
        }
    }
}

impl<P: Publisher, R: PathResolver> ScanScheduler<P, R> {
    pub fn with_resolver<R2: PathResolver>(self, resolver: R2) -> ScanScheduler<P, R2> {
        ScanScheduler {
            config: self.config,
            publisher: self.publisher,
            resolver,
            cancel_token: self.cancel_token,
        }
    }

    /// Token shared with anything that needs to stop the loop (e.g. a signal handler).
    pub fn stop_handle(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Requests termination. Safe to call any number of times.
    #[allow(dead_code)] // The binary stops through stop_handle() from its signal task
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    #[cfg(test)]
    pub const fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Runs until stopped (`Ok`) or until a fatal error.
    ///
    /// A stop requested mid-tick takes effect once the tick finishes.
    pub async fn run(&mut self) -> Result<(), ScanError> {
        self.config.validate()?;
        let mut ticker = scan_ticker(self.config.period);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!("Stop requested, leaving scan loop");
                    return Ok(());
                }

                _ = ticker.tick() => {}
            }

            if let Err(err) = self.run_tick().await {
                error!("{err}");
                return Err(err);
            }
        }
    }

    /// Runs a single tick immediately, unless already stopped.
    pub async fn run_once(&mut self) -> Result<(), ScanError> {
        if self.cancel_token.is_cancelled() {
            return Ok(());
        }
        self.run_tick().await.map(|_| ()).inspect_err(|err| error!("{err}"))
    }

    /// Scans every configured pattern in order. Returns the number of events
    /// published.
    pub async fn run_tick(&mut self) -> Result<usize, ScanError> {
        let mut published = 0;

        for pattern in self.config.paths.clone() {
            let entries = self.resolver.expand(&pattern)?;
            if entries.is_empty() {
                debug!(pattern = %pattern, "Pattern matched nothing");
            }

            for entry in entries {
                let metadata = fs::metadata(&entry).map_err(|source| ScanError::Stat {
                    path: entry.clone(),
                    source,
                })?;

                if metadata.is_dir() {
                    self.estimate_and_publish(&entry).await?;
                    published += 1;
                } else if metadata.is_file() {
                    if self.config.directories_only {
                        debug!(path = %entry.display(), "Skipping file in directories-only mode");
                        continue;
                    }
                    self.estimate_and_publish(&entry).await?;
                    published += 1;
                } else {
                    debug!(path = %entry.display(), "Skipping special file");
                }
            }
        }

        Ok(published)
    }

    async fn estimate_and_publish(&mut self, path: &Path) -> Result<(), ScanError> {
        info!("Calculating path {} size...", path.display());

        let totals = match calculate_size(path).await {
            Ok(totals) => totals,
            Err(err) => match (err.severity(), err.partial_totals()) {
                (Severity::Partial, Some(totals)) => {
                    warn!("{err}");
                    totals
                }
                _ => return Err(err),
            },
        };

        info!(
            real = totals.real,
            billed = totals.billed,
            "{}: {} real, {} metered",
            path.display(),
            ByteSize(totals.real),
            ByteSize(totals.billed)
        );

        let event = SizeEvent::new(path, totals);
        self.publisher
            .publish(&event)
            .map_err(|source| ScanError::Publish {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// First tick one period from now; ticks missed by a slow scan are dropped.
fn scan_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
