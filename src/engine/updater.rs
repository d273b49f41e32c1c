//! Update orchestrator.
//!
//! Runs every configured feed concurrently, waits for all of them, and
//! publishes one new snapshot built only from this cycle's results. A
//! failed feed publishes an empty list rather than keeping stale quotes.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::providers::OddsSource;
use crate::store::SnapshotWriter;
use crate::types::Bookmaker;

/// Summary of one completed update cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub update_count: u64,
    pub timestamp: DateTime<Utc>,
    pub counts: BTreeMap<Bookmaker, usize>,
    /// Feeds whose fetch failed this cycle.
    pub failed: Vec<Bookmaker>,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count(&self, bookmaker: Bookmaker) -> usize {
        self.counts.get(&bookmaker).copied().unwrap_or(0)
    }
}

/// Owns the snapshot writer and the feed sources.
pub struct Updater {
    sources: Vec<Arc<dyn OddsSource>>,
    writer: SnapshotWriter,
}

impl Updater {
    pub fn new(sources: Vec<Arc<dyn OddsSource>>, writer: SnapshotWriter) -> Self {
        Self { sources, writer }
    }

    /// Fetch all feeds concurrently and publish the combined snapshot.
    ///
    /// Errors only when a fetch task panics; nothing is published then.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let tasks: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                (source.bookmaker(), tokio::spawn(async move { source.fetch().await }))
            })
            .collect();

        // Await every task before deciding, so no fetch is left running.
        let mut joined = Vec::with_capacity(tasks.len());
        for (bookmaker, task) in tasks {
            joined.push((bookmaker, task.await));
        }

        let mut feeds = BTreeMap::new();
        let mut failed = Vec::new();
        let mut counts = BTreeMap::new();
        let mut panicked = Vec::new();

        for (bookmaker, result) in joined {
            match result {
                Ok(outcome) => {
                    if !outcome.is_ok() {
                        failed.push(bookmaker);
                    }
                    counts.insert(bookmaker, outcome.record_count());
                    feeds.insert(bookmaker, outcome.into_update());
                }
                Err(e) => {
                    error!(bookmaker = bookmaker.key(), error = %e, "Feed task aborted");
                    panicked.push(bookmaker.key());
                }
            }
        }

        if !panicked.is_empty() {
            return Err(anyhow!("feed task failed for {}", panicked.join(", ")));
        }

        let timestamp = Utc::now();
        let snapshot = self.writer.publish(feeds, timestamp).await;

        let report = CycleReport {
            update_count: snapshot.update_count(),
            timestamp,
            counts,
            failed,
        };

        info!(
            update = report.update_count,
            bet365 = report.count(Bookmaker::Bet365),
            william_hill = report.count(Bookmaker::WilliamHill),
            total = report.total(),
            failed = report.failed.len(),
            "Odds update published"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
