//! Snapshot store: the single process-wide view of current odds.
//!
//! The store is split into a [`SnapshotWriter`] (owned by the update
//! orchestrator, not cloneable) and any number of [`SnapshotReader`]s.
//! Each publish swaps in a whole new [`AggregateSnapshot`] behind an `Arc`,
//! so a reader holds either the previous or the new snapshot, never a mix.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{Bookmaker, OddsRecord, SkipReason};

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Per-bookmaker diagnostics for the cycle that produced a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedStatus {
    /// Whether the upstream fetch itself succeeded.
    pub ok: bool,
    /// Fetch failure, when `ok` is false.
    pub error: Option<String>,
    pub records: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub settled_races: usize,
}

/// Latest normalized odds for every bookmaker.
#[derive(Debug, Clone, Default)]
pub struct AggregateSnapshot {
    records: BTreeMap<Bookmaker, Vec<OddsRecord>>,
    feeds: BTreeMap<Bookmaker, FeedStatus>,
    last_updated: Option<DateTime<Utc>>,
    update_count: u64,
}

impl AggregateSnapshot {
    /// Records for one bookmaker, in feed order.
    pub fn records(&self, bookmaker: Bookmaker) -> &[OddsRecord] {
        self.records.get(&bookmaker).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All records: Bet365 first, then William Hill.
    pub fn combined(&self) -> impl Iterator<Item = &OddsRecord> + '_ {
        Bookmaker::ALL.into_iter().flat_map(move |b| self.records(b).iter())
    }

    pub fn count(&self, bookmaker: Bookmaker) -> usize {
        self.records(bookmaker).len()
    }

    pub fn total(&self) -> usize {
        Bookmaker::ALL.iter().map(|b| self.count(*b)).sum()
    }

    pub fn feed(&self, bookmaker: Bookmaker) -> Option<&FeedStatus> {
        self.feeds.get(&bookmaker)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Records whose horse name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&OddsRecord> {
        let needle = query.to_lowercase();
        self.combined()
            .filter(|r| r.horse.to_lowercase().contains(&needle))
            .collect()
    }
}

/// One bookmaker's contribution to a new snapshot.
#[derive(Debug, Clone, Default)]
pub struct FeedUpdate {
    pub records: Vec<OddsRecord>,
    pub status: FeedStatus,
}

// ---------------------------------------------------------------------------
// Store handles
// ---------------------------------------------------------------------------

type Cell = Arc<RwLock<Arc<AggregateSnapshot>>>;

/// Create an empty store and return its writer and a reader.
pub fn channel() -> (SnapshotWriter, SnapshotReader) {
    let cell: Cell = Arc::new(RwLock::new(Arc::new(AggregateSnapshot::default())));
    (
        SnapshotWriter { cell: cell.clone() },
        SnapshotReader { cell },
    )
}

/// Exclusive publishing handle.
#[derive(Debug)]
pub struct SnapshotWriter {
    cell: Cell,
}

impl SnapshotWriter {
    /// Replace the snapshot with this cycle's feeds.
    ///
    /// Bookmakers absent from `feeds` publish an empty list. The update
    /// counter always advances by one.
    pub async fn publish(
        &self,
        feeds: BTreeMap<Bookmaker, FeedUpdate>,
        at: DateTime<Utc>,
    ) -> Arc<AggregateSnapshot> {
        let mut next = AggregateSnapshot {
            last_updated: Some(at),
            ..AggregateSnapshot::default()
        };
        for (bookmaker, update) in feeds {
            next.records.insert(bookmaker, update.records);
            next.feeds.insert(bookmaker, update.status);
        }

        let mut guard = self.cell.write().await;
        next.update_count = guard.update_count + 1;
        let next = Arc::new(next);
        *guard = next.clone();
        next
    }
}

/// Shared read handle; cloning is cheap.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    cell: Cell,
}

impl SnapshotReader {
    /// The current snapshot. The returned view never changes.
    pub async fn current(&self) -> Arc<AggregateSnapshot> {
        self.cell.read().await.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
