//! Bookmaker feed providers.
//!
//! Defines the `OddsSource` trait and provides one implementation per
//! upstream feed:
//! - Bet365: fractional odds keyed by league and race number
//! - William Hill: named races with settled flags and an each-way block
//!
//! A fetch never returns an error to its caller: transport, status and
//! decode failures are logged and surface as an empty [`FeedOutcome`].

pub mod http;
pub mod bet365;
pub mod william_hill;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::normalize::NormalizedBatch;
use crate::store::{FeedStatus, FeedUpdate};
use crate::types::{Bookmaker, FetchError};

/// Abstraction over an upstream odds feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OddsSource: Send + Sync {
    /// Which bookmaker this source quotes.
    fn bookmaker(&self) -> Bookmaker;

    /// Fetch and normalize the current races. Never fails outward.
    async fn fetch(&self) -> FeedOutcome;
}

/// Result of one fetch: a normalized batch, or why there is none.
#[derive(Debug)]
pub struct FeedOutcome {
    pub bookmaker: Bookmaker,
    pub result: Result<NormalizedBatch, FetchError>,
}

impl FeedOutcome {
    /// Wrap a fetch result and log its summary.
    pub fn settle(bookmaker: Bookmaker, result: Result<NormalizedBatch, FetchError>) -> Self {
        match &result {
            Ok(batch) => info!(
                bookmaker = bookmaker.key(),
                records = batch.records.len(),
                skipped = batch.skipped_total(),
                settled_races = batch.settled_races,
                "Feed normalized"
            ),
            Err(e) => warn!(bookmaker = bookmaker.key(), error = %e, "Feed fetch failed"),
        }
        Self { bookmaker, result }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn record_count(&self) -> usize {
        self.result.as_ref().map(|b| b.records.len()).unwrap_or(0)
    }

    /// Convert into the store's per-bookmaker update. A failure publishes
    /// an empty record list with the error attached.
    pub fn into_update(self) -> FeedUpdate {
        match self.result {
            Ok(batch) => FeedUpdate {
                status: FeedStatus {
                    ok: true,
                    error: None,
                    records: batch.records.len(),
                    skipped: batch.skipped,
                    settled_races: batch.settled_races,
                },
                records: batch.records,
            },
            Err(e) => FeedUpdate {
                records: Vec::new(),
                status: FeedStatus {
                    ok: false,
                    error: Some(e.to_string()),
                    ..FeedStatus::default()
                },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
