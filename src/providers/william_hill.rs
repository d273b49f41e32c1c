//! William Hill horse-racing feed.
//!
//! Endpoint: `GET {url}` → `{"races": [...]}` (see `normalize::william_hill`).
//! Auth: shared-secret proxy header.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::warn;

use super::http::{FeedClient, FeedCredentials};
use super::{FeedOutcome, OddsSource};
use crate::normalize;
use crate::types::{Bookmaker, SkipReason};

/// A batch this large after dedup means the dedup key stopped matching.
const SUSPICIOUS_BATCH_SIZE: usize = 1000;

/// William Hill feed client.
#[derive(Debug)]
pub struct WilliamHillClient {
    feed: FeedClient,
}

impl WilliamHillClient {
    pub fn new(url: &str, credentials: FeedCredentials, timeout: Duration) -> Result<Self> {
        let feed = FeedClient::new(url, credentials, timeout, HeaderMap::new())?;
        Ok(Self { feed })
    }
}

#[async_trait]
impl OddsSource for WilliamHillClient {
    fn bookmaker(&self) -> Bookmaker {
        Bookmaker::WilliamHill
    }

    async fn fetch(&self) -> FeedOutcome {
        let result = self.feed.get_json().await.map(|payload| {
            let batch = normalize::normalize(Bookmaker::WilliamHill, &payload);
            if batch.records.len() > SUSPICIOUS_BATCH_SIZE {
                warn!(
                    records = batch.records.len(),
                    duplicates = batch.skipped_for(SkipReason::Duplicate),
                    "William Hill batch unusually large after dedup"
                );
            }
            batch
        });
        FeedOutcome::settle(Bookmaker::WilliamHill, result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
