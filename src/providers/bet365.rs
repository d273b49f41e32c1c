//! Bet365 horse-racing feed.
//!
//! Endpoint: `GET {url}` → `{"races": [...]}` (see `normalize::bet365`).
//! Auth: shared-secret proxy header; the feed also expects `accept: */*`.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;
use tracing::error;

use super::http::{FeedClient, FeedCredentials};
use super::{FeedOutcome, OddsSource};
use crate::normalize::{self, NormalizedBatch};
use crate::types::Bookmaker;

/// Bet365 feed client.
#[derive(Debug)]
pub struct Bet365Client {
    feed: FeedClient,
}

impl Bet365Client {
    pub fn new(url: &str, credentials: FeedCredentials, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        let feed = FeedClient::new(url, credentials, timeout, headers)?;
        Ok(Self { feed })
    }
}

#[async_trait]
impl OddsSource for Bet365Client {
    fn bookmaker(&self) -> Bookmaker {
        Bookmaker::Bet365
    }

    async fn fetch(&self) -> FeedOutcome {
        let result = self.feed.get_json().await.map(|payload| {
            let batch = normalize::normalize(Bookmaker::Bet365, &payload);
            report_empty_parse(&payload, &batch);
            batch
        });
        FeedOutcome::settle(Bookmaker::Bet365, result)
    }
}

/// Races came back but nothing parsed: usually a schema change upstream.
fn report_empty_parse(payload: &serde_json::Value, batch: &NormalizedBatch) {
    let races = payload
        .get("races")
        .and_then(|r| r.as_array())
        .map(Vec::len)
        .unwrap_or(0);
    if races > 0 && batch.records.is_empty() {
        let sample = payload["races"][0]["horses"][0].to_string();
        error!(
            races,
            skipped = ?batch.skipped,
            sample_horse = %sample,
            "Bet365 returned races but no runners parsed"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
