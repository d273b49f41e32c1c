//! Read API route handlers.
//!
//! All endpoints return JSON and always succeed; an upstream outage shows
//! up as empty lists here and as a failed feed in the `/` status.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::coverage::{self, CoverageReport};
use crate::engine::scheduler::{Clock, PollState, RacingWindow};
use crate::store::{FeedStatus, SnapshotReader};
use crate::types::{Bookmaker, OddsRecord};

const SERVICE_NAME: &str = "Racing WIN Odds API";

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub snapshots: SnapshotReader,
    pub window: RacingWindow,
    pub clock: Arc<dyn Clock>,
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub status: String,
    pub state: PollState,
    pub racing_hours: String,
    pub current_time_utc: String,
    pub total_horses: usize,
    pub bet365_horses: usize,
    pub william_hill_horses: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub update_count: u64,
    pub feeds: BTreeMap<Bookmaker, FeedStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OddsResponse {
    pub horses: Vec<OddsRecord>,
    pub total: usize,
    pub bet365_count: usize,
    pub william_hill_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmakerOddsResponse {
    pub horses: Vec<OddsRecord>,
    pub count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HorseSearchResponse {
    pub query: String,
    pub matches: Vec<OddsRecord>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snap = state.snapshots.current().await;
    let now = state.clock.now();
    let poll_state = state.window.state_at(now);

    let feeds = Bookmaker::ALL
        .iter()
        .filter_map(|b| snap.feed(*b).map(|f| (*b, f.clone())))
        .collect();

    Json(StatusResponse {
        service: SERVICE_NAME,
        status: poll_state.to_string(),
        state: poll_state,
        racing_hours: state.window.label(),
        current_time_utc: now.format("%H:%M").to_string(),
        total_horses: snap.total(),
        bet365_horses: snap.count(Bookmaker::Bet365),
        william_hill_horses: snap.count(Bookmaker::WilliamHill),
        last_updated: snap.last_updated(),
        update_count: snap.update_count(),
        feeds,
    })
}

/// GET /odds
pub async fn get_all_odds(State(state): State<AppState>) -> Json<OddsResponse> {
    let snap = state.snapshots.current().await;
    let horses: Vec<OddsRecord> = snap.combined().cloned().collect();

    Json(OddsResponse {
        total: horses.len(),
        horses,
        bet365_count: snap.count(Bookmaker::Bet365),
        william_hill_count: snap.count(Bookmaker::WilliamHill),
        last_updated: snap.last_updated(),
    })
}

async fn bookmaker_odds(state: &ApiState, bookmaker: Bookmaker) -> BookmakerOddsResponse {
    let snap = state.snapshots.current().await;
    let horses = snap.records(bookmaker).to_vec();
    BookmakerOddsResponse {
        count: horses.len(),
        horses,
        last_updated: snap.last_updated(),
    }
}

/// GET /bet365
pub async fn get_bet365(State(state): State<AppState>) -> Json<BookmakerOddsResponse> {
    Json(bookmaker_odds(&state, Bookmaker::Bet365).await)
}

/// GET /william-hill
pub async fn get_william_hill(State(state): State<AppState>) -> Json<BookmakerOddsResponse> {
    Json(bookmaker_odds(&state, Bookmaker::WilliamHill).await)
}

/// GET /horse/:name
pub async fn find_horse(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<HorseSearchResponse> {
    let snap = state.snapshots.current().await;
    let matches: Vec<OddsRecord> = snap.search(&name).into_iter().cloned().collect();

    Json(HorseSearchResponse {
        query: name,
        count: matches.len(),
        matches,
    })
}

/// GET /compare
pub async fn get_coverage(State(state): State<AppState>) -> Json<CoverageReport> {
    let snap = state.snapshots.current().await;
    Json(coverage::compare(&snap))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
