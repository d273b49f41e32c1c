//! End-to-end: mock upstreams → providers → updater → snapshot → API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceExt;

use racing_odds::api::{self, ApiState};
use racing_odds::engine::scheduler::{RacingWindow, SystemClock};
use racing_odds::engine::updater::Updater;
use racing_odds::providers::bet365::Bet365Client;
use racing_odds::providers::http::FeedCredentials;
use racing_odds::providers::william_hill::WilliamHillClient;
use racing_odds::providers::OddsSource;
use racing_odds::store::{self, SnapshotReader};
use racing_odds::types::{Bookmaker, FetchError, SkipReason};

use crate::mock_upstream::MockUpstream;

const SECRET_HEADER: &str = "x-rapidapi-proxy-secret";
const SECRET: &str = "integration-secret";

fn credentials() -> FeedCredentials {
    FeedCredentials::new(SECRET_HEADER, &SecretString::new(SECRET.to_string())).unwrap()
}

fn bet365_payload() -> Value {
    json!({"races": [
        {"league": "Cheltenham", "raceNum": 1, "horses": [
            {"na": "Kauto Star", "OD": "5/2"},
            {"na": "Denman", "OD": "SP"},
            {"na": "Imperial Commander", "OD": "7/1"}
        ]},
        {"league": "Cheltenham", "raceNum": "2", "horses": [
            {"na": "Big Buck's", "OD": "1/4"}
        ]}
    ]})
}

fn william_hill_payload() -> Value {
    json!({"races": [
        {"name": "Aintree", "settled": true, "horses": [
            {"name": "Red Rum", "active": true, "EW": {"decimal": "3.5"}},
            {"name": "Tiger Roll", "active": true, "EW": {"decimal": "6.0"}}
        ]},
        {"name": "Newbury", "settled": false, "horses": [
            {"name": "Frankel", "active": true, "EW": {"decimal": "1.5"}},
            {"name": "Frankel", "active": true, "EW": {"decimal": "1.6"}}
        ]}
    ]})
}

struct Harness {
    bet365: MockUpstream,
    william_hill: MockUpstream,
    updater: Updater,
    reader: SnapshotReader,
}

async fn harness() -> Harness {
    let bet365 = MockUpstream::start(bet365_payload()).await;
    let william_hill = MockUpstream::start(william_hill_payload()).await;
    let timeout = Duration::from_secs(5);

    let sources: Vec<Arc<dyn OddsSource>> = vec![
        Arc::new(Bet365Client::new(&bet365.url(), credentials(), timeout).unwrap()),
        Arc::new(WilliamHillClient::new(&william_hill.url(), credentials(), timeout).unwrap()),
    ];
    let (writer, reader) = store::channel();

    Harness {
        bet365,
        william_hill,
        updater: Updater::new(sources, writer),
        reader,
    }
}

fn api_state(reader: SnapshotReader) -> api::AppState {
    Arc::new(ApiState {
        snapshots: reader,
        window: RacingWindow::default(),
        clock: Arc::new(SystemClock),
    })
}

async fn get_json(app: axum::Router, uri: &str) -> Value {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_full_cycle_normalizes_both_feeds() {
    let h = harness().await;

    let report = tokio_test::assert_ok!(h.updater.run_cycle().await);
    assert_eq!(report.update_count, 1);
    assert_eq!(report.count(Bookmaker::Bet365), 3);
    assert_eq!(report.count(Bookmaker::WilliamHill), 1);
    assert!(report.failed.is_empty());

    let snap = h.reader.current().await;
    let bet365 = snap.records(Bookmaker::Bet365);
    assert_eq!(bet365[0].horse, "Kauto Star");
    assert_eq!(bet365[0].race, "Race 1 - Cheltenham");
    assert_eq!(bet365[0].odds, 3.5);
    assert_eq!(bet365[2].race, "Race 2 - Cheltenham");
    assert_eq!(bet365[2].odds, 1.25);

    let wh = snap.records(Bookmaker::WilliamHill);
    assert_eq!(wh.len(), 1);
    assert_eq!(wh[0].horse, "Frankel");
    assert_eq!(wh[0].race, "Newbury");
    assert_eq!(wh[0].odds, 1.5);

    let wh_status = snap.feed(Bookmaker::WilliamHill).unwrap();
    assert_eq!(wh_status.settled_races, 1);
    assert_eq!(wh_status.skipped.get(&SkipReason::Duplicate), Some(&1));
    let b365_status = snap.feed(Bookmaker::Bet365).unwrap();
    assert_eq!(b365_status.skipped.get(&SkipReason::StartingPrice), Some(&1));
}

#[tokio::test]
async fn test_requests_carry_shared_secret() {
    let h = harness().await;
    h.updater.run_cycle().await.unwrap();

    for upstream in [&h.bet365, &h.william_hill] {
        let requests = upstream.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].get(SECRET_HEADER).unwrap(), SECRET);
    }
    assert_eq!(h.bet365.requests()[0].get("accept").unwrap(), "*/*");
}

#[tokio::test]
async fn test_upstream_error_status_empties_feed() {
    let h = harness().await;
    h.updater.run_cycle().await.unwrap();
    assert_eq!(h.reader.current().await.count(Bookmaker::WilliamHill), 1);

    h.william_hill.set_status(StatusCode::SERVICE_UNAVAILABLE);
    let report = h.updater.run_cycle().await.unwrap();
    assert_eq!(report.failed, vec![Bookmaker::WilliamHill]);

    let snap = h.reader.current().await;
    assert_eq!(snap.update_count(), 2);
    assert_eq!(snap.count(Bookmaker::Bet365), 3);
    assert_eq!(snap.count(Bookmaker::WilliamHill), 0);
    let status = snap.feed(Bookmaker::WilliamHill).unwrap();
    assert!(!status.ok);
    assert!(status.error.as_deref().unwrap().contains("503"));

    h.william_hill.clear_status();
    h.updater.run_cycle().await.unwrap();
    assert_eq!(h.reader.current().await.count(Bookmaker::WilliamHill), 1);
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let upstream = MockUpstream::start(json!({})).await;
    upstream.set_raw_body("<html>gateway timeout</html>");

    let client = Bet365Client::new(&upstream.url(), credentials(), Duration::from_secs(5)).unwrap();
    let outcome = client.fetch().await;
    let err = tokio_test::assert_err!(outcome.result);
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn test_payload_change_replaces_records() {
    let h = harness().await;
    h.updater.run_cycle().await.unwrap();

    h.bet365.set_payload(json!({"races": [
        {"league": "Ascot", "raceNum": 4, "horses": [{"na": "Frankel", "OD": "EVS"}]}
    ]}));
    h.updater.run_cycle().await.unwrap();

    let snap = h.reader.current().await;
    assert_eq!(snap.count(Bookmaker::Bet365), 0);
    let status = snap.feed(Bookmaker::Bet365).unwrap();
    assert!(status.ok);
    assert_eq!(status.skipped.get(&SkipReason::MalformedOdds), Some(&1));
}

#[tokio::test]
async fn test_api_serves_cycle_results() {
    let h = harness().await;
    h.updater.run_cycle().await.unwrap();
    let state = api_state(h.reader.clone());

    let odds = get_json(api::build_router(state.clone()), "/odds").await;
    assert_eq!(odds["total"], 4);
    assert_eq!(odds["bet365_count"], 3);
    assert_eq!(odds["william_hill_count"], 1);

    let wh = get_json(api::build_router(state.clone()), "/william-hill").await;
    assert_eq!(wh["horses"][0]["horse"], "Frankel");
    assert_eq!(wh["horses"][0]["bookmaker"], "william_hill");

    let search = get_json(api::build_router(state.clone()), "/horse/kauto").await;
    assert_eq!(search["count"], 1);
    assert_eq!(search["matches"][0]["odds"], 3.5);

    let status = get_json(api::build_router(state), "/").await;
    assert_eq!(status["update_count"], 1);
    assert_eq!(status["feeds"]["william_hill"]["settled_races"], 1);
}

#[tokio::test]
async fn test_server_serves_over_tcp_and_shuts_down() {
    let (_writer, reader) = store::channel();
    let listener = api::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = watch::channel(false);
    let server = tokio::spawn(api::serve(listener, api_state(reader), rx));

    let base = format!("http://{addr}");
    let health = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::OK);

    let odds: Value = reqwest::get(format!("{base}/odds")).await.unwrap().json().await.unwrap();
    assert_eq!(odds["total"], 0);
    assert!(odds["last_updated"].is_null());

    tx.send(true).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not shut down")
        .unwrap();
    assert!(result.is_ok());
}
