//! In-process scenario tests for th-daemon HTTP endpoints.
//!
//! The router is driven with `tower::ServiceExt::oneshot`; no socket is
//! bound. State starts from the testkit fixture snapshot and points reloads
//! at a CSV export of a smaller calendar.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use th_daemon::{routes, state};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    st: Arc<state::AppState>,
    _data: TempDir,
}

fn harness() -> Harness {
    let data = th_testkit::csv_fixture_dir().expect("csv fixture");
    let snapshot = th_testkit::fixture_snapshot().expect("fixture snapshot");
    let st = Arc::new(state::AppState::new(
        snapshot,
        data.path().to_path_buf(),
        "test-hash".to_string(),
    ));
    Harness { st, _data: data }
}

async fn call(h: &Harness, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = routes::build_router(Arc::clone(&h.st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let body: bytes::Bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("body is not valid JSON");
    (status, json)
}

async fn get(h: &Harness, uri: &str) -> (StatusCode, serde_json::Value) {
    call(h, "GET", uri).await
}

// ---------------------------------------------------------------------------
// Health and info
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let h = harness();
    let (status, json) = get(&h, "/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "th-daemon");
}

#[tokio::test]
async fn info_reports_snapshot_counts() {
    let h = harness();
    let (status, json) = get(&h, "/v1/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config_hash"], "test-hash");
    assert_eq!(json["snapshot"]["markets"], 9);
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn markets_filter_by_pattern() {
    let h = harness();
    let (status, json) = get(&h, "/v1/markets?pattern=AR.*").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json["markets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["fin_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["AR.BCBA", "AR.BYMA", "AR.OLD"]);
}

#[tokio::test]
async fn market_lookup_follows_unless_told_not_to() {
    let h = harness();
    let (status, json) = get(&h, "/v1/markets/XBUE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["requested"], "AR.BCBA");
    assert_eq!(json["replaced"], true);
    assert_eq!(json["market"]["fin_id"], "AR.BYMA");

    let (_, json) = get(&h, "/v1/markets/XBUE?follow=false").await;
    assert_eq!(json["market"]["fin_id"], "AR.BCBA");
    assert_eq!(json["market"]["replaced_by"], "AR.BYMA");
}

#[tokio::test]
async fn unknown_market_is_404() {
    let h = harness();
    let (status, json) = get(&h, "/v1/markets/ZZ.NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert!(json["message"].as_str().unwrap().contains("ZZ.NOPE"));
}

#[tokio::test]
async fn holidays_in_range() {
    let h = harness();
    let (status, json) =
        get(&h, "/v1/markets/US.NYSE/holidays?start=2023-11-01&end=2023-11-30").await;
    assert_eq!(status, StatusCode::OK);
    let holidays = json["holidays"].as_array().unwrap();
    assert_eq!(holidays.len(), 2);
    assert_eq!(holidays[0]["date"], "2023-11-23");
    assert_eq!(holidays[0]["closed"], true);
    assert_eq!(holidays[1]["schedule_group"], "Partial");
}

#[tokio::test]
async fn schedules_grouped() {
    let h = harness();
    let (status, json) = get(&h, "/v1/markets/US.NYSE/schedules").await;
    assert_eq!(status, StatusCode::OK);
    let groups = json["groups"].as_array().unwrap();
    assert_eq!(groups[0]["name"], "Regular");
    assert_eq!(groups[0]["rules"][0]["days"], "Mon-Fri");
    assert_eq!(groups[1]["name"], "Partial");
}

#[tokio::test]
async fn phases_for_partial_day() {
    let h = harness();
    let (status, json) =
        get(&h, "/v1/markets/US.NYSE/phases?start=2023-11-24&end=2023-11-24").await;
    assert_eq!(status, StatusCode::OK);
    let primary: Vec<_> = json["phases"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["phase_type"] == "Primary Trading Session")
        .collect();
    assert_eq!(primary.len(), 1);
    assert_eq!(primary[0]["end"], "2023-11-24T13:00:00-05:00");
}

#[tokio::test]
async fn status_at_explicit_instant() {
    let h = harness();
    let (status, json) =
        get(&h, "/v1/markets/US.NYSE/status?at=2023-11-15T17:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Open");
    assert_eq!(json["until"], "2023-11-15T15:50:00-05:00");
    assert_eq!(json["next_bell"], "2023-11-16T09:30:00-05:00");
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inverted_or_missing_range_is_400() {
    let h = harness();
    let (status, json) =
        get(&h, "/v1/markets/US.NYSE/phases?start=2024-02-01&end=2024-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_range");

    let (status, json) = get(&h, "/v1/markets/US.NYSE/holidays?start=2024-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("end is required"));
}

#[tokio::test]
async fn naive_instant_is_400() {
    let h = harness();
    let (status, json) =
        get(&h, "/v1/markets/US.NYSE/status?at=2023-11-15T12:00:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_range");
}

#[tokio::test]
async fn outside_coverage_is_422() {
    let h = harness();
    let (status, json) =
        get(&h, "/v1/markets/US.NYSE/phases?start=2026-01-01&end=2026-01-02").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "coverage");
}

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn currencies_and_holidays() {
    let h = harness();
    let (_, json) = get(&h, "/v1/currencies").await;
    assert_eq!(json["currencies"].as_array().unwrap().len(), 2);

    let (status, json) = get(&h, "/v1/currencies/USD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["financial_capital_timezone"], "America/New_York");

    let (status, json) =
        get(&h, "/v1/currencies/USD/holidays?start=2024-07-01&end=2024-07-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["holidays"][0]["holiday_name"], "Independence Day");

    let (status, _) = get(&h, "/v1/currencies/JPY").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reload_swaps_in_the_export() {
    let h = harness();
    let before = h.st.snapshot.current();

    let (status, json) = call(&h, "POST", "/v1/reload").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reloaded"], true);
    assert_eq!(json["snapshot"]["markets"], 4);

    // Readers holding the old snapshot are unaffected.
    assert!(before.resolve("US.MGEX", true).is_ok());
    let (status, _) = get(&h, "/v1/markets/US.MGEX").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_reload_keeps_current_snapshot() {
    let h = harness();
    std::fs::remove_file(h._data.path().join("markets.csv")).unwrap();

    let (status, json) = call(&h, "POST", "/v1/reload").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "reload_failed");

    let (_, json) = get(&h, "/v1/info").await;
    assert_eq!(json["snapshot"]["markets"], 9);
}
