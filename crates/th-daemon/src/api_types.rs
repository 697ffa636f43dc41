//! Request and response types for all th-daemon HTTP endpoints.
//!
//! No calendar logic lives here; handlers fill these from the snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use th_calendar::{
    Currency, CurrencyHoliday, HolidayEntry, MarketInfo, Phase, ScheduleRuleInfo, SnapshotSummary,
};

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// `start` / `end` are optional here so a missing bound surfaces as our own
/// `invalid_range` body rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternQuery {
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowQuery {
    /// Defaults to true.
    pub follow: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    /// RFC 3339 with offset; the daemon's clock when absent.
    pub at: Option<String>,
}

// ---------------------------------------------------------------------------
// /v1/health, /v1/info, /v1/reload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub config_hash: String,
    pub data_dir: String,
    pub snapshot: SnapshotSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadResponse {
    pub reloaded: bool,
    pub snapshot: SnapshotSummary,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// "not_found" | "invalid_range" | "coverage" | "data_integrity" | "reload_failed"
    pub error: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MarketListResponse {
    pub markets: Vec<MarketInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketResponse {
    /// FinID of the market the identifier matched before following.
    pub requested: String,
    pub replaced: bool,
    pub market: MarketInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct HolidaysResponse {
    pub fin_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub holidays: Vec<HolidayEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleGroupResponse {
    pub name: String,
    pub memo: Option<String>,
    pub rules: Vec<ScheduleRuleInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulesResponse {
    pub fin_id: String,
    pub groups: Vec<ScheduleGroupResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhasesResponse {
    pub fin_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub phases: Vec<Phase>,
}

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CurrenciesResponse {
    pub currencies: Vec<Currency>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyHolidaysResponse {
    pub code: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub holidays: Vec<CurrencyHoliday>,
}
