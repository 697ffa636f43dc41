//! Axum router and all HTTP handlers for th-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers so tests can drive the bare router.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use th_calendar::{parse_instant, parse_range, CalendarError, MarketStatus, ScheduleRuleInfo};
use th_store::StoreError;
use tracing::{debug, warn};

use crate::{
    api_types::{
        CurrenciesResponse, CurrencyHolidaysResponse, ErrorResponse, FollowQuery, HealthResponse,
        HolidaysResponse, InfoResponse, MarketListResponse, MarketResponse, PatternQuery,
        PhasesResponse, RangeQuery, ReloadResponse, ScheduleGroupResponse, SchedulesResponse,
        StatusQuery,
    },
    state::{uptime_secs, AppState},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/info", get(info_handler))
        .route("/v1/reload", post(reload))
        .route("/v1/markets", get(list_markets))
        .route("/v1/markets/:id", get(get_market))
        .route("/v1/markets/:id/holidays", get(market_holidays))
        .route("/v1/markets/:id/schedules", get(market_schedules))
        .route("/v1/markets/:id/phases", get(market_phases))
        .route("/v1/markets/:id/status", get(market_status))
        .route("/v1/currencies", get(list_currencies))
        .route("/v1/currencies/:code", get(get_currency))
        .route("/v1/currencies/:code/holidays", get(currency_holidays))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Calendar and store failures mapped onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl From<CalendarError> for ApiError {
    fn from(e: CalendarError) -> Self {
        let status = match e {
            CalendarError::NotFound { .. } => StatusCode::NOT_FOUND,
            CalendarError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            CalendarError::Coverage { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CalendarError::DataIntegrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            body: ErrorResponse {
                error: e.kind().to_string(),
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(error = %self.body.error, message = %self.body.message, "request failed");
        } else {
            debug!(error = %self.body.error, message = %self.body.message, "request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn required_range(q: &RangeQuery) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let start = q
        .start
        .as_deref()
        .ok_or_else(|| CalendarError::InvalidRange("start is required".to_string()))?;
    let end = q
        .end
        .as_deref()
        .ok_or_else(|| CalendarError::InvalidRange("end is required".to_string()))?;
    Ok(parse_range(start, end)?)
}

// ---------------------------------------------------------------------------
// GET /v1/health, GET /v1/info, POST /v1/reload
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

pub(crate) async fn info_handler(State(st): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        service: st.build.service,
        version: st.build.version,
        uptime_secs: uptime_secs(),
        config_hash: st.config_hash.clone(),
        data_dir: st.data_dir.display().to_string(),
        snapshot: st.snapshot.current().summary(),
    })
}

pub(crate) async fn reload(State(st): State<Arc<AppState>>) -> Response {
    match st.reload().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ReloadResponse {
                reloaded: true,
                snapshot: summary,
            }),
        )
            .into_response(),
        Err(StoreError::Snapshot(e)) => ApiError::from(e).into_response(),
        Err(e) => ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                error: "reload_failed".to_string(),
                message: e.to_string(),
            },
        }
        .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

pub(crate) async fn list_markets(
    State(st): State<Arc<AppState>>,
    Query(q): Query<PatternQuery>,
) -> Json<MarketListResponse> {
    let snap = st.snapshot.current();
    let markets = snap
        .list_markets(q.pattern.as_deref())
        .into_iter()
        .map(|m| snap.market_info(m))
        .collect();
    Json(MarketListResponse { markets })
}

pub(crate) async fn get_market(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<FollowQuery>,
) -> ApiResult<MarketResponse> {
    let snap = st.snapshot.current();
    let resolved = snap.resolve(&id, q.follow.unwrap_or(true))?;
    Ok(Json(MarketResponse {
        requested: resolved.requested.fin_id.clone(),
        replaced: resolved.was_replaced(),
        market: snap.market_info(resolved.market),
    }))
}

pub(crate) async fn market_holidays(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<HolidaysResponse> {
    let (start, end) = required_range(&q)?;
    let snap = st.snapshot.current();
    let market = snap.resolve(&id, true)?.market;
    let holidays = snap
        .holidays(market.id, start, end)?
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(HolidaysResponse {
        fin_id: market.fin_id.clone(),
        start,
        end,
        holidays,
    }))
}

pub(crate) async fn market_schedules(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SchedulesResponse> {
    let snap = st.snapshot.current();
    let market = snap.resolve(&id, true)?.market;
    let groups = snap
        .schedule_groups(market.id)
        .iter()
        .map(|g| ScheduleGroupResponse {
            name: g.name.clone(),
            memo: g.memo.clone(),
            rules: g.rules.iter().map(ScheduleRuleInfo::from).collect(),
        })
        .collect();
    Ok(Json(SchedulesResponse {
        fin_id: market.fin_id.clone(),
        groups,
    }))
}

pub(crate) async fn market_phases(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<PhasesResponse> {
    let (start, end) = required_range(&q)?;
    let snap = st.snapshot.current();
    let market = snap.resolve(&id, true)?.market;
    let phases = snap.expand(market.id, start, end)?;
    Ok(Json(PhasesResponse {
        fin_id: market.fin_id.clone(),
        start,
        end,
        phases,
    }))
}

pub(crate) async fn market_status(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<StatusQuery>,
) -> ApiResult<MarketStatus> {
    let at = match q.at.as_deref() {
        Some(raw) => parse_instant(raw)?,
        None => Utc::now().fixed_offset(),
    };
    let snap = st.snapshot.current();
    let market = snap.resolve(&id, true)?.market;
    Ok(Json(snap.status_at(market.id, at)?))
}

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

pub(crate) async fn list_currencies(State(st): State<Arc<AppState>>) -> Json<CurrenciesResponse> {
    let snap = st.snapshot.current();
    Json(CurrenciesResponse {
        currencies: snap.currencies().into_iter().cloned().collect(),
    })
}

pub(crate) async fn get_currency(
    State(st): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<th_calendar::Currency> {
    let snap = st.snapshot.current();
    Ok(Json(snap.currency(&code)?.clone()))
}

pub(crate) async fn currency_holidays(
    State(st): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<CurrencyHolidaysResponse> {
    let (start, end) = required_range(&q)?;
    let snap = st.snapshot.current();
    let holidays = snap
        .currency_holidays(&code, start, end)?
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(CurrencyHolidaysResponse {
        code,
        start,
        end,
        holidays,
    }))
}
