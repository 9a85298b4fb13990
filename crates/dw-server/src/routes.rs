//! Route handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dw_core::{Category, DateTotal, DomainTotal, RawTimeRecord, Window, totals_by_date, totals_by_domain};
use dw_db::DbError;

use crate::AppState;
use crate::auth::caller_identity;

/// Handler-level failures, mapped to HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    /// The request payload was rejected.
    BadRequest(&'static str),
    /// The caller presented no valid credentials.
    Unauthorized,
    /// The record store failed; queries are read-only so there is nothing
    /// to clean up, the caller just sees a service failure.
    Storage(DbError),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "missing or invalid token"),
            Self::Storage(err) => {
                tracing::error!(error = %err, "record store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
            }
        };
        (status, Json(ErrBody { ok: false, error })).into_response()
    }
}

#[derive(Serialize)]
struct ErrBody {
    ok: bool,
    error: &'static str,
}

/// Acknowledgement returned by the ingestion endpoint.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

/// Body accepted by `POST /api/time-tracking`.
#[derive(Debug, Deserialize)]
pub struct IngestPayload {
    pub domain: String,
    pub duration_ms: i64,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

/// Ingestion endpoint. No authentication: records land without an owner.
///
/// A failure here is non-fatal to the caller by contract — the forwarder
/// drops the session and the local store keeps the durable copy.
pub async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<IngestPayload>,
) -> Result<Json<Ack>, ApiError> {
    if payload.domain.is_empty() {
        return Err(ApiError::BadRequest("domain cannot be empty"));
    }
    if payload.duration_ms < 0 {
        return Err(ApiError::BadRequest("duration_ms cannot be negative"));
    }

    let record = RawTimeRecord {
        owner_id: None,
        domain: payload.domain,
        duration_ms: payload.duration_ms,
        category: payload.category,
        occurred_at: payload.timestamp,
    };
    state.store.lock().await.insert(&record)?;
    Ok(Json(Ack { ok: true }))
}

/// Query period for the personal analytics endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    #[default]
    Week,
}

impl From<Period> for Window {
    fn from(period: Period) -> Self {
        match period {
            Period::Day => Self::Day,
            Period::Week => Self::Week,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonalParams {
    #[serde(default)]
    pub period: Period,
}

/// Window-scoped personal query. Returns the caller's raw records, not a
/// pre-aggregated view.
pub async fn personal(
    State(state): State<AppState>,
    Query(params): Query<PersonalParams>,
    headers: HeaderMap,
) -> Result<Json<Vec<RawTimeRecord>>, ApiError> {
    let caller =
        caller_identity(&headers, state.tokens.as_ref()).ok_or(ApiError::Unauthorized)?;

    let start = Window::from(params.period).start(Utc::now());
    let records = state
        .store
        .lock()
        .await
        .records_since(start, Some(&caller))?;
    Ok(Json(records))
}

/// Public daily aggregate: today's domain-grouped totals, descending.
///
/// Unauthenticated calls see the unfiltered aggregate; this is a demo view,
/// not a security boundary.
pub async fn daily(State(state): State<AppState>) -> Result<Json<Vec<DomainTotal>>, ApiError> {
    let start = Window::Day.start(Utc::now());
    let records = state.store.lock().await.records_since(start, None)?;
    Ok(Json(totals_by_domain(&records, start)))
}

/// Public weekly aggregate: trailing 7 days grouped by date, ascending.
pub async fn weekly(State(state): State<AppState>) -> Result<Json<Vec<DateTotal>>, ApiError> {
    let start = Window::Week.start(Utc::now());
    let records = state.store.lock().await.records_since(start, None)?;
    Ok(Json(totals_by_date(&records, start)))
}
