// HTTP request handlers
use crate::domain::dashboard::{Dashboard, Notice};
use crate::domain::reading::Reading;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Lookback window plus the optional user-picked date sub-range.
#[derive(Deserialize)]
pub struct RangeQuery {
    pub days: Option<u32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_LOOKBACK_DAYS)
    }

    fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Assemble the dashboard for the requested window. Failures surface as a
/// notice inside the payload, never as an error status.
pub async fn get_dashboard(
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Dashboard> {
    let dashboard = state
        .dashboard_service
        .build_dashboard(query.days(), query.range())
        .await;
    Json(dashboard)
}

#[derive(Serialize)]
pub struct ReadingsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    pub readings: Vec<Reading>,
}

/// Raw reading rows for the window, optionally sliced to a date sub-range
/// (inclusive on both ends).
pub async fn get_readings(
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<ReadingsResponse> {
    let (table, notice) = state.dashboard_service.load_readings(query.days()).await;

    let table = match query.range() {
        Some((start, end)) => table.slice_days(start, end),
        None => table,
    };

    Json(ReadingsResponse {
        notice,
        readings: table.rows().to_vec(),
    })
}
