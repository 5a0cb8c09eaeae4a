// Dashboard domain models and health status mapping
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::reading::Reading;

/// Threshold-mapped health band. The same mapping drives the status chip,
/// the avatar glow color, and the happiness chart color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Alert,
    Warning,
    Nominal,
}

impl HealthStatus {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            HealthStatus::Alert
        } else if score < 70.0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Nominal
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            HealthStatus::Alert => "#ef4444",
            HealthStatus::Warning => "#facc15",
            HealthStatus::Nominal => "#22c55e",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            HealthStatus::Alert => "ALERT • Critically low health! Check soil and light.",
            HealthStatus::Warning => "WARNING • Health below optimal. Needs attention.",
            HealthStatus::Nominal => "INFO • Conditions stable and optimal.",
        }
    }
}

/// Summary of the latest reading for the avatar and status chip.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCard {
    pub timestamp: NaiveDateTime,
    pub happiness: f64,
    pub soil_pct: f64,
    pub light_pct: f64,
    pub status: HealthStatus,
    pub color: &'static str,
    pub message: &'static str,
}

impl StatusCard {
    pub fn from_latest(latest: &Reading) -> Self {
        let status = HealthStatus::from_score(latest.happiness);
        Self {
            timestamp: latest.timestamp,
            happiness: latest.happiness,
            soil_pct: latest.soil_pct,
            light_pct: latest.light_pct,
            status,
            color: status.color(),
            message: status.message(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<TimeSeriesPoint>,
}

impl SeriesData {
    pub fn new(id: String, name: String, color: Option<String>, points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            id,
            name,
            color,
            points,
        }
    }
}

/// Shaded reference band between two horizontal lines, drawn behind a chart.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IdealBand {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    MultiLine,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub kind: ChartKind,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub band: Option<IdealBand>,
    pub series: Vec<SeriesData>,
}

/// Severity of a user-visible notice; a warning reads as "no data in
/// range", an error reads as "source unreachable". Both leave the
/// dashboard empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The assembled page payload. When the reading table resolves empty, the
/// dashboard halts early: a notice is set and status/span/charts stay empty.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<DateSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateSpan>,
    pub charts: Vec<ChartData>,
}

impl Dashboard {
    pub fn unavailable(title: String, notice: Notice) -> Self {
        Self {
            title,
            notice: Some(notice),
            status: None,
            span: None,
            range: None,
            charts: Vec::new(),
        }
    }
}
