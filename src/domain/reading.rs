// Sensor reading domain models
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One timestamped row of sensor values. Timestamps are zone-naive local
/// times (converted once at ingestion); percentages are always in [0, 100].
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    /// Raw soil counts (lower = wetter). Only the synthetic source carries raws.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_raw: Option<i64>,
    /// Raw light counts (higher = brighter).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_raw: Option<i64>,
    pub soil_pct: f64,
    pub light_pct: f64,
    pub happiness: f64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, soil_pct: f64, light_pct: f64, happiness: f64) -> Self {
        Self {
            timestamp,
            soil_raw: None,
            light_raw: None,
            soil_pct,
            light_pct,
            happiness,
        }
    }
}

/// Immutable table of readings, ordered by ascending timestamp. Produced
/// wholesale once per cache cycle and never patched incrementally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadingTable {
    rows: Vec<Reading>,
}

impl ReadingTable {
    pub fn new(mut rows: Vec<Reading>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        Self { rows }
    }

    /// An empty table still carries the full column set; callers must treat
    /// it as a valid, non-fatal outcome.
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    /// Most recent reading, used for the status card.
    pub fn latest(&self) -> Option<&Reading> {
        self.rows.last()
    }

    /// Earliest and latest dates with data, constraining the range picker.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some((first.timestamp.date(), last.timestamp.date()))
    }

    /// Sub-table covering the date range [start, end], both days inclusive.
    pub fn slice_days(&self, start: NaiveDate, end: NaiveDate) -> ReadingTable {
        let rows = self
            .rows
            .iter()
            .filter(|r| {
                let date = r.timestamp.date();
                date >= start && date <= end
            })
            .cloned()
            .collect();
        Self { rows }
    }
}
