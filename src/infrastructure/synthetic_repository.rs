// Synthetic repository implementation (demo variant)
use crate::application::reading_repository::{FetchError, ReadingRepository};
use crate::domain::reading::ReadingTable;
use crate::domain::scoring::ScoringEngine;
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use rand::Rng;

/// Generates hourly demo readings instead of querying a store: raw counts
/// drawn uniformly over the calibration ranges, then scored locally.
/// Samples are independent; no temporal correlation is modeled.
#[derive(Debug, Clone)]
pub struct SyntheticRepository {
    engine: ScoringEngine,
}

impl SyntheticRepository {
    pub fn new(engine: ScoringEngine) -> Self {
        Self { engine }
    }

    fn generate(&self, end: NaiveDateTime, samples: u32) -> ReadingTable {
        let cal = self.engine.calibration();
        let mut rng = rand::thread_rng();

        let rows = (0..samples)
            .map(|i| {
                let timestamp = end - Duration::hours((samples - 1 - i) as i64);
                let soil_raw = rng.gen_range(cal.soil_wet..=cal.soil_dry);
                let light_raw = rng.gen_range(cal.light_low..=cal.light_high);
                self.engine.score(timestamp, soil_raw, light_raw)
            })
            .collect();

        ReadingTable::new(rows)
    }
}

#[async_trait]
impl ReadingRepository for SyntheticRepository {
    /// Never fails: one sample per hour over the window, ending now.
    async fn fetch_readings(&self, days: u32) -> Result<ReadingTable, FetchError> {
        let now = Local::now().naive_local();
        Ok(self.generate(now, days * 24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scoring::{Calibration, ScoreWeights};
    use chrono::NaiveDate;

    fn repository() -> SyntheticRepository {
        let engine = ScoringEngine::new(Calibration::default(), ScoreWeights::default()).unwrap();
        SyntheticRepository::new(engine)
    }

    fn end() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 8)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_generates_hourly_samples_over_the_window() {
        let table = repository().generate(end(), 7 * 24);
        assert_eq!(table.len(), 168);

        let rows = table.rows();
        assert_eq!(rows.last().unwrap().timestamp, end());
        assert_eq!(rows[0].timestamp, end() - Duration::hours(167));
        for pair in rows.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
    }

    #[test]
    fn test_generated_values_are_scored_and_bounded() {
        let engine = ScoringEngine::new(Calibration::default(), ScoreWeights::default()).unwrap();
        let table = repository().generate(end(), 48);

        for row in table.rows() {
            assert!((0.0..=100.0).contains(&row.soil_pct));
            assert!((0.0..=100.0).contains(&row.light_pct));
            assert!((0.0..=100.0).contains(&row.happiness));

            let soil_raw = row.soil_raw.unwrap();
            let light_raw = row.light_raw.unwrap();
            assert!((700..=2300).contains(&soil_raw));
            assert!((450..=3000).contains(&light_raw));
            assert_eq!(row.soil_pct, engine.soil_pct(soil_raw as f64));
            assert_eq!(row.happiness, engine.happiness(row.soil_pct, row.light_pct));
        }
    }

    #[tokio::test]
    async fn test_fetch_never_fails_and_matches_window() {
        let table = repository().fetch_readings(7).await.unwrap();
        assert_eq!(table.len(), 7 * 24);
    }
}
