// Dashboard service - Use case for building the plant dashboard
use crate::application::cache::TtlCache;
use crate::application::reading_repository::ReadingRepository;
use crate::domain::dashboard::{
    ChartData, ChartKind, Dashboard, DateSpan, IdealBand, Notice, NoticeLevel, SeriesData,
    StatusCard, TimeSeriesPoint,
};
use crate::domain::reading::{Reading, ReadingTable};
use crate::infrastructure::config::DashboardConfig;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
struct CachedFetch {
    table: ReadingTable,
    notice: Option<Notice>,
}

pub struct DashboardService {
    repository: Arc<dyn ReadingRepository>,
    config: DashboardConfig,
    cache: TtlCache<u32, CachedFetch>,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn ReadingRepository>,
        config: DashboardConfig,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            config,
            cache: TtlCache::new(cache_ttl),
        }
    }

    /// Fetch the reading table for the window, going through the cache.
    /// Fetch failures are swallowed here: the caller gets an empty table
    /// plus a notice, never an error.
    pub async fn load_readings(&self, days: u32) -> (ReadingTable, Option<Notice>) {
        if let Some(cached) = self.cache.get(&days) {
            return (cached.table, cached.notice);
        }

        let (table, notice) = match self.repository.fetch_readings(days).await {
            Ok(table) if table.is_empty() => {
                tracing::warn!(days, "no readings in the requested window");
                let notice = Notice {
                    level: NoticeLevel::Warning,
                    message: "No data found in the store for the specified time range."
                        .to_string(),
                };
                (table, Some(notice))
            }
            Ok(table) => (table, None),
            Err(e) => {
                tracing::error!(error = %e, days, "failed to fetch readings");
                let notice = Notice {
                    level: NoticeLevel::Error,
                    message: format!("Error fetching sensor data: {e}"),
                };
                (ReadingTable::empty(), Some(notice))
            }
        };

        // The empty fallback is cached too; staleness after a failure is
        // bounded by the TTL rather than retried on every render.
        self.cache.insert(
            days,
            CachedFetch {
                table: table.clone(),
                notice: notice.clone(),
            },
        );
        (table, notice)
    }

    pub async fn build_dashboard(
        &self,
        days: u32,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Dashboard {
        let title = format!("{} (last {}d)", self.config.title, days);
        let (table, notice) = self.load_readings(days).await;

        // Downstream halt: no partial dashboard over an empty table.
        let Some((span_start, span_end)) = table.span() else {
            let notice = notice.unwrap_or(Notice {
                level: NoticeLevel::Error,
                message: "Unable to load sensor data. Please check the connection settings."
                    .to_string(),
            });
            return Dashboard::unavailable(title, notice);
        };

        let (start_date, end_date) = resolve_range(range, span_start, span_end);
        let window = table.slice_days(start_date, end_date);

        let status = table.latest().map(StatusCard::from_latest);
        let charts = self.build_charts(&window);

        Dashboard {
            title,
            notice,
            status,
            span: Some(DateSpan {
                start: span_start,
                end: span_end,
            }),
            range: Some(DateSpan {
                start: start_date,
                end: end_date,
            }),
            charts,
        }
    }

    fn build_charts(&self, window: &ReadingTable) -> Vec<ChartData> {
        let mut charts = Vec::new();

        for chart_config in &self.config.charts {
            let mut series_list = Vec::new();

            for series_config in &chart_config.series {
                let Some(points) = series_points(window, &series_config.field) else {
                    tracing::warn!(
                        series = %series_config.id,
                        field = %series_config.field,
                        "skipping series with unknown reading field"
                    );
                    continue;
                };
                if !points.is_empty() {
                    series_list.push(SeriesData::new(
                        series_config.id.clone(),
                        series_config.name.clone(),
                        series_config.color.clone(),
                        points,
                    ));
                }
            }

            // Only emit a chart that has at least one series with data.
            if series_list.is_empty() {
                continue;
            }

            let kind = match chart_config.kind.as_str() {
                "multiLine" => ChartKind::MultiLine,
                _ => ChartKind::Line,
            };

            let band = chart_config.ideal_band.then(|| IdealBand {
                min: self.config.calibration.ideal_soil_min,
                max: self.config.calibration.ideal_soil_max,
            });

            charts.push(ChartData {
                id: chart_config.id.clone(),
                title: chart_config.title.clone(),
                unit: chart_config.unit.clone(),
                kind,
                y_min: chart_config.y_min,
                y_max: chart_config.y_max,
                band,
                series: series_list,
            });
        }

        charts
    }

    /// Drop the cached table for a window so the next render refetches.
    pub fn invalidate_window(&self, days: u32) {
        self.cache.invalidate(&days);
    }
}

/// Clamp the requested range to the span of available data; with no request,
/// default to the trailing two days of data.
fn resolve_range(
    range: Option<(NaiveDate, NaiveDate)>,
    span_start: NaiveDate,
    span_end: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    match range {
        Some((start, end)) => {
            let start = start.clamp(span_start, span_end);
            let end = end.clamp(start, span_end);
            (start, end)
        }
        None => {
            let default_start = span_end
                .checked_sub_days(Days::new(2))
                .unwrap_or(span_start)
                .max(span_start);
            (default_start, span_end)
        }
    }
}

fn series_points(table: &ReadingTable, field: &str) -> Option<Vec<TimeSeriesPoint>> {
    let value_of: fn(&Reading) -> f64 = match field {
        "soil_pct" => |r| r.soil_pct,
        "light_pct" => |r| r.light_pct,
        "happiness" => |r| r.happiness,
        _ => return None,
    };

    Some(
        table
            .rows()
            .iter()
            .map(|r| TimeSeriesPoint::new(r.timestamp.and_utc().timestamp_millis(), value_of(r)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reading_repository::FetchError;
    use crate::domain::dashboard::NoticeLevel;
    use crate::infrastructure::config::DashboardConfig;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRepository {
        rows_per_day: u32,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeRepository {
        fn with_data() -> Self {
            Self {
                rows_per_day: 24,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self {
                rows_per_day: 0,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                rows_per_day: 0,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReadingRepository for FakeRepository {
        async fn fetch_readings(&self, days: u32) -> Result<ReadingTable, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Connection("connect refused".to_string()));
            }

            let start = NaiveDate::from_ymd_opt(2026, 8, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let rows = (0..days * self.rows_per_day)
                .map(|i| {
                    Reading::new(
                        start + chrono::Duration::hours(i as i64),
                        55.0,
                        80.0,
                        92.0,
                    )
                })
                .collect();
            Ok(ReadingTable::new(rows))
        }
    }

    fn service(repository: Arc<FakeRepository>) -> DashboardService {
        DashboardService::new(
            repository,
            DashboardConfig::default(),
            Duration::from_secs(600),
        )
    }

    #[tokio::test]
    async fn test_dashboard_built_from_data() {
        let dashboard = service(Arc::new(FakeRepository::with_data()))
            .build_dashboard(7, None)
            .await;

        assert!(dashboard.notice.is_none());
        let status = dashboard.status.unwrap();
        assert_eq!(status.happiness, 92.0);
        assert_eq!(status.message, "INFO • Conditions stable and optimal.");

        // Soil + light + combined analysis chart.
        assert_eq!(dashboard.charts.len(), 3);
        let soil = &dashboard.charts[0];
        let band = soil.band.unwrap();
        assert_eq!(band.min, 35.0);
        assert_eq!(band.max, 75.0);

        let combined = &dashboard.charts[2];
        assert_eq!(combined.kind, ChartKind::MultiLine);
        assert_eq!(combined.series.len(), 3);
    }

    #[tokio::test]
    async fn test_default_range_is_trailing_two_days() {
        let dashboard = service(Arc::new(FakeRepository::with_data()))
            .build_dashboard(7, None)
            .await;

        let span = dashboard.span.unwrap();
        let range = dashboard.range.unwrap();
        assert_eq!(range.end, span.end);
        assert_eq!(range.start, span.end.checked_sub_days(Days::new(2)).unwrap());
    }

    #[tokio::test]
    async fn test_requested_range_is_clamped_to_span() {
        let dashboard = service(Arc::new(FakeRepository::with_data()))
            .build_dashboard(7, Some((
                NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            )))
            .await;

        let span = dashboard.span.unwrap();
        let range = dashboard.range.unwrap();
        assert_eq!(range.start, span.start);
        assert_eq!(range.end, span.end);
    }

    #[tokio::test]
    async fn test_fetch_error_resolves_to_unavailable_dashboard() {
        let dashboard = service(Arc::new(FakeRepository::failing()))
            .build_dashboard(7, None)
            .await;

        let notice = dashboard.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("connect refused"));
        assert!(dashboard.status.is_none());
        assert!(dashboard.charts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_window_reports_warning_not_error() {
        let dashboard = service(Arc::new(FakeRepository::empty()))
            .build_dashboard(7, None)
            .await;

        let notice = dashboard.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(dashboard.charts.is_empty());
    }

    #[tokio::test]
    async fn test_second_render_hits_the_cache() {
        let repository = Arc::new(FakeRepository::with_data());
        let service = service(repository.clone());

        service.build_dashboard(7, None).await;
        service.build_dashboard(7, None).await;
        assert_eq!(repository.calls.load(Ordering::SeqCst), 1);

        service.invalidate_window(7);
        service.build_dashboard(7, None).await;
        assert_eq!(repository.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_cached_for_the_ttl() {
        let repository = Arc::new(FakeRepository::failing());
        let service = service(repository.clone());

        service.build_dashboard(7, None).await;
        service.build_dashboard(7, None).await;
        assert_eq!(repository.calls.load(Ordering::SeqCst), 1);
    }
}
