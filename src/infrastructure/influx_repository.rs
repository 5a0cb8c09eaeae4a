// InfluxDB repository implementation (live variant)
use crate::application::reading_repository::{FetchError, ReadingRepository};
use crate::domain::reading::{Reading, ReadingTable};
use crate::infrastructure::config::InfluxSettings;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches pre-scored readings over the v2 Flux HTTP API. The store's
/// `happiness` field is trusted as computed by the ingestion side; this
/// repository never rescores it from soil and light.
#[derive(Debug, Clone)]
pub struct InfluxRepository {
    url: String,
    token: String,
    org: String,
    bucket: String,
    measurement: String,
    local_tz: Tz,
    client: reqwest::Client,
}

impl InfluxRepository {
    pub fn new(settings: InfluxSettings, local_tz: Tz) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            url: settings.url.trim_end_matches('/').to_string(),
            token: settings.token,
            org: settings.org,
            bucket: settings.bucket,
            measurement: settings.measurement,
            local_tz,
            client,
        })
    }

    fn flux_query(&self, days: u32) -> String {
        format!(
            r#"from(bucket: "{bucket}")
    |> range(start: -{days}d)
    |> filter(fn: (r) => r["_measurement"] == "{measurement}")
    |> filter(fn: (r) => r["_field"] == "soil_pct" or r["_field"] == "ldr_pct" or r["_field"] == "happiness")
    |> aggregateWindow(every: 10m, fn: mean, createEmpty: false)
    |> pivot(rowKey:["_time"], columnKey: ["_field"], valueColumn: "_value")"#,
            bucket = self.bucket,
            measurement = self.measurement,
        )
    }

    async fn execute_query(&self, flux: &str) -> Result<String, FetchError> {
        let url = format!("{}/api/v2/query?org={}", self.url, urlencoding::encode(&self.org));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "application/vnd.flux")
            .header("Accept", "application/csv")
            .body(flux.to_string())
            .send()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Query(format!("status {status}: {body}")));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Decode the annotated-CSV response into readings. Tables are
    /// blank-line separated, each headed by a column row; `#` rows are
    /// dialect annotations. A field column the store did not return
    /// defaults to 0 for every row: the sensor is silent, the row stays.
    fn decode_csv(&self, body: &str) -> Result<Vec<Reading>, FetchError> {
        let mut rows = Vec::new();
        let mut columns: Option<Columns> = None;

        for line in body.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                columns = None;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let cells: Vec<&str> = line.split(',').collect();
            match &columns {
                None => columns = Some(Columns::from_header(&cells)?),
                Some(cols) => {
                    if let Some(reading) = cols.decode_row(&cells, self.local_tz) {
                        rows.push(reading);
                    }
                }
            }
        }

        Ok(rows)
    }
}

/// Column indices resolved from one CSV header row.
struct Columns {
    time: usize,
    soil: Option<usize>,
    light: Option<usize>,
    happiness: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[&str]) -> Result<Self, FetchError> {
        let position = |name: &str| cells.iter().position(|c| *c == name);
        let time = position("_time")
            .ok_or_else(|| FetchError::Decode("response header has no _time column".to_string()))?;

        Ok(Self {
            time,
            soil: position("soil_pct"),
            // The store names the light field after the sensor hardware.
            light: position("ldr_pct"),
            happiness: position("happiness"),
        })
    }

    /// Rows with an unparsable timestamp are dropped; unparsable or absent
    /// values read as 0.
    fn decode_row(&self, cells: &[&str], local_tz: Tz) -> Option<Reading> {
        let time_str = *cells.get(self.time)?;
        let utc_time = DateTime::parse_from_rfc3339(time_str).ok()?;
        let timestamp = utc_time.with_timezone(&local_tz).naive_local();

        let value = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .and_then(|cell| cell.parse::<f64>().ok())
                .unwrap_or(0.0)
        };

        Some(Reading::new(
            timestamp,
            value(self.soil),
            value(self.light),
            value(self.happiness),
        ))
    }
}

#[async_trait]
impl ReadingRepository for InfluxRepository {
    async fn fetch_readings(&self, days: u32) -> Result<ReadingTable, FetchError> {
        let flux = self.flux_query(days);
        tracing::debug!(days, %flux, "executing flux query");

        let body = self.execute_query(&flux).await?;
        let rows = self.decode_csv(&body)?;
        tracing::debug!(rows = rows.len(), "decoded readings from the store");

        Ok(ReadingTable::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn repository(local_tz: Tz) -> InfluxRepository {
        InfluxRepository::new(
            InfluxSettings {
                url: "https://influx.example.com/".to_string(),
                token: "token".to_string(),
                org: "PlantPet".to_string(),
                bucket: "PlantPet".to_string(),
                measurement: "plant_status".to_string(),
            },
            local_tz,
        )
        .unwrap()
    }

    #[test]
    fn test_flux_query_shape() {
        let repo = repository(chrono_tz::UTC);
        let flux = repo.flux_query(7);

        assert!(flux.contains(r#"from(bucket: "PlantPet")"#));
        assert!(flux.contains("range(start: -7d)"));
        assert!(flux.contains(r#"r["_measurement"] == "plant_status""#));
        assert!(flux.contains("aggregateWindow(every: 10m, fn: mean, createEmpty: false)"));
        assert!(flux.contains("pivot(rowKey:[\"_time\"]"));
    }

    #[test]
    fn test_decode_full_response() {
        let repo = repository(chrono_tz::UTC);
        let body = "\
,result,table,_start,_stop,_time,happiness,ldr_pct,soil_pct\r\n\
,_result,0,2026-08-01T00:00:00Z,2026-08-08T00:00:00Z,2026-08-07T10:00:00Z,92.5,80.1,55.2\r\n\
,_result,0,2026-08-01T00:00:00Z,2026-08-08T00:00:00Z,2026-08-07T10:10:00Z,88.0,75.0,54.0\r\n";

        let rows = repo.decode_csv(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].soil_pct, 55.2);
        assert_eq!(rows[0].light_pct, 80.1);
        assert_eq!(rows[0].happiness, 92.5);
        assert!(rows[0].soil_raw.is_none());
    }

    #[test]
    fn test_decode_converts_to_local_naive_time() {
        let repo = repository(chrono_tz::America::Los_Angeles);
        // January: fixed UTC-8, no DST ambiguity.
        let body = "\
,result,table,_time,soil_pct,ldr_pct,happiness\n\
,_result,0,2026-01-15T12:00:00Z,50,60,70\n";

        let rows = repo.decode_csv(body).unwrap();
        assert_eq!(rows[0].timestamp.hour(), 4);
    }

    #[test]
    fn test_missing_field_column_defaults_to_zero() {
        let repo = repository(chrono_tz::UTC);
        let body = "\
,result,table,_time,soil_pct,ldr_pct\n\
,_result,0,2026-08-07T10:00:00Z,55.2,80.1\n";

        let rows = repo.decode_csv(body).unwrap();
        assert_eq!(rows[0].happiness, 0.0);
        assert_eq!(rows[0].soil_pct, 55.2);
    }

    #[test]
    fn test_decode_skips_annotations_and_table_breaks() {
        let repo = repository(chrono_tz::UTC);
        let body = "\
#datatype,string,long,dateTime:RFC3339,double,double,double\n\
#default,_result,,,,,\n\
,result,table,_time,soil_pct,ldr_pct,happiness\n\
,_result,0,2026-08-07T10:00:00Z,55.2,80.1,92.5\n\
\n\
#datatype,string,long,dateTime:RFC3339,double,double,double\n\
#default,_result,,,,,\n\
,result,table,_time,soil_pct,ldr_pct,happiness\n\
,_result,1,2026-08-07T10:10:00Z,54.0,75.0,88.0\n";

        let rows = repo.decode_csv(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].happiness, 88.0);
    }

    #[test]
    fn test_empty_body_decodes_to_empty_table() {
        let repo = repository(chrono_tz::UTC);
        assert!(repo.decode_csv("").unwrap().is_empty());
        assert!(repo.decode_csv("\r\n\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_header_without_time_column_is_a_decode_error() {
        let repo = repository(chrono_tz::UTC);
        let body = ",result,table,soil_pct\n,_result,0,55.2\n";
        assert!(matches!(
            repo.decode_csv(body),
            Err(FetchError::Decode(_))
        ));
    }
}
