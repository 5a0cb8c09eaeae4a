// Repository trait for sensor reading access
use crate::domain::reading::ReadingTable;
use async_trait::async_trait;
use thiserror::Error;

/// Why a fetch produced no table. An empty result is not an error: a store
/// that is reachable but has no rows in the window returns `Ok` with an
/// empty table, so callers can report "no data in range" and "source
/// unavailable" separately.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not reach the time-series store: {0}")]
    Connection(String),

    #[error("the time-series store rejected the query: {0}")]
    Query(String),

    #[error("could not decode the store response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Fetch readings for the trailing lookback window.
    ///
    /// Always resolves to a column-complete table; zero rows means the
    /// window holds no data, never that the result is malformed.
    async fn fetch_readings(&self, days: u32) -> Result<ReadingTable, FetchError>;
}
