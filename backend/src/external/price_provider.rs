use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// A column label with one or more levels, e.g. `["Close", "AAPL"]`.
pub type ColumnLabel = Vec<String>;

/// Tabular daily history as returned by a provider, before cleaning.
///
/// `rows[i]` holds the values for `index[i]`, one per entry in `columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPriceTable {
    pub columns: Vec<ColumnLabel>,
    pub index: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
}

impl RawPriceTable {
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("no data found for symbol {0}")]
    NotFound(String),

    #[error("empty price history for symbol {0}")]
    Empty(String),
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily OHLCV history for `symbol` up to and including `end`.
    /// `start = None` asks for the full available history.
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<RawPriceTable, PriceProviderError>;
}
