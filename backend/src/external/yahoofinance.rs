use crate::external::price_provider::{PriceProvider, PriceProviderError, RawPriceTable};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const FIELDS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// Yahoo Finance provider - Free API, no key required.
///
/// Columns come back two levels deep, `(field, SYMBOL)`, the same shape
/// popular dataframe downloaders produce, so they go through the cleaner
/// before use.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; StockAnalysis/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
        }
    }

    fn chart_url(&self, symbol: &str) -> Result<url::Url, PriceProviderError> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| PriceProviderError::BadResponse(format!("invalid base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PriceProviderError::BadResponse("base url cannot be a base".into()))?
            .push(symbol);
        Ok(url)
    }
}

impl Default for YahooFinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    meta: Option<YahooMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Turn a chart response body into a table for `symbol`.
fn parse_chart(symbol: &str, body: YahooChartResponse) -> Result<RawPriceTable, PriceProviderError> {
    if let Some(error) = body.chart.error {
        if error.code.as_deref() == Some("Not Found") || error.description.contains("No data found") {
            return Err(PriceProviderError::NotFound(symbol.to_string()));
        }
        return Err(PriceProviderError::BadResponse(error.description));
    }

    let result = body
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| PriceProviderError::NotFound(symbol.to_string()))?;

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| PriceProviderError::BadResponse("No quote data in response".into()))?;

    let n = result.timestamp.len();
    if quote.close.len() != n || quote.open.len() != n || quote.high.len() != n || quote.low.len() != n {
        return Err(PriceProviderError::Parse(
            "Timestamp and quote arrays have different lengths".into(),
        ));
    }

    let mut dated_rows: Vec<(NaiveDate, Vec<f64>)> = Vec::with_capacity(n);
    for (i, ts) in result.timestamp.iter().enumerate() {
        // Skip bars with missing prices (market holidays, halted sessions)
        let (Some(open), Some(high), Some(low), Some(close)) =
            (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
        else {
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);

        let date = chrono::DateTime::from_timestamp(ts + offset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| PriceProviderError::Parse(format!("bad timestamp {}", ts)))?;

        dated_rows.push((date, vec![open, high, low, close, volume]));
    }

    // Oldest first; the provider occasionally repeats the live bar, keep the latest one
    dated_rows.sort_by_key(|(date, _)| *date);
    let mut table = RawPriceTable {
        columns: FIELDS
            .iter()
            .map(|field| vec![field.to_string(), symbol.to_string()])
            .collect(),
        ..Default::default()
    };
    for (date, row) in dated_rows {
        if table.index.last() == Some(&date) {
            if let Some(last) = table.rows.last_mut() {
                *last = row;
            }
            continue;
        }
        table.index.push(date);
        table.rows.push(row);
    }

    if table.is_empty() {
        return Err(PriceProviderError::Empty(symbol.to_string()));
    }

    Ok(table)
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<RawPriceTable, PriceProviderError> {
        let url = self.chart_url(symbol)?;
        let period1 = start.map(unix_seconds).unwrap_or(0);
        // period2 is exclusive
        let period2 = unix_seconds(end + Duration::days(1));

        info!("Fetching daily history for {} ({:?} to {})", symbol, start, end);

        let resp = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Yahoo Finance rate limited request for {}", symbol);
            return Err(PriceProviderError::RateLimited);
        }
        // Yahoo answers unknown symbols with a 404 carrying a chart.error body
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)));
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let table = parse_chart(symbol, body)?;
        info!("Received {} daily rows for {}", table.index.len(), symbol);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<RawPriceTable, PriceProviderError> {
        let body: YahooChartResponse = serde_json::from_str(json).unwrap();
        parse_chart("AAPL", body)
    }

    #[test]
    fn test_parse_chart_builds_multi_level_columns() {
        let json = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-14400},
            "timestamp":[1704205800,1704292200],
            "indicators":{"quote":[{
                "open":[187.15,184.22],"high":[188.44,185.88],
                "low":[183.89,183.43],"close":[185.64,184.25],
                "volume":[82488700,58414500]}]}}],"error":null}}"#;

        let table = parse(json).unwrap();
        assert_eq!(table.columns.len(), 5);
        assert_eq!(table.columns[3], vec!["Close".to_string(), "AAPL".to_string()]);
        assert_eq!(table.index[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(table.rows[1][3], 184.25);
        assert_eq!(table.rows[0][4], 82488700.0);
    }

    #[test]
    fn test_parse_chart_skips_null_bars_and_dedups_dates() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704119400,1704205800,1704292200,1704292260],
            "indicators":{"quote":[{
                "open":[1.0,null,3.0,3.0],"high":[1.0,2.0,3.0,3.5],
                "low":[1.0,2.0,3.0,3.0],"close":[1.0,2.0,3.0,3.5],
                "volume":[10,null,null,null]}]}}],"error":null}}"#;

        let table = parse(json).unwrap();
        assert_eq!(table.index.len(), 2);
        assert_eq!(table.index[1], NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(table.rows[1][3], 3.5);
        assert_eq!(table.rows[1][4], 0.0);
    }

    #[test]
    fn test_parse_chart_maps_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(PriceProviderError::NotFound(_))));
    }

    #[test]
    fn test_parse_chart_empty_history() {
        let json = r#"{"chart":{"result":[{"timestamp":[],"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(matches!(parse(json), Err(PriceProviderError::Empty(_))));
    }

    #[test]
    fn test_chart_url_encodes_symbol_as_path_segment() {
        let provider = YahooFinanceProvider::new();
        let url = provider.chart_url("^GSPC").unwrap();
        assert!(url.as_str().starts_with(DEFAULT_BASE_URL));
        assert!(url.path().ends_with("GSPC"));
    }

    const NOT_FOUND_BODY: &str = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
    const ONE_BAR_BODY: &str = r#"{"chart":{"result":[{
        "timestamp":[1704205800],
        "indicators":{"quote":[{"open":[1.0],"high":[2.0],"low":[0.5],"close":[1.5],"volume":[100]}]}}],"error":null}}"#;

    async fn chart_stub(
        axum::extract::Path(symbol): axum::extract::Path<String>,
    ) -> (axum::http::StatusCode, &'static str) {
        use axum::http::StatusCode;
        match symbol.as_str() {
            "BUSY" => (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"),
            "ZZZZ" => (StatusCode::NOT_FOUND, NOT_FOUND_BODY),
            "DOWN" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded"),
            "GONE" => (StatusCode::NOT_FOUND, "<html>not here</html>"),
            _ => (StatusCode::OK, ONE_BAR_BODY),
        }
    }

    /// Serve a canned chart endpoint on an ephemeral local port.
    async fn stub_provider() -> YahooFinanceProvider {
        let router = axum::Router::new().route("/chart/:symbol", axum::routing::get(chart_stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        YahooFinanceProvider::with_base_url(format!("http://{}/chart", addr))
    }

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_maps_http_status_to_errors() {
        let provider = stub_provider().await;

        let limited = provider.fetch_daily_history("BUSY", None, end()).await;
        assert!(matches!(limited, Err(PriceProviderError::RateLimited)));

        let missing = provider.fetch_daily_history("ZZZZ", None, end()).await;
        assert!(matches!(missing, Err(PriceProviderError::NotFound(ref s)) if s == "ZZZZ"));

        match provider.fetch_daily_history("DOWN", None, end()).await {
            Err(PriceProviderError::BadResponse(msg)) => assert!(msg.contains("500"), "{}", msg),
            other => panic!("expected BadResponse, got {:?}", other),
        }

        // a 404 without a chart body is not mistaken for an unknown symbol
        let garbled = provider.fetch_daily_history("GONE", None, end()).await;
        assert!(matches!(garbled, Err(PriceProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_success_returns_table() {
        let provider = stub_provider().await;

        let table = provider.fetch_daily_history("AAPL", None, end()).await.unwrap();
        assert_eq!(table.index, vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()]);
        assert_eq!(table.rows[0][3], 1.5);
    }
}
