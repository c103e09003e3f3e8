use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{
    AnalysisMetrics, AnalysisReport, MetricBlock, PriceExtreme, PriceHistoryResponse, PriceSeries,
};
use crate::services::{chart_service, cleaner, export_service, metrics_service};

const MAX_TICKER_LEN: usize = 15;
const INSUFFICIENT: &str = "insufficient data";

/// Trim and upper-case a user supplied ticker, rejecting anything that
/// is not a plausible exchange symbol.
pub fn normalize_ticker(input: &str) -> Result<String, AppError> {
    let ticker = input.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AppError::Validation("Ticker must not be empty".to_string()));
    }
    if ticker.len() > MAX_TICKER_LEN
        || !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        return Err(AppError::Validation(format!("Invalid ticker symbol: {}", input.trim())));
    }
    Ok(ticker)
}

/// Fetch and clean the daily history for one symbol.
pub async fn load_series(
    provider: &dyn PriceProvider,
    symbol: &str,
    start: Option<NaiveDate>,
    end: NaiveDate,
) -> Result<PriceSeries, AppError> {
    let table = provider.fetch_daily_history(symbol, start, end).await?;
    Ok(cleaner::clean_price_table(symbol, table)?)
}

/// Cleaned history plus daily returns for the prices API.
pub async fn price_history(
    provider: &dyn PriceProvider,
    ticker: &str,
    today: NaiveDate,
) -> Result<PriceHistoryResponse, AppError> {
    let ticker = normalize_ticker(ticker)?;
    let series = load_series(provider, &ticker, None, today).await?;
    let daily_returns = metrics_service::daily_returns(&series);
    Ok(PriceHistoryResponse { series, daily_returns })
}

fn fmt_or_insufficient(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| INSUFFICIENT.to_string())
}

/// Text blocks in display order: return, price, risk.
pub fn metric_blocks(metrics: &AnalysisMetrics, benchmark_name: &str) -> Vec<MetricBlock> {
    let price_line = |label: &str, extreme: Option<PriceExtreme>| {
        format!(
            "{}: {}",
            label,
            extreme
                .map(|e| format!("${:.2} on {}", e.price, e.date.format("%Y-%m-%d")))
                .unwrap_or_else(|| INSUFFICIENT.to_string())
        )
    };

    vec![
        MetricBlock {
            title: "Return Metrics".to_string(),
            lines: vec![
                format!(
                    "Average Daily Return: {}",
                    fmt_or_insufficient(metrics.mean_daily_return, |v| format!("{:.2}%", v))
                ),
                format!(
                    "Annualized Return (CAGR): {}",
                    fmt_or_insufficient(metrics.cagr, |v| format!("{:.2}%", v * 100.0))
                ),
            ],
        },
        MetricBlock {
            title: "Price Metrics".to_string(),
            lines: vec![
                price_line("Maximum Price", metrics.max_price),
                price_line("Lowest Price", metrics.min_price),
            ],
        },
        MetricBlock {
            title: "Risk Metrics".to_string(),
            lines: vec![
                format!(
                    "Volatility (Standard Deviation of Daily Return): {}",
                    fmt_or_insufficient(metrics.volatility, |v| format!("{:.2}%", v))
                ),
                format!(
                    "Correlation with {}: {}",
                    benchmark_name,
                    fmt_or_insufficient(metrics.correlation, |v| format!("{:.2}", v))
                ),
            ],
        },
    ]
}

/// Run the whole pipeline for one ticker.
///
/// The ticker is fetched first; the benchmark is then fetched from the
/// ticker's first trading date. The first failing step aborts the run.
pub async fn run_analysis(
    provider: &dyn PriceProvider,
    config: &AppConfig,
    ticker: &str,
    today: NaiveDate,
) -> Result<AnalysisReport, AppError> {
    let ticker = normalize_ticker(ticker)?;
    info!("Running analysis for {} against {}", ticker, config.benchmark_symbol);

    let series = load_series(provider, &ticker, None, today).await?;
    let chart = chart_service::build_price_chart(&series, &ticker);

    let start = series.first_date();
    let benchmark = load_series(provider, &config.benchmark_symbol, start, today).await?;

    let metrics = metrics_service::compute_metrics(&series, &benchmark);
    if metrics.cagr.is_none() || metrics.volatility.is_none() {
        warn!("Insufficient data for {} ({} rows)", ticker, series.len());
    }

    let exported_to = if config.export_enabled {
        let returns = metrics_service::daily_returns(&series);
        let path = export_service::export_price_series(&config.export_dir, &series, &returns)?;
        Some(path.display().to_string())
    } else {
        None
    };

    Ok(AnalysisReport {
        blocks: metric_blocks(&metrics, &config.benchmark_name),
        ticker,
        benchmark: config.benchmark_symbol.clone(),
        chart,
        metrics,
        exported_to,
    })
}
