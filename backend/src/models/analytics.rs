use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DailyReturn, PriceSeries};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Renderer-agnostic description of a single-series line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceExtreme {
    pub price: f64,
    pub date: NaiveDate,
}

/// Scalar metrics for one analysis run. `None` marks insufficient data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    pub mean_daily_return: Option<f64>,
    pub elapsed_years: Option<f64>,
    pub cagr: Option<f64>,
    pub max_price: Option<PriceExtreme>,
    pub min_price: Option<PriceExtreme>,
    pub volatility: Option<f64>,
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBlock {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub benchmark: String,
    pub chart: LineChart,
    pub metrics: AnalysisMetrics,
    /// Return, price and risk blocks, always in that order.
    pub blocks: Vec<MetricBlock>,
    pub exported_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryResponse {
    pub series: PriceSeries,
    pub daily_returns: Vec<DailyReturn>,
}
