use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{LineChart, PriceHistoryResponse};
use crate::services::{analysis_service, chart_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_prices))
        .route("/:ticker/chart", get(get_price_chart))
}

fn log_failure(ticker: &str, what: &str, e: &AppError) {
    match e {
        AppError::RateLimited => warn!("Rate limited when fetching {} for {}", what, ticker),
        _ => error!("Failed to get {} for {}: {}", what, ticker, e),
    }
}

pub async fn get_prices(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PriceHistoryResponse>, AppError> {
    info!("GET /api/prices/{} - Getting price history", ticker);
    let history = analysis_service::price_history(state.price_provider.as_ref(), &ticker, state.today())
        .await
        .map_err(|e| {
            log_failure(&ticker, "price history", &e);
            e
        })?;
    Ok(Json(history))
}

pub async fn get_price_chart(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LineChart>, AppError> {
    info!("GET /api/prices/{}/chart - Building price chart", ticker);
    let history = analysis_service::price_history(state.price_provider.as_ref(), &ticker, state.today())
        .await
        .map_err(|e| {
            log_failure(&ticker, "price chart", &e);
            e
        })?;
    Ok(Json(chart_service::build_price_chart(&history.series, &history.series.symbol)))
}
