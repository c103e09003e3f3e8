use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::AnalysisReport;
use crate::services::analysis_service;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/analyse", get(analyse_page))
        .route("/api/analysis/:ticker", get(get_analysis))
}

#[derive(Debug, Deserialize)]
pub struct AnalyseQuery {
    ticker: Option<String>,
}

async fn index(State(state): State<AppState>) -> Html<String> {
    info!("GET / - Rendering form");
    Html(views::form_page(&state.config.default_ticker))
}

/// Runs the pipeline on each submit. Any failure becomes one error message
/// in place of the chart and metrics.
async fn analyse_page(
    Query(params): Query<AnalyseQuery>,
    State(state): State<AppState>,
) -> Html<String> {
    let ticker = params
        .ticker
        .unwrap_or_else(|| state.config.default_ticker.clone());
    info!("GET /analyse - Analysing {}", ticker);

    let result = analysis_service::run_analysis(
        state.price_provider.as_ref(),
        &state.config,
        &ticker,
        state.today(),
    )
    .await;

    match result {
        Ok(report) => Html(views::report_page(&report)),
        Err(e) => {
            error!("Analysis failed for {}: {}", ticker, e);
            Html(views::error_page(ticker.trim(), &e.to_string()))
        }
    }
}

async fn get_analysis(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AnalysisReport>, AppError> {
    info!("GET /api/analysis/{} - Running analysis", ticker);
    analysis_service::run_analysis(state.price_provider.as_ref(), &state.config, &ticker, state.today())
        .await
        .map(Json)
        .map_err(|e| {
            error!("Analysis failed for {}: {}", ticker, e);
            e
        })
}
