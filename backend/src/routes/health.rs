use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    status: &'static str,
    provider: String,
    benchmark: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    info!("GET /health - Health check");
    Json(HealthStatus {
        status: "OK",
        provider: format!("{:?}", state.config.provider).to_lowercase(),
        benchmark: state.config.benchmark_symbol.clone(),
    })
}
