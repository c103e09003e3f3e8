use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{analysis, health, prices};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .merge(analysis::router())
        .nest("/health", health::router())
        .nest("/api/prices", prices::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
