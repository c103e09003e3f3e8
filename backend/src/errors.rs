use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use reqwest::StatusCode;
use thiserror::Error;

use crate::external::price_provider::PriceProviderError;
use crate::services::cleaner::CleanError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
    #[error("Data error: {0}")]
    Data(String),
    #[error("Export error: {0}")]
    Export(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            },
            AppError::External(msg) | AppError::Data(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::Export(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            },
        }
    }
}

impl From<PriceProviderError> for AppError {
    fn from(value: PriceProviderError) -> Self {
        match value {
            PriceProviderError::RateLimited => AppError::RateLimited,
            PriceProviderError::NotFound(symbol) => {
                AppError::NotFound(format!("No price data found for symbol {}", symbol))
            },
            other => AppError::External(other.to_string()),
        }
    }
}

impl From<CleanError> for AppError {
    fn from(value: CleanError) -> Self {
        AppError::Data(value.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        AppError::Export(value.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Export(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_map_to_status_codes() {
        let not_found: AppError = PriceProviderError::NotFound("ZZZZ".into()).into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let limited: AppError = PriceProviderError::RateLimited.into();
        let resp = limited.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get("Retry-After").unwrap(), "60");

        let network: AppError = PriceProviderError::Network("connection reset".into()).into();
        assert_eq!(network.to_string(), "External error: network error: connection reset");
        assert_eq!(network.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = AppError::Validation("Ticker must not be empty".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cleaning_and_export_failures_map_to_status_codes() {
        let ragged: AppError = CleanError::IndexMismatch { symbol: "AAPL".into(), dates: 3, rows: 2 }.into();
        assert_eq!(ragged.into_response().status(), StatusCode::BAD_GATEWAY);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only filesystem");
        let export: AppError = io.into();
        assert!(matches!(export, AppError::Export(_)));
        assert_eq!(export.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
