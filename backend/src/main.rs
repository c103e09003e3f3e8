use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use stock_analysis_backend::app;
use stock_analysis_backend::config::{AppConfig, ProviderKind};
use stock_analysis_backend::external::mock::MockPriceProvider;
use stock_analysis_backend::external::price_provider::PriceProvider;
use stock_analysis_backend::external::yahoofinance::YahooFinanceProvider;
use stock_analysis_backend::logging::{init_logging, LoggingConfig};
use stock_analysis_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("failed to initialize logging")?;

    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    let provider: Arc<dyn PriceProvider> = match config.provider {
        ProviderKind::Yahoo => {
            tracing::info!("📊 Using price provider: Yahoo Finance");
            Arc::new(YahooFinanceProvider::new())
        },
        ProviderKind::Mock => {
            tracing::info!("📊 Using price provider: synthetic mock data");
            Arc::new(MockPriceProvider::new())
        },
    };
    tracing::info!(
        "Benchmark: {} ({}), export: {}",
        config.benchmark_symbol,
        config.benchmark_name,
        if config.export_enabled { config.export_dir.display().to_string() } else { "disabled".to_string() }
    );

    let addr = config.bind_addr;
    let state = AppState::new(config, provider);
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 Stock analysis running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
