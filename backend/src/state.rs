use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::external::price_provider::PriceProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub price_provider: Arc<dyn PriceProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, price_provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            config: Arc::new(config),
            price_provider,
        }
    }

    /// End date for every fetch: the current UTC calendar day.
    pub fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}
