mod price_point;
mod analytics;

pub use price_point::{DailyReturn, PriceRecord, PriceSeries};
pub use analytics::*;
