use crate::external::price_provider::{PriceProvider, PriceProviderError, RawPriceTable};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_HISTORY_DAYS: i64 = 5 * 365;

/// Offline provider producing a reproducible random walk per symbol.
///
/// Weekends are skipped. Output uses the same `(field, SYMBOL)` column layout
/// as the Yahoo provider.
pub struct MockPriceProvider;

impl MockPriceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockPriceProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_for(symbol: &str) -> u64 {
    symbol
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ b as u64).wrapping_mul(0x100_0000_01b3))
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<RawPriceTable, PriceProviderError> {
        let start = start.unwrap_or(end - Duration::days(DEFAULT_HISTORY_DAYS));
        if start > end {
            return Err(PriceProviderError::Empty(symbol.to_string()));
        }

        let mut rng = StdRng::seed_from_u64(seed_for(symbol));
        let mut close = 100.0_f64;
        let mut table = RawPriceTable {
            columns: ["Open", "High", "Low", "Close", "Volume"]
                .iter()
                .map(|field| vec![field.to_string(), symbol.to_string()])
                .collect(),
            ..Default::default()
        };

        let mut date = start;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let open = close;
                close *= 1.0 + rng.random_range(-0.02..0.02);
                let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
                let volume = rng.random_range(1_000_000.0..5_000_000.0_f64).round();

                table.index.push(date);
                table.rows.push(vec![open, high, low, close, volume]);
            }
            date += Duration::days(1);
        }

        if table.is_empty() {
            return Err(PriceProviderError::Empty(symbol.to_string()));
        }
        Ok(table)
    }
}
