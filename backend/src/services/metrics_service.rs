use std::collections::HashMap;

use chrono::NaiveDate;
use ndarray::Array1;

use crate::models::{AnalysisMetrics, DailyReturn, PriceExtreme, PriceSeries};

const DAYS_PER_YEAR: f64 = 365.25;

/// Daily close-to-close change in percent.
///
/// The first row has no predecessor and yields `None`, as does any row whose
/// previous close is zero.
pub fn daily_returns(series: &PriceSeries) -> Vec<DailyReturn> {
    let mut prev: Option<f64> = None;
    series
        .records
        .iter()
        .map(|r| {
            let value = prev
                .filter(|p| *p != 0.0)
                .map(|p| (r.close / p - 1.0) * 100.0)
                .filter(|v| v.is_finite());
            prev = Some(r.close);
            DailyReturn { date: r.date, value }
        })
        .collect()
}

fn defined_values(returns: &[DailyReturn]) -> Array1<f64> {
    returns.iter().filter_map(|r| r.value).collect()
}

/// Calendar span between the first and last row, in years of 365.25 days.
pub fn elapsed_years(series: &PriceSeries) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first_date()?;
    let last = series.last_date()?;
    Some((last - first).num_days() as f64 / DAYS_PER_YEAR)
}

/// Compound annual growth rate as a fraction (0.10 == 10%).
pub fn cagr(series: &PriceSeries) -> Option<f64> {
    let years = elapsed_years(series)?;
    if years <= 0.0 {
        return None;
    }
    let first = series.records.first()?.close;
    let last = series.records.last()?.close;
    if first <= 0.0 {
        return None;
    }
    let rate = (last / first).powf(1.0 / years) - 1.0;
    rate.is_finite().then_some(rate)
}

pub fn mean_daily_return(returns: &[DailyReturn]) -> Option<f64> {
    defined_values(returns).mean()
}

/// Highest `high` and lowest `low` with their dates. Ties go to the earliest row.
pub fn price_extremes(series: &PriceSeries) -> Option<(PriceExtreme, PriceExtreme)> {
    let first = series.records.first()?;
    let mut max = PriceExtreme { price: first.high, date: first.date };
    let mut min = PriceExtreme { price: first.low, date: first.date };

    for r in series.records.iter().skip(1) {
        if r.high > max.price {
            max = PriceExtreme { price: r.high, date: r.date };
        }
        if r.low < min.price {
            min = PriceExtreme { price: r.low, date: r.date };
        }
    }
    Some((max, min))
}

/// Sample standard deviation (ddof = 1) of the defined daily returns.
pub fn volatility(returns: &[DailyReturn]) -> Option<f64> {
    let values = defined_values(returns);
    if values.len() < 2 {
        return None;
    }
    Some(values.std(1.0))
}

fn is_degenerate(values: &Array1<f64>, mean: f64) -> bool {
    let sd = values.std(0.0);
    !sd.is_finite() || sd <= 1e-12 * mean.abs().max(1.0)
}

/// Pearson correlation of two return sequences matched by date.
///
/// Only dates where both sides have a defined return take part. Fewer than two
/// such pairs, or a side with no variance, gives `None` rather than zero.
pub fn correlation(returns: &[DailyReturn], benchmark: &[DailyReturn]) -> Option<f64> {
    let bench_by_date: HashMap<NaiveDate, f64> = benchmark
        .iter()
        .filter_map(|r| r.value.map(|v| (r.date, v)))
        .collect();

    let (xs, ys): (Vec<f64>, Vec<f64>) = returns
        .iter()
        .filter_map(|r| {
            let x = r.value?;
            let y = bench_by_date.get(&r.date)?;
            Some((x, *y))
        })
        .unzip();

    if xs.len() < 2 {
        return None;
    }

    let xs = Array1::from(xs);
    let ys = Array1::from(ys);
    let mean_x = xs.mean()?;
    let mean_y = ys.mean()?;
    if is_degenerate(&xs, mean_x) || is_degenerate(&ys, mean_y) {
        return None;
    }

    let dx = &xs - mean_x;
    let dy = &ys - mean_y;
    let cov = (&dx * &dy).sum();
    let denom = (dx.mapv(|v| v * v).sum() * dy.mapv(|v| v * v).sum()).sqrt();

    let corr = (cov / denom).clamp(-1.0, 1.0);
    corr.is_finite().then_some(corr)
}

/// All scalar metrics for one run. Never fails; missing values mean
/// there was not enough data.
pub fn compute_metrics(series: &PriceSeries, benchmark: &PriceSeries) -> AnalysisMetrics {
    let returns = daily_returns(series);
    let bench_returns = daily_returns(benchmark);
    let extremes = price_extremes(series);

    AnalysisMetrics {
        mean_daily_return: mean_daily_return(&returns),
        elapsed_years: elapsed_years(series),
        cagr: cagr(series),
        max_price: extremes.map(|(max, _)| max),
        min_price: extremes.map(|(_, min)| min),
        volatility: volatility(&returns),
        correlation: correlation(&returns, &bench_returns),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRecord;
    use std::str::FromStr;

    fn record(date: &str, high: f64, low: f64, close: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_str(date).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    fn closes(dates: &[&str], closes: &[f64]) -> PriceSeries {
        let records = dates
            .iter()
            .zip(closes)
            .map(|(d, c)| record(d, *c, *c, *c))
            .collect();
        PriceSeries::new("TEST", records)
    }

    #[test]
    fn test_single_row_has_insufficient_data() {
        let series = closes(&["2024-01-02"], &[100.0]);
        let metrics = compute_metrics(&series, &series);

        assert_eq!(metrics.cagr, None);
        assert_eq!(metrics.volatility, None);
        assert_eq!(metrics.mean_daily_return, None);
        assert_eq!(metrics.elapsed_years, None);
        assert_eq!(metrics.correlation, None);
        assert_eq!(metrics.max_price.unwrap().price, 100.0);
    }

    #[test]
    fn test_known_annual_sequence() {
        let series = closes(&["2020-01-01", "2021-01-01", "2022-01-01"], &[100.0, 110.0, 121.0]);

        let returns = daily_returns(&series);
        assert_eq!(returns[0].value, None);
        assert!((returns[1].value.unwrap() - 10.0).abs() < 1e-9);
        assert!((returns[2].value.unwrap() - 10.0).abs() < 1e-9);

        let years = elapsed_years(&series).unwrap();
        assert!((years - 731.0 / 365.25).abs() < 1e-12);

        let growth = cagr(&series).unwrap();
        assert!((growth - (1.21_f64.powf(1.0 / years) - 1.0)).abs() < 1e-12);
        assert!((growth - 0.10).abs() < 1e-3);

        assert!(volatility(&returns).unwrap().abs() < 1e-9);
        assert!((mean_daily_return(&returns).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_cagr_exact_over_whole_years() {
        // 2020-01-01..2024-01-01 is 1461 days, exactly four 365.25-day years
        let series = closes(&["2020-01-01", "2022-01-01", "2024-01-01"], &[100.0, 121.0, 146.41]);
        assert!((cagr(&series).unwrap() - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_cagr_same_day_span_is_none() {
        let series = closes(&["2024-01-02", "2024-01-02"], &[100.0, 110.0]);
        assert_eq!(cagr(&series), None);
    }

    #[test]
    fn test_volatility_matches_sample_std() {
        let series = closes(
            &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            &[100.0, 102.0, 99.96, 101.9592],
        );
        let returns = daily_returns(&series);
        // returns are 2, -2, 2 (percent)
        let expected = (96.0_f64 / 9.0 / 2.0).sqrt();
        assert!((volatility(&returns).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_price_extremes_first_occurrence_wins() {
        let series = PriceSeries::new(
            "TEST",
            vec![
                record("2024-01-01", 10.0, 5.0, 8.0),
                record("2024-01-02", 12.0, 4.0, 9.0),
                record("2024-01-03", 12.0, 4.0, 9.0),
                record("2024-01-04", 11.0, 6.0, 9.0),
            ],
        );

        let (max, min) = price_extremes(&series).unwrap();
        assert_eq!(max.price, 12.0);
        assert_eq!(max.date, NaiveDate::from_str("2024-01-02").unwrap());
        assert_eq!(min.price, 4.0);
        assert_eq!(min.date, NaiveDate::from_str("2024-01-02").unwrap());
    }

    #[test]
    fn test_price_extremes_empty_series() {
        assert!(price_extremes(&PriceSeries::new("TEST", vec![])).is_none());
    }

    #[test]
    fn test_correlation_with_itself_is_one() {
        let series = closes(
            &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"],
            &[100.0, 103.0, 101.0, 104.5, 102.0],
        );
        let returns = daily_returns(&series);
        assert!((correlation(&returns, &returns).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_with_constant_series_is_none() {
        let dates = ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"];
        let moving = daily_returns(&closes(&dates, &[100.0, 103.0, 101.0, 104.5]));
        let flat = daily_returns(&closes(&dates, &[50.0, 50.0, 50.0, 50.0]));
        assert_eq!(correlation(&moving, &flat), None);
    }

    #[test]
    fn test_correlation_aligns_by_date() {
        let a = daily_returns(&closes(
            &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            &[100.0, 110.0, 99.0, 108.9],
        ));
        // benchmark is missing 2024-01-03, so 01-04's return spans two days
        let b = daily_returns(&closes(
            &["2024-01-01", "2024-01-02", "2024-01-04"],
            &[100.0, 105.0, 110.25],
        ));

        // Only 01-02 and 01-04 overlap: (10, 5) and (10, 5) has no variance
        assert_eq!(correlation(&a, &b), None);

        let c = daily_returns(&closes(
            &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            &[100.0, 95.0, 99.75, 94.7625],
        ));
        assert!((correlation(&a, &c).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_needs_two_pairs() {
        let a = daily_returns(&closes(&["2024-01-01", "2024-01-02"], &[100.0, 110.0]));
        assert_eq!(correlation(&a, &a), None);
    }
}
