use std::fs;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::info;

use crate::errors::AppError;
use crate::models::{DailyReturn, PriceSeries};

pub fn export_path(dir: &Path, ticker: &str) -> PathBuf {
    dir.join(format!("{}_stock_data.csv", ticker))
}

/// Write the cleaned series plus its daily return column to
/// `{dir}/{ticker}_stock_data.csv`, creating `dir` if needed.
pub fn export_price_series(
    dir: &Path,
    series: &PriceSeries,
    returns: &[DailyReturn],
) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)?;
    let path = export_path(dir, &series.symbol);

    let mut writer = WriterBuilder::new().from_path(&path)?;
    writer.write_record(["Date", "Open", "High", "Low", "Close", "Volume", "Daily Return"])?;

    for (record, ret) in series.records.iter().zip(returns) {
        writer.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.open.to_string(),
            record.high.to_string(),
            record.low.to_string(),
            record.close.to_string(),
            record.volume.to_string(),
            ret.value.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    info!("Exported {} rows for {} to {}", series.len(), series.symbol, path.display());
    Ok(path)
}
