use chrono::NaiveDate;
use thiserror::Error;

use crate::external::price_provider::{ColumnLabel, RawPriceTable};
use crate::models::{PriceRecord, PriceSeries};

#[derive(Debug, Error, PartialEq)]
pub enum CleanError {
    #[error("no price data returned for {0}")]
    EmptyData(String),
    #[error("missing column '{column}' in data for {symbol}")]
    MissingColumn { symbol: String, column: String },
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow { row: usize, found: usize, expected: usize },
    #[error("{dates} dates but {rows} rows in data for {symbol}")]
    IndexMismatch { symbol: String, dates: usize, rows: usize },
    #[error("dates for {symbol} are not strictly ascending at row {row} ({date})")]
    UnorderedDates { symbol: String, row: usize, date: NaiveDate },
}

/// Collapse multi-level column labels to their first level, trimmed.
pub fn flatten_columns(columns: &[ColumnLabel]) -> Vec<String> {
    columns
        .iter()
        .map(|label| label.first().map(|s| s.trim().to_string()).unwrap_or_default())
        .collect()
}

fn column_index(names: &[String], symbol: &str, column: &str) -> Result<usize, CleanError> {
    names
        .iter()
        .position(|n| n == column)
        .ok_or_else(|| CleanError::MissingColumn {
            symbol: symbol.to_string(),
            column: column.to_string(),
        })
}

/// Normalize a provider table into a [`PriceSeries`].
///
/// Rows are kept as delivered: no filtering and no gap filling. A table whose
/// index and rows differ in length, or whose dates are not strictly
/// ascending, is rejected.
pub fn clean_price_table(symbol: &str, table: RawPriceTable) -> Result<PriceSeries, CleanError> {
    if table.is_empty() {
        return Err(CleanError::EmptyData(symbol.to_string()));
    }
    if table.index.len() != table.rows.len() {
        return Err(CleanError::IndexMismatch {
            symbol: symbol.to_string(),
            dates: table.index.len(),
            rows: table.rows.len(),
        });
    }
    if let Some(i) = table.index.windows(2).position(|w| w[1] <= w[0]) {
        return Err(CleanError::UnorderedDates {
            symbol: symbol.to_string(),
            row: i + 1,
            date: table.index[i + 1],
        });
    }

    let names = flatten_columns(&table.columns);
    let open = column_index(&names, symbol, "Open")?;
    let high = column_index(&names, symbol, "High")?;
    let low = column_index(&names, symbol, "Low")?;
    let close = column_index(&names, symbol, "Close")?;
    let volume = column_index(&names, symbol, "Volume")?;

    let records = table
        .index
        .iter()
        .zip(table.rows.iter())
        .enumerate()
        .map(|(i, (date, row))| {
            if row.len() != names.len() {
                return Err(CleanError::RaggedRow {
                    row: i,
                    found: row.len(),
                    expected: names.len(),
                });
            }
            Ok(PriceRecord {
                date: *date,
                open: row[open],
                high: row[high],
                low: row[low],
                close: row[close],
                volume: row[volume],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PriceSeries::new(symbol, records))
}
