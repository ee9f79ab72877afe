//! CSV input of daily bars and CSV output of merged rows

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ChipValues, DailyBar, IndicatorRow, MergedRow};

const BAR_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Read bars from a `date,open,high,low,close,volume` CSV (volume in lots).
/// Rows are returned sorted by date; a repeated date keeps the last row.
pub fn read_daily_bars(path: &Path) -> Result<Vec<DailyBar>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = BAR_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h.trim() == *col))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Parse(format!(
            "{}: missing columns {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let mut bars = std::collections::BTreeMap::new();
    for record in reader.deserialize::<DailyBar>() {
        let bar = record.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            Error::Parse(format!("{} line {}: {}", path.display(), line, e))
        })?;
        bars.insert(bar.date, bar);
    }

    debug!("Read {} bars from {}", bars.len(), path.display());
    Ok(bars.into_values().collect())
}

/// Header row for merged output
pub fn merged_header() -> Vec<&'static str> {
    let mut header: Vec<&'static str> = BAR_COLUMNS.to_vec();
    header.extend(IndicatorRow::default().fields().iter().map(|(name, _)| *name));
    header.extend(ChipValues::default().columns().iter().map(|(name, _)| *name));
    header
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write merged rows as CSV; `None` indicators become empty cells
pub fn write_merged_rows<W: Write>(writer: W, rows: &[MergedRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(merged_header())?;

    for row in rows {
        let bar = &row.bar;

        let mut record: Vec<String> = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        record.extend(row.indicators.fields().iter().map(|(_, v)| format_value(*v)));
        record.extend(row.chips.columns().iter().map(|(_, v)| v.to_string()));

        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
