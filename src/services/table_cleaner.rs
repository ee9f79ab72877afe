//! Table Cleaner
//!
//! Turns raw scraped tables into dated chip rows. The target table is picked
//! by a marker phrase, fixed column positions are mapped to chip fields, and
//! rows whose first column is not a regional date are dropped.

use chrono::NaiveDate;

use crate::constants::{chip_column, chip_marker};
use crate::models::{ChipField, ChipRow, ChipSource};
use crate::services::date_converter::{is_regional_date, regional_to_iso};

/// One scraped table: rows of cell texts
pub type RawTable = Vec<Vec<String>>;

/// Column layout of a chip source's table
#[derive(Debug, Clone)]
pub struct ColumnContract {
    pub source: ChipSource,
    /// Phrase that appears only in the target table
    pub marker: &'static str,
    pub date_column: usize,
    /// (column position, field) pairs
    pub columns: &'static [(usize, ChipField)],
}

impl ColumnContract {
    /// Built-in layout for a chip source
    pub fn for_source(source: ChipSource) -> Self {
        match source {
            ChipSource::Institutional => Self {
                source,
                marker: chip_marker::INSTITUTIONAL,
                date_column: chip_column::DATE,
                columns: &[
                    (chip_column::FOREIGN_NET, ChipField::ForeignNet),
                    (chip_column::TRUST_NET, ChipField::TrustNet),
                    (chip_column::DEALER_NET, ChipField::DealerNet),
                ],
            },
            ChipSource::Margin => Self {
                source,
                marker: chip_marker::MARGIN,
                date_column: chip_column::DATE,
                columns: &[
                    (chip_column::MARGIN_BALANCE, ChipField::MarginBalance),
                    (chip_column::MARGIN_DELTA, ChipField::MarginDelta),
                    (chip_column::SHORT_BALANCE, ChipField::ShortBalance),
                    (chip_column::SHORT_DELTA, ChipField::ShortDelta),
                ],
            },
            ChipSource::Breadth => Self {
                source,
                marker: chip_marker::BREADTH,
                date_column: chip_column::DATE,
                columns: &[(chip_column::BUY_SELL_DIFF, ChipField::BuySellDiff)],
            },
        }
    }
}

/// First table with any cell containing `marker`
pub fn find_table<'a>(blocks: &'a [RawTable], marker: &str) -> Option<&'a RawTable> {
    blocks
        .iter()
        .find(|table| table.iter().flatten().any(|cell| cell.contains(marker)))
}

/// Parse numeric cell text; thousands separators and a leading `+` are
/// stripped, anything unparsable is 0
pub fn coerce_number(text: &str) -> f64 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned).trim();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Convert a date cell to a calendar date, or `None` to drop the row
fn parse_row_date(cell: &str) -> Option<NaiveDate> {
    if !is_regional_date(cell) {
        return None;
    }
    let iso = regional_to_iso(cell)?;
    NaiveDate::parse_from_str(&iso, "%Y-%m-%d").ok()
}

/// Extract chip rows from the table identified by the contract's marker
///
/// Returns `None` when no table carries the marker. Rows are kept in table
/// order; duplicate dates are left for the merge step to resolve.
pub fn clean_table(blocks: &[RawTable], contract: &ColumnContract) -> Option<Vec<ChipRow>> {
    let table = find_table(blocks, contract.marker)?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for raw in table {
        let date = match raw
            .get(contract.date_column)
            .and_then(|cell| parse_row_date(cell))
        {
            Some(date) => date,
            None => {
                dropped += 1;
                continue;
            }
        };

        let row = contract
            .columns
            .iter()
            .fold(ChipRow::new(date), |row, &(position, field)| {
                let value = raw.get(position).map(|cell| coerce_number(cell)).unwrap_or(0.0);
                row.with(field, value)
            });
        rows.push(row);
    }

    tracing::debug!(
        "Cleaned {} table: {} rows kept, {} non-date rows dropped",
        contract.source,
        rows.len(),
        dropped
    );

    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("1,234"), 1234.0);
        assert_eq!(coerce_number("+56"), 56.0);
        assert_eq!(coerce_number("-1,000"), -1000.0);
        assert_eq!(coerce_number(" 12.5 "), 12.5);
        assert_eq!(coerce_number("N/A"), 0.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
        assert_eq!(coerce_number("inf"), 0.0);
    }

    #[test]
    fn test_find_table_by_marker() {
        let blocks = vec![
            table(&[&["menu", "links"]]),
            table(&[&["日期", "外資買賣超", "投信買賣超", "自營商買賣超"]]),
            table(&[&["外資買賣超 duplicate"]]),
        ];
        let found = find_table(&blocks, "外資買賣超").unwrap();
        assert_eq!(found[0][0], "日期");
        assert!(find_table(&blocks, "融資餘額").is_none());
    }

    #[test]
    fn test_clean_institutional_table() {
        let blocks = vec![
            table(&[&["個股代號", "2313"]]),
            table(&[
                &["日期", "外資買賣超", "投信買賣超", "自營商買賣超"],
                &["112/01/04", "1,200", "+30", "-5"],
                &["112/01/03", "-800", "0", "N/A"],
                &["合計", "400", "30", "-5"],
            ]),
        ];
        let contract = ColumnContract::for_source(ChipSource::Institutional);
        let rows = clean_table(&blocks, &contract).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(2023, 1, 4));
        assert_eq!(rows[0].values[&ChipField::ForeignNet], 1200.0);
        assert_eq!(rows[0].values[&ChipField::TrustNet], 30.0);
        assert_eq!(rows[0].values[&ChipField::DealerNet], -5.0);
        assert_eq!(rows[1].values[&ChipField::DealerNet], 0.0);
    }

    #[test]
    fn test_clean_margin_table_positions() {
        let row: Vec<&str> = vec![
            "112/02/01", "a", "b", "c", "12,345", "+120", "x", "y", "z", "p", "q", "678", "-9",
        ];
        let blocks = vec![table(&[
            &["日期", "融資", "", "", "融資餘額"],
            row.as_slice(),
        ])];
        let contract = ColumnContract::for_source(ChipSource::Margin);
        let rows = clean_table(&blocks, &contract).unwrap();

        assert_eq!(rows.len(), 1);
        let values = &rows[0].values;
        assert_eq!(values[&ChipField::MarginBalance], 12345.0);
        assert_eq!(values[&ChipField::MarginDelta], 120.0);
        assert_eq!(values[&ChipField::ShortBalance], 678.0);
        assert_eq!(values[&ChipField::ShortDelta], -9.0);
    }

    #[test]
    fn test_short_rows_zero_fill_missing_cells() {
        let blocks = vec![table(&[&["買賣家數差"], &["112/03/01"]])];
        let contract = ColumnContract::for_source(ChipSource::Breadth);
        let rows = clean_table(&blocks, &contract).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[&ChipField::BuySellDiff], 0.0);
    }

    #[test]
    fn test_invalid_calendar_dates_dropped() {
        let blocks = vec![table(&[
            &["外資買賣超"],
            &["112/13/40", "1"],
            &["112/2/28", "2"],
        ])];
        let contract = ColumnContract::for_source(ChipSource::Institutional);
        let rows = clean_table(&blocks, &contract).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2023, 2, 28));
    }

    #[test]
    fn test_missing_marker_is_no_data() {
        let blocks = vec![table(&[&["112/01/04", "1"]])];
        let contract = ColumnContract::for_source(ChipSource::Margin);
        assert!(clean_table(&blocks, &contract).is_none());
        assert!(clean_table(&[], &contract).is_none());
    }

    #[test]
    fn test_every_kept_row_has_regional_date() {
        let blocks = vec![table(&[
            &["日期 / 外資 / 投信"],
            &["外資買賣超", "投信買賣超"],
            &["112/5/2", "10"],
            &["小計", "10"],
            &["112/5/3", "11"],
        ])];
        let contract = ColumnContract::for_source(ChipSource::Institutional);
        let rows = clean_table(&blocks, &contract).unwrap();
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2023, 5, 2), date(2023, 5, 3)]);
    }
}
