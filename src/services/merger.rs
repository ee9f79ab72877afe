//! Time Series Merger
//!
//! Left-joins chip sources onto the indicator-enriched price series by date.
//! The price series is the date axis: every price date yields exactly one
//! merged row and chip-only dates are discarded. Chip fields with no data for
//! a date are 0.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::models::{ChipFetch, ChipField, ChipValues, MergedRow, PriceRow};

/// Merge the price series with any number of chip fetch results
///
/// When a source lists the same date more than once, the last occurrence wins.
pub fn merge(primary: &[PriceRow], fetches: &[ChipFetch]) -> Vec<MergedRow> {
    let mut by_date: HashMap<NaiveDate, ChipValues> = HashMap::new();

    for fetch in fetches {
        let source = fetch.source();
        if let ChipFetch::Unavailable { reason, .. } = fetch {
            tracing::info!("Zero-filling {} fields: {}", source, reason);
            continue;
        }

        // Last occurrence per date within this source
        let mut latest: HashMap<NaiveDate, &BTreeMap<ChipField, f64>> = HashMap::new();
        for row in fetch.rows() {
            latest.insert(row.date, &row.values);
        }

        for (date, values) in latest {
            let entry = by_date.entry(date).or_default();
            for field in source.fields() {
                entry.set(*field, values.get(field).copied().unwrap_or(0.0));
            }
        }
    }

    let merged: Vec<MergedRow> = primary
        .iter()
        .map(|row| {
            let mut chips = by_date.get(&row.bar.date).copied().unwrap_or_default();
            chips.refresh_total();
            MergedRow {
                bar: row.bar.clone(),
                indicators: row.indicators.clone(),
                chips,
            }
        })
        .collect();

    let matched = merged
        .iter()
        .filter(|row| by_date.contains_key(&row.bar.date))
        .count();
    tracing::debug!(
        "Merged {} price rows with {} sources ({} rows carry chip data)",
        merged.len(),
        fetches.len(),
        matched
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChipRow, ChipSource, DailyBar};
    use crate::services::indicator_engine::enhance;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn primary() -> Vec<PriceRow> {
        let bars: Vec<DailyBar> = [(3, 100.0), (4, 102.0), (5, 101.0)]
            .iter()
            .map(|&(day, close)| DailyBar::new(date(2023, 1, day), close, close, close, close, 10))
            .collect();
        enhance(&bars)
    }

    #[test]
    fn test_end_to_end_left_join() {
        let fetches = vec![ChipFetch::Rows {
            source: ChipSource::Institutional,
            rows: vec![ChipRow::new(date(2023, 1, 4)).with(ChipField::ForeignNet, 500.0)],
        }];
        let merged = merge(&primary(), &fetches);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].chips.foreign_net, 0.0);
        assert_eq!(merged[1].chips.foreign_net, 500.0);
        assert_eq!(merged[2].chips.foreign_net, 0.0);
        assert_eq!(merged[1].chips.institutional_total, 500.0);
        // Fields the source did not supply are zero
        assert_eq!(merged[1].chips.trust_net, 0.0);
    }

    #[test]
    fn test_unavailable_sources_zero_fill() {
        let fetches = vec![
            ChipFetch::unavailable(ChipSource::Institutional, "blocked"),
            ChipFetch::unavailable(ChipSource::Margin, "timeout"),
        ];
        let merged = merge(&primary(), &fetches);

        assert_eq!(merged.len(), 3);
        for row in &merged {
            assert_eq!(row.chips, ChipValues::default());
        }
    }

    #[test]
    fn test_no_sources() {
        let merged = merge(&primary(), &[]);
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|r| r.chips == ChipValues::default()));
    }

    #[test]
    fn test_chip_only_dates_are_dropped_and_order_kept() {
        let fetches = vec![ChipFetch::Rows {
            source: ChipSource::Margin,
            rows: vec![
                ChipRow::new(date(2023, 1, 5)).with(ChipField::MarginDelta, -3.0),
                ChipRow::new(date(2023, 1, 6)).with(ChipField::MarginDelta, 9.0),
                ChipRow::new(date(2022, 12, 30)).with(ChipField::MarginDelta, 1.0),
            ],
        }];
        let merged = merge(&primary(), &fetches);
        let dates: Vec<NaiveDate> = merged.iter().map(|r| r.bar.date).collect();

        assert_eq!(dates, vec![date(2023, 1, 3), date(2023, 1, 4), date(2023, 1, 5)]);
        assert_eq!(merged[2].chips.margin_delta, -3.0);
    }

    #[test]
    fn test_duplicate_dates_keep_last() {
        let fetches = vec![ChipFetch::Rows {
            source: ChipSource::Institutional,
            rows: vec![
                ChipRow::new(date(2023, 1, 3))
                    .with(ChipField::ForeignNet, 1.0)
                    .with(ChipField::TrustNet, 7.0),
                ChipRow::new(date(2023, 1, 3)).with(ChipField::ForeignNet, 2.0),
            ],
        }];
        let merged = merge(&primary(), &fetches);

        assert_eq!(merged[0].chips.foreign_net, 2.0);
        // The last row did not carry trust_net
        assert_eq!(merged[0].chips.trust_net, 0.0);
    }

    #[test]
    fn test_multiple_sources_combine() {
        let fetches = vec![
            ChipFetch::Rows {
                source: ChipSource::Institutional,
                rows: vec![ChipRow::new(date(2023, 1, 4))
                    .with(ChipField::ForeignNet, 100.0)
                    .with(ChipField::TrustNet, 20.0)
                    .with(ChipField::DealerNet, -5.0)],
            },
            ChipFetch::Rows {
                source: ChipSource::Margin,
                rows: vec![ChipRow::new(date(2023, 1, 4)).with(ChipField::MarginBalance, 9000.0)],
            },
            ChipFetch::unavailable(ChipSource::Breadth, "not configured"),
        ];
        let merged = merge(&primary(), &fetches);
        let row = &merged[1];

        assert_eq!(row.chips.institutional_total, 115.0);
        assert_eq!(row.chips.margin_balance, 9000.0);
        assert_eq!(row.chips.buy_sell_diff, 0.0);
        // Indicators survive the merge untouched
        assert_eq!(row.indicators, primary()[1].indicators);
    }
}
