//! Indicator Engine
//!
//! Attaches moving averages, Bollinger bands, K/D/J, MACD and RSI to a daily
//! bar series in one pass over the closes. Bars must be ordered oldest first.

use crate::constants::windows::{
    BOLLINGER_PERIOD, BOLLINGER_WIDTH, MACD_FAST, MACD_SIGNAL, MACD_SLOW, MA_PERIODS, RSI_COM,
    STOCHASTIC_PERIOD,
};
use crate::models::indicators::{
    calculate_bollinger, calculate_kdj, calculate_macd, calculate_rsi, calculate_sma,
};
use crate::models::{DailyBar, IndicatorRow, PriceRow, PriceSeries};
use std::time::Instant;

/// Compute indicators for every bar
///
/// Pure: the same input always yields the same output.
pub fn enhance(bars: &[DailyBar]) -> PriceSeries {
    let start = Instant::now();

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let ma_values: Vec<Vec<Option<f64>>> = MA_PERIODS
        .iter()
        .map(|&period| calculate_sma(&closes, period))
        .collect();
    let bollinger = calculate_bollinger(&closes, BOLLINGER_PERIOD, BOLLINGER_WIDTH);
    let kdj = calculate_kdj(&highs, &lows, &closes, STOCHASTIC_PERIOD);
    let macd = calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let rsi = calculate_rsi(&closes, RSI_COM);

    let series: PriceSeries = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (bb_mid, bb_up, bb_low) = bollinger[i];
            let (k, d, j) = kdj[i];
            let (dif, dea, macd_hist) = macd[i];

            PriceRow {
                bar: bar.clone(),
                indicators: IndicatorRow {
                    ma5: ma_values[0][i],
                    ma10: ma_values[1][i],
                    ma20: ma_values[2][i],
                    ma60: ma_values[3][i],
                    ma120: ma_values[4][i],
                    ma240: ma_values[5][i],
                    bb_mid,
                    bb_up,
                    bb_low,
                    k,
                    d,
                    j,
                    dif,
                    dea,
                    macd_hist,
                    rsi: rsi[i],
                },
            }
        })
        .collect();

    tracing::debug!(
        "Computed indicators for {} bars in {:.2}ms",
        series.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn sample_bars(count: usize) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        (0..count)
            .map(|i| {
                let close = 100.0 + ((i * 7) % 13) as f64 - 6.0;
                DailyBar::new(
                    start + Duration::days(i as i64),
                    close - 0.5,
                    close + 1.0,
                    close - 1.5,
                    close,
                    1000 + i as u64,
                )
            })
            .collect()
    }

    #[test]
    fn test_enhance_is_idempotent() {
        let bars = sample_bars(300);
        let first = enhance(&bars);
        let second = enhance(&bars);
        assert_eq!(first, second);
    }

    #[test]
    fn test_warmup_windows() {
        let bars = sample_bars(70);
        let series = enhance(&bars);

        assert_eq!(series.len(), 70);
        assert!(series[3].indicators.ma5.is_none());
        assert!(series[4].indicators.ma5.is_some());
        assert!(series[18].indicators.bb_up.is_none());
        assert!(series[19].indicators.bb_up.is_some());
        assert!(series[58].indicators.ma60.is_none());
        assert!(series[59].indicators.ma60.is_some());
        assert!(series[69].indicators.ma120.is_none());

        // Recursive indicators are defined from the first bar
        assert_eq!(series[0].indicators.k, Some(50.0));
        assert_eq!(series[0].indicators.d, Some(50.0));
        assert_eq!(series[0].indicators.j, Some(50.0));
        assert_eq!(series[0].indicators.dif, Some(0.0));
        assert!(series[0].indicators.rsi.is_none());
    }

    #[test]
    fn test_bands_bracket_mid() {
        let bars = sample_bars(40);
        let series = enhance(&bars);
        for (i, row) in series.iter().enumerate().skip(19) {
            let ind = &row.indicators;
            assert!(ind.bb_up.unwrap() >= ind.bb_mid.unwrap());
            assert!(ind.bb_low.unwrap() <= ind.bb_mid.unwrap());
            assert_eq!(ind.bb_mid, ind.ma20);

            let window: Vec<f64> = bars[i - 19..=i].iter().map(|b| b.close).collect();
            let mean = window.iter().sum::<f64>() / 20.0;
            let std = (window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / 19.0).sqrt();
            assert!(std > 0.0);
            assert!((ind.bb_up.unwrap() - ind.bb_mid.unwrap() - 2.0 * std).abs() < 1e-9);
            assert!((ind.bb_mid.unwrap() - ind.bb_low.unwrap() - 2.0 * std).abs() < 1e-9);
        }
    }

    #[test]
    fn test_macd_histogram_is_twice_spread() {
        let series = enhance(&sample_bars(60));
        let mut nonzero = 0;
        for row in &series {
            let ind = &row.indicators;
            let spread = ind.dif.unwrap() - ind.dea.unwrap();
            assert!((ind.macd_hist.unwrap() - 2.0 * spread).abs() < 1e-12);
            if spread.abs() > 1e-6 {
                nonzero += 1;
            }
        }
        assert!(nonzero > 0);
    }

    #[test]
    fn test_flat_series_has_no_non_finite_values() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars: Vec<DailyBar> = (0..30)
            .map(|i| DailyBar::new(date + Duration::days(i), 10.0, 10.0, 10.0, 10.0, 0))
            .collect();
        let series = enhance(&bars);

        for row in &series {
            for (_, value) in row.indicators.fields() {
                if let Some(v) = value {
                    assert!(v.is_finite());
                }
            }
            // No losses at all: RSI is undefined
            assert!(row.indicators.rsi.is_none());
        }
        assert!((series[29].indicators.k.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series() {
        assert!(enhance(&[]).is_empty());
    }
}
