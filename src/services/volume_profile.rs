//! Volume Profile
//!
//! Distributes each bar's volume uniformly across the price buckets between
//! its low and high, producing a volume-by-price histogram for the rendered
//! window.

use serde::Serialize;
use std::collections::HashMap;

use crate::constants::{TICK_SIZE_BANDS, TICK_SIZE_TOP, VOLUME_PROFILE_MAX_BINS};
use crate::models::DailyBar;

/// Slack for prices that land a hair below a bucket edge after division
const BUCKET_EPSILON: f64 = 1e-9;

/// Bucket edges are rounded to this many steps per unit price
const PRICE_SCALE: f64 = 1e8;

/// Individual price level with volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLevelVolume {
    /// Lower edge of the bucket
    pub price: f64,
    pub volume: f64,
    pub percentage: f64,
}

/// Point of Control (price with highest volume)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfControl {
    pub price: f64,
    pub volume: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeProfile {
    /// Price levels sorted ascending
    pub levels: Vec<PriceLevelVolume>,
    pub poc: Option<PointOfControl>,
    pub bucket_size: f64,
    pub total_volume: f64,
}

/// Volume Profile Builder - core algorithm
pub struct VolumeProfileBuilder {
    profile_map: HashMap<i64, f64>,
    bucket_size: f64,
}

impl VolumeProfileBuilder {
    pub fn new(bucket_size: f64) -> Self {
        Self {
            profile_map: HashMap::new(),
            bucket_size,
        }
    }

    /// Bucket holding `price`; prices on a bucket edge belong to that bucket
    fn bucket_index(&self, price: f64) -> i64 {
        (price / self.bucket_size + BUCKET_EPSILON).floor() as i64
    }

    /// Lower edge of a bucket, snapped to remove division noise
    fn bucket_price(&self, idx: i64) -> f64 {
        (idx as f64 * self.bucket_size * PRICE_SCALE).round() / PRICE_SCALE
    }

    /// Add a bar to the volume profile
    pub fn add_bar(&mut self, bar: &DailyBar) {
        // Skip zero-volume bars
        if bar.volume == 0 || self.bucket_size <= 0.0 {
            return;
        }

        let low_idx = self.bucket_index(bar.low);
        let high_idx = self.bucket_index(bar.high);

        // Even a doji occupies one bucket
        let num_steps = (high_idx - low_idx) + 1;
        if num_steps <= 0 {
            return;
        }

        let vol_per_step = bar.volume as f64 / num_steps as f64;
        for idx in low_idx..=high_idx {
            *self.profile_map.entry(idx).or_insert(0.0) += vol_per_step;
        }
    }

    /// Build the final volume profile (sorted by price)
    pub fn build(self) -> VolumeProfile {
        let total_volume: f64 = self.profile_map.values().sum();
        let percentage = |volume: f64| {
            if total_volume > 0.0 {
                volume / total_volume * 100.0
            } else {
                0.0
            }
        };

        let mut levels: Vec<PriceLevelVolume> = self
            .profile_map
            .iter()
            .map(|(&idx, &volume)| PriceLevelVolume {
                price: self.bucket_price(idx),
                volume,
                percentage: percentage(volume),
            })
            .collect();
        levels.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));

        let poc = levels
            .iter()
            .max_by(|a, b| a.volume.partial_cmp(&b.volume).unwrap_or(std::cmp::Ordering::Equal))
            .map(|level| PointOfControl {
                price: level.price,
                volume: level.volume,
                percentage: level.percentage,
            });

        VolumeProfile {
            levels,
            poc,
            bucket_size: self.bucket_size,
            total_volume,
        }
    }
}

/// Get tick size based on price level (Taiwan exchange bands)
pub fn get_tick_size_tw(price: f64) -> f64 {
    TICK_SIZE_BANDS
        .iter()
        .find(|(upper, _)| price < *upper)
        .map(|(_, tick)| *tick)
        .unwrap_or(TICK_SIZE_TOP)
}

/// Bucket size: the tick size, widened in whole ticks so the window's range
/// spans at most `max_bins` buckets
pub fn bucket_size_for(low: f64, high: f64, avg_price: f64, max_bins: usize) -> f64 {
    let tick = get_tick_size_tw(avg_price);
    let range = (high - low).max(0.0);
    let max_bins = max_bins.max(1) as f64;
    let ticks_per_bucket = (range / tick / max_bins).ceil().max(1.0);
    tick * ticks_per_bucket
}

/// Volume profile over a window of bars
pub fn calculate_volume_profile(bars: &[&DailyBar]) -> VolumeProfile {
    if bars.is_empty() {
        return VolumeProfile::default();
    }

    let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let avg_price = bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64;

    let mut builder =
        VolumeProfileBuilder::new(bucket_size_for(low, high, avg_price, VOLUME_PROFILE_MAX_BINS));
    for bar in bars {
        builder.add_bar(bar);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(low: f64, high: f64, volume: u64) -> DailyBar {
        let date = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        DailyBar::new(date, low, high, low, high, volume)
    }

    #[test]
    fn test_tick_sizes() {
        assert_eq!(get_tick_size_tw(9.5), 0.01);
        assert_eq!(get_tick_size_tw(10.0), 0.05);
        assert_eq!(get_tick_size_tw(75.0), 0.1);
        assert_eq!(get_tick_size_tw(250.0), 0.5);
        assert_eq!(get_tick_size_tw(999.0), 1.0);
        assert_eq!(get_tick_size_tw(1200.0), 5.0);
    }

    #[test]
    fn test_bucket_size_widening() {
        // Range 20 at tick 0.5 is 40 ticks; 10 bins -> 4 ticks per bucket
        assert_eq!(bucket_size_for(100.0, 120.0, 110.0, 10), 2.0);
        // Narrow range keeps the raw tick
        assert_eq!(bucket_size_for(100.0, 100.2, 100.1, 40), 0.5);
    }

    #[test]
    fn test_profile_conserves_volume() {
        let bars = vec![bar(100.0, 104.0, 300), bar(102.0, 106.0, 500), bar(101.0, 101.0, 0)];
        let refs: Vec<&DailyBar> = bars.iter().collect();
        let profile = calculate_volume_profile(&refs);

        assert!((profile.total_volume - 800.0).abs() < 1e-6);
        let summed: f64 = profile.levels.iter().map(|l| l.volume).sum();
        assert!((summed - 800.0).abs() < 1e-6);

        let pct: f64 = profile.levels.iter().map(|l| l.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-6);

        for pair in profile.levels.windows(2) {
            assert!(pair[0].price < pair[1].price);
        }
    }

    #[test]
    fn test_poc_is_max_bucket() {
        let bars = vec![bar(50.0, 50.0, 1000), bar(50.0, 52.0, 90)];
        let refs: Vec<&DailyBar> = bars.iter().collect();
        let profile = calculate_volume_profile(&refs);
        let poc = profile.poc.unwrap();
        let max = profile
            .levels
            .iter()
            .map(|l| l.volume)
            .fold(f64::MIN, f64::max);

        assert_eq!(poc.volume, max);
        assert!((poc.price - 50.0).abs() < 0.2);
    }

    #[test]
    fn test_poc_on_exact_tick_prices() {
        for price in [23.45, 57.3, 9.87, 123.5] {
            let bars = vec![bar(price, price, 100)];
            let refs: Vec<&DailyBar> = bars.iter().collect();
            let profile = calculate_volume_profile(&refs);

            assert_eq!(profile.levels.len(), 1, "price {}", price);
            assert_eq!(profile.poc.unwrap().price, price);
        }
    }

    #[test]
    fn test_bucket_edges_are_exact() {
        let bars = vec![bar(23.40, 23.60, 500)];
        let refs: Vec<&DailyBar> = bars.iter().collect();
        let profile = calculate_volume_profile(&refs);
        let prices: Vec<f64> = profile.levels.iter().map(|l| l.price).collect();

        assert_eq!(prices, vec![23.40, 23.45, 23.50, 23.55, 23.60]);
    }

    #[test]
    fn test_empty_window() {
        let profile = calculate_volume_profile(&[]);
        assert!(profile.levels.is_empty());
        assert!(profile.poc.is_none());
    }
}
