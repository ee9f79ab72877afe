use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::SHARES_PER_LOT;

/// One trading day of OHLCV data for a single instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Exchange-local trading date
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume in board lots (1 lot = 1000 shares)
    pub volume: u64,
}

impl DailyBar {
    /// Create a new bar with volume already expressed in lots
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Create a new bar from a raw share count
    pub fn from_shares(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        shares: u64,
    ) -> Self {
        Self::new(date, open, high, low, close, shares / SHARES_PER_LOT)
    }

    /// True when the close is at or above the open
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_shares_converts_to_lots() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        let bar = DailyBar::from_shares(date, 100.0, 102.0, 99.0, 101.0, 1_234_567);
        assert_eq!(bar.volume, 1234);
    }

    #[test]
    fn test_is_up() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert!(DailyBar::new(date, 100.0, 101.0, 99.0, 100.0, 1).is_up());
        assert!(!DailyBar::new(date, 100.0, 101.0, 99.0, 99.5, 1).is_up());
    }
}
