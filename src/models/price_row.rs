use serde::{Deserialize, Serialize};

use super::DailyBar;

/// Indicator values derived for one bar
///
/// Every field is `None` until its trailing window has enough history, or when
/// the arithmetic was not finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    // Moving Averages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma5: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma10: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma60: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma120: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma240: Option<f64>,

    // Bollinger Bands (20-bar mean +/- 2 sample deviations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bb_mid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bb_up: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bb_low: Option<f64>,

    // Stochastic oscillator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub j: Option<f64>,

    // MACD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dif: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dea: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_hist: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
}

impl IndicatorRow {
    /// Names and values in CSV column order
    pub fn fields(&self) -> [(&'static str, Option<f64>); 16] {
        [
            ("ma5", self.ma5),
            ("ma10", self.ma10),
            ("ma20", self.ma20),
            ("ma60", self.ma60),
            ("ma120", self.ma120),
            ("ma240", self.ma240),
            ("bb_mid", self.bb_mid),
            ("bb_up", self.bb_up),
            ("bb_low", self.bb_low),
            ("k", self.k),
            ("d", self.d),
            ("j", self.j),
            ("dif", self.dif),
            ("dea", self.dea),
            ("macd_hist", self.macd_hist),
            ("rsi", self.rsi),
        ]
    }
}

/// A daily bar together with its indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub bar: DailyBar,
    pub indicators: IndicatorRow,
}
