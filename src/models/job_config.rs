use chrono::{Duration, NaiveDate};
use std::path::PathBuf;

use super::PanelKind;
use crate::constants::{
    DEFAULT_CHIP_LOOKBACK_DAYS, DEFAULT_DISPLAY_WINDOW, DEFAULT_LOOKBACK_DAYS, DEFAULT_SYMBOL,
    DASHBOARD_FILENAME,
};

/// Configuration for one dashboard run
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Instrument identifier without exchange suffix (e.g., "2313")
    pub symbol: String,

    /// Webhook delivery target; delivery is skipped when absent
    pub webhook_endpoint: Option<String>,

    /// Calendar days of price history to fetch
    pub lookback_days: u32,

    /// Calendar days of chip history to request from each chip page
    pub chip_lookback_days: u32,

    /// Trailing rows to render
    pub display_window: usize,

    /// Directory for the rendered image
    pub output_dir: PathBuf,

    /// Panels to render, top to bottom
    pub panels: Vec<PanelKind>,

    /// URL template for the breadth page ({symbol}, {start}, {end})
    pub breadth_url: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            webhook_endpoint: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            chip_lookback_days: DEFAULT_CHIP_LOOKBACK_DAYS,
            display_window: DEFAULT_DISPLAY_WINDOW,
            output_dir: PathBuf::from("."),
            panels: PanelKind::default_set(),
            breadth_url: None,
        }
    }
}

impl JobConfig {
    /// Create new config for a symbol with default windows
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Chip request range ending at `today`, as (start, end) in YYYY-MM-DD
    pub fn chip_date_range(&self, today: NaiveDate) -> (String, String) {
        let start = today - Duration::days(self.chip_lookback_days as i64);
        (
            start.format("%Y-%m-%d").to_string(),
            today.format("%Y-%m-%d").to_string(),
        )
    }

    /// Where the dashboard image is written
    pub fn dashboard_path(&self) -> PathBuf {
        self.output_dir.join(DASHBOARD_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.symbol, "2313");
        assert_eq!(config.lookback_days, 365);
        assert_eq!(config.chip_lookback_days, 200);
        assert_eq!(config.display_window, 120);
        assert!(config.webhook_endpoint.is_none());
        assert_eq!(config.panels, PanelKind::default_set());
    }

    #[test]
    fn test_chip_date_range() {
        let config = JobConfig::new("2330");
        let today = NaiveDate::from_ymd_opt(2023, 7, 20).unwrap();
        let (start, end) = config.chip_date_range(today);
        assert_eq!(start, "2023-01-01");
        assert_eq!(end, "2023-07-20");
    }

    #[test]
    fn test_dashboard_path() {
        let mut config = JobConfig::new("2330");
        config.output_dir = PathBuf::from("/tmp/out");
        assert_eq!(config.dashboard_path(), PathBuf::from("/tmp/out/dashboard.png"));
    }
}
