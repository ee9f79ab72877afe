mod chip;
mod daily_bar;
mod job_config;
mod merged_row;
mod panel;
mod price_row;
pub mod indicators;

pub use chip::{ChipFetch, ChipField, ChipRow, ChipSource, ChipValues};
pub use daily_bar::DailyBar;
pub use job_config::JobConfig;
pub use merged_row::MergedRow;
pub use panel::PanelKind;
pub use price_row::{IndicatorRow, PriceRow};

/// Price series for a single instrument, oldest first
pub type PriceSeries = Vec<PriceRow>;
