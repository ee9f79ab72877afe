use serde::{Deserialize, Serialize};

use super::{ChipValues, DailyBar, IndicatorRow};

/// Render-ready row: one per trading date of the price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub bar: DailyBar,
    pub indicators: IndicatorRow,
    pub chips: ChipValues,
}
