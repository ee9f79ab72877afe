//! Data Source and Indicator Constants
//!
//! ## Chip page column contracts
//!
//! The broker pages render each chip history as an HTML table. The column
//! positions below are part of each page's layout, not a general rule:
//!
//! | Source        | Marker       | Date | Value columns                         |
//! |---------------|--------------|------|---------------------------------------|
//! | Institutional | 外資買賣超   | 0    | 1 foreign, 2 trust, 3 dealer          |
//! | Margin        | 融資餘額     | 0    | 4 margin bal, 5 margin chg, 11 short bal, 12 short chg |
//! | Breadth       | 買賣家數差   | 0    | 1 buy/sell head-count difference      |

/// Shares per board lot
pub const SHARES_PER_LOT: u64 = 1000;

/// Offset between the regional (ROC) calendar and the Gregorian calendar
pub const REGIONAL_YEAR_OFFSET: i32 = 1911;

/// Years below this value are treated as regional-calendar years
pub const REGIONAL_YEAR_CUTOFF: i32 = 1912;

/// Default instrument when none is configured
pub const DEFAULT_SYMBOL: &str = "2313";

/// Calendar days of price history fetched by default (~240 trading days)
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// Calendar days of chip history requested by default
pub const DEFAULT_CHIP_LOOKBACK_DAYS: u32 = 200;

/// Trailing rows rendered by default
pub const DEFAULT_DISPLAY_WINDOW: usize = 120;

/// Rendered dashboard filename
pub const DASHBOARD_FILENAME: &str = "dashboard.png";

/// Timeout for every outbound HTTP request
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Browser user agent sent to the price feed and broker pages
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Price feed base URL
pub const PRICE_FEED_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Exchange suffixes tried in order: listed board, then OTC board
pub const EXCHANGE_SUFFIXES: &[&str] = &[".TW", ".TWO"];

/// Broker chip pages base URL
pub const CHIP_PAGES_BASE_URL: &str = "https://fubon-ebrokerdj.fbs.com.tw";

/// Charset assumed when a chip page does not declare one
pub const CHIP_PAGE_CHARSET: &str = "big5";

/// Indicator windows
pub mod windows {
    /// Simple moving average periods
    pub const MA_PERIODS: [usize; 6] = [5, 10, 20, 60, 120, 240];

    pub const BOLLINGER_PERIOD: usize = 20;
    pub const BOLLINGER_WIDTH: f64 = 2.0;

    pub const STOCHASTIC_PERIOD: usize = 9;

    pub const MACD_FAST: usize = 12;
    pub const MACD_SLOW: usize = 26;
    pub const MACD_SIGNAL: usize = 9;

    /// Center of mass for RSI smoothing (alpha = 1/6)
    pub const RSI_COM: f64 = 5.0;
}

/// Column positions for chip tables (0-indexed)
pub mod chip_column {
    pub const DATE: usize = 0;

    // Institutional page
    pub const FOREIGN_NET: usize = 1;
    pub const TRUST_NET: usize = 2;
    pub const DEALER_NET: usize = 3;

    // Margin page
    pub const MARGIN_BALANCE: usize = 4;
    pub const MARGIN_DELTA: usize = 5;
    pub const SHORT_BALANCE: usize = 11;
    pub const SHORT_DELTA: usize = 12;

    // Breadth page
    pub const BUY_SELL_DIFF: usize = 1;
}

/// Marker phrases identifying each chip table
pub mod chip_marker {
    pub const INSTITUTIONAL: &str = "外資買賣超";
    pub const MARGIN: &str = "融資餘額";
    pub const BREADTH: &str = "買賣家數差";
}

/// Taiwan exchange tick sizes by price band
///
/// | Price          | Tick |
/// |----------------|------|
/// | < 10           | 0.01 |
/// | 10 - 50        | 0.05 |
/// | 50 - 100       | 0.1  |
/// | 100 - 500      | 0.5  |
/// | 500 - 1000     | 1    |
/// | >= 1000        | 5    |
pub const TICK_SIZE_BANDS: &[(f64, f64)] = &[
    (10.0, 0.01),
    (50.0, 0.05),
    (100.0, 0.1),
    (500.0, 0.5),
    (1000.0, 1.0),
];

/// Tick size for prices at or above the last band
pub const TICK_SIZE_TOP: f64 = 5.0;

/// Upper bound on volume profile buckets
pub const VOLUME_PROFILE_MAX_BINS: usize = 40;
