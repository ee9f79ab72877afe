use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Non-price data sources scraped alongside the price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChipSource {
    /// Institutional investors' net buy/sell (foreign, trust, dealer)
    Institutional,
    /// Margin financing and short balances
    Margin,
    /// Broker buy/sell head-count difference
    Breadth,
}

impl ChipSource {
    pub const ALL: [ChipSource; 3] = [
        ChipSource::Institutional,
        ChipSource::Margin,
        ChipSource::Breadth,
    ];

    /// Fields this source contributes to a merged row
    pub fn fields(&self) -> &'static [ChipField] {
        match self {
            ChipSource::Institutional => &[
                ChipField::ForeignNet,
                ChipField::TrustNet,
                ChipField::DealerNet,
            ],
            ChipSource::Margin => &[
                ChipField::MarginBalance,
                ChipField::MarginDelta,
                ChipField::ShortBalance,
                ChipField::ShortDelta,
            ],
            ChipSource::Breadth => &[ChipField::BuySellDiff],
        }
    }
}

impl fmt::Display for ChipSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChipSource::Institutional => "institutional",
            ChipSource::Margin => "margin",
            ChipSource::Breadth => "breadth",
        };
        write!(f, "{}", name)
    }
}

/// A single chip quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChipField {
    ForeignNet,
    TrustNet,
    DealerNet,
    MarginBalance,
    MarginDelta,
    ShortBalance,
    ShortDelta,
    BuySellDiff,
}

impl ChipField {
    /// Column name used in CSV output
    pub fn column_name(&self) -> &'static str {
        match self {
            ChipField::ForeignNet => "foreign_net",
            ChipField::TrustNet => "trust_net",
            ChipField::DealerNet => "dealer_net",
            ChipField::MarginBalance => "margin_balance",
            ChipField::MarginDelta => "margin_delta",
            ChipField::ShortBalance => "short_balance",
            ChipField::ShortDelta => "short_delta",
            ChipField::BuySellDiff => "buy_sell_diff",
        }
    }
}

/// One day of values from a single chip source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipRow {
    pub date: NaiveDate,
    pub values: BTreeMap<ChipField, f64>,
}

impl ChipRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: ChipField, value: f64) -> Self {
        self.values.insert(field, value);
        self
    }
}

/// Outcome of fetching one chip source
///
/// A failed source is a value, not an error: the merge step zero-fills every
/// field an unavailable source would have contributed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChipFetch {
    Rows {
        source: ChipSource,
        rows: Vec<ChipRow>,
    },
    Unavailable {
        source: ChipSource,
        reason: String,
    },
}

impl ChipFetch {
    pub fn unavailable(source: ChipSource, reason: impl Into<String>) -> Self {
        ChipFetch::Unavailable {
            source,
            reason: reason.into(),
        }
    }

    pub fn source(&self) -> ChipSource {
        match self {
            ChipFetch::Rows { source, .. } | ChipFetch::Unavailable { source, .. } => *source,
        }
    }

    /// Rows of a successful fetch; empty for an unavailable source
    pub fn rows(&self) -> &[ChipRow] {
        match self {
            ChipFetch::Rows { rows, .. } => rows,
            ChipFetch::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ChipFetch::Rows { .. })
    }
}

/// Dense chip values for a merged row; missing data is 0, never "no value"
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipValues {
    pub foreign_net: f64,
    pub trust_net: f64,
    pub dealer_net: f64,
    /// foreign + trust + dealer
    pub institutional_total: f64,
    pub margin_balance: f64,
    pub margin_delta: f64,
    pub short_balance: f64,
    pub short_delta: f64,
    pub buy_sell_diff: f64,
}

impl ChipValues {
    /// Store a field value; non-finite values are stored as 0
    pub fn set(&mut self, field: ChipField, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        match field {
            ChipField::ForeignNet => self.foreign_net = value,
            ChipField::TrustNet => self.trust_net = value,
            ChipField::DealerNet => self.dealer_net = value,
            ChipField::MarginBalance => self.margin_balance = value,
            ChipField::MarginDelta => self.margin_delta = value,
            ChipField::ShortBalance => self.short_balance = value,
            ChipField::ShortDelta => self.short_delta = value,
            ChipField::BuySellDiff => self.buy_sell_diff = value,
        }
    }

    pub fn get(&self, field: ChipField) -> f64 {
        match field {
            ChipField::ForeignNet => self.foreign_net,
            ChipField::TrustNet => self.trust_net,
            ChipField::DealerNet => self.dealer_net,
            ChipField::MarginBalance => self.margin_balance,
            ChipField::MarginDelta => self.margin_delta,
            ChipField::ShortBalance => self.short_balance,
            ChipField::ShortDelta => self.short_delta,
            ChipField::BuySellDiff => self.buy_sell_diff,
        }
    }

    /// Names and values in CSV column order
    pub fn columns(&self) -> [(&'static str, f64); 9] {
        let column = |field: ChipField| (field.column_name(), self.get(field));
        [
            column(ChipField::ForeignNet),
            column(ChipField::TrustNet),
            column(ChipField::DealerNet),
            ("institutional_total", self.institutional_total),
            column(ChipField::MarginBalance),
            column(ChipField::MarginDelta),
            column(ChipField::ShortBalance),
            column(ChipField::ShortDelta),
            column(ChipField::BuySellDiff),
        ]
    }

    /// Recompute the institutional aggregate from its components
    pub fn refresh_total(&mut self) {
        self.institutional_total = self.foreign_net + self.trust_net + self.dealer_net;
    }
}
