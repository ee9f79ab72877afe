use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::constants::{EXCHANGE_SUFFIXES, HTTP_TIMEOUT_SECS, PRICE_FEED_BASE_URL, USER_AGENT};
use crate::error::{Error, Result};
use crate::models::DailyBar;

/// Client for the daily OHLCV chart feed
pub struct PriceFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl PriceFetcher {
    /// Create a fetcher against the public feed
    pub fn new() -> Result<Self> {
        Self::with_base_url(PRICE_FEED_BASE_URL)
    }

    /// Create a fetcher against a custom base URL
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Fetch daily bars for a symbol, trying the listed board then OTC
    ///
    /// # Returns
    /// Bars ordered oldest first, or `Error::NoPriceData` when no board has any
    pub async fn fetch_daily(&self, symbol: &str, lookback_days: u32) -> Result<Vec<DailyBar>> {
        let period2 = Utc::now();
        let period1 = period2 - Duration::days(lookback_days as i64);

        for suffix in EXCHANGE_SUFFIXES {
            let ticker = format!("{}{}", symbol, suffix);
            match self.fetch_ticker(&ticker, period1, period2).await {
                Ok(bars) if !bars.is_empty() => {
                    info!("Fetched {} daily bars for {}", bars.len(), ticker);
                    return Ok(bars);
                }
                Ok(_) => {
                    warn!("Price feed returned no bars for {}", ticker);
                }
                Err(e) => {
                    warn!("Price fetch failed for {}: {}", ticker, e);
                }
            }
        }

        Err(Error::NoPriceData(symbol.to_string()))
    }

    async fn fetch_ticker(
        &self,
        ticker: &str,
        period1: DateTime<Utc>,
        period2: DateTime<Utc>,
    ) -> Result<Vec<DailyBar>> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            ticker,
            period1.timestamp(),
            period2.timestamp()
        );
        debug!("Requesting price history: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Price request failed: {} (url: {})", e, url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::Network(format!(
                "Price feed returned error status {}: {}",
                status, body
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse price JSON: {}", e)))?;

        parse_chart_response(&json)
    }
}

fn quote_column<'a>(quote: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    quote
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Parse(format!("Missing key: {}", key)))
}

/// Convert a chart payload into daily bars
///
/// Entries with a null price are skipped (halted days). Timestamps are shifted
/// by the exchange's GMT offset before taking the date. Volumes are converted
/// from shares to lots. Duplicate dates keep the last entry.
pub fn parse_chart_response(json: &Value) -> Result<Vec<DailyBar>> {
    let chart = json
        .get("chart")
        .ok_or_else(|| Error::Parse("Missing key: chart".to_string()))?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        return Err(Error::Network(format!("Price feed error: {}", err)));
    }

    let result = match chart
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
    {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };

    let gmt_offset = result
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|o| o.as_i64())
        .unwrap_or(0);

    let timestamps = match result.get("timestamp").and_then(|t| t.as_array()) {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let quote = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|q| q.first())
        .ok_or_else(|| Error::Parse("Missing key: indicators.quote".to_string()))?;

    let opens = quote_column(quote, "open")?;
    let highs = quote_column(quote, "high")?;
    let lows = quote_column(quote, "low")?;
    let closes = quote_column(quote, "close")?;
    let volumes = quote_column(quote, "volume")?;

    let length = timestamps.len();
    if [opens.len(), highs.len(), lows.len(), closes.len(), volumes.len()]
        .iter()
        .any(|&len| len != length)
    {
        return Err(Error::Parse("Inconsistent array lengths".to_string()));
    }

    let mut by_date: BTreeMap<NaiveDate, DailyBar> = BTreeMap::new();

    for i in 0..length {
        let timestamp = match timestamps[i].as_i64() {
            Some(ts) => ts,
            None => continue,
        };
        let date = match DateTime::<Utc>::from_timestamp(timestamp + gmt_offset, 0) {
            Some(time) => time.date_naive(),
            None => continue,
        };

        let (open, high, low, close) = match (
            opens[i].as_f64(),
            highs[i].as_f64(),
            lows[i].as_f64(),
            closes[i].as_f64(),
        ) {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => {
                debug!("Skipping bar with missing prices on {}", date);
                continue;
            }
        };
        let shares = volumes[i].as_f64().unwrap_or(0.0).max(0.0) as u64;

        by_date.insert(date, DailyBar::from_shares(date, open, high, low, close, shares));
    }

    Ok(by_date.into_values().collect())
}
