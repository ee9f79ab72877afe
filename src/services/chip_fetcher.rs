//! Chip Fetcher
//!
//! Downloads the broker's server-rendered chip pages, splits them into raw
//! tables, and hands them to the Table Cleaner. Every failure degrades to
//! `ChipFetch::Unavailable`; nothing here is fatal to a run.

use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::constants::{CHIP_PAGES_BASE_URL, CHIP_PAGE_CHARSET, HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::error::{Error, Result};
use crate::models::{ChipFetch, ChipSource};
use crate::services::table_cleaner::{clean_table, ColumnContract, RawTable};

/// Client for the chip pages
pub struct ChipFetcher {
    base_url: String,
    breadth_url: Option<String>,
    client: reqwest::Client,
}

impl ChipFetcher {
    /// Create a fetcher; `breadth_url` is a template with `{symbol}`,
    /// `{start}` and `{end}` placeholders
    pub fn new(breadth_url: Option<String>) -> Result<Self> {
        Self::with_base_url(CHIP_PAGES_BASE_URL, breadth_url)
    }

    pub fn with_base_url(base_url: &str, breadth_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            breadth_url,
            client,
        })
    }

    /// Page URL for a source, or `None` when the source is not configured
    pub fn page_url(
        &self,
        source: ChipSource,
        symbol: &str,
        start: &str,
        end: &str,
    ) -> Option<String> {
        let query = format!("a={}&c={}&d={}", symbol, start, end);
        match source {
            ChipSource::Institutional => {
                Some(format!("{}/z/zc/zcl/zcl.djhtm?{}", self.base_url, query))
            }
            ChipSource::Margin => Some(format!("{}/z/zc/zcn/zcn.djhtm?{}", self.base_url, query)),
            ChipSource::Breadth => self.breadth_url.as_ref().map(|template| {
                template
                    .replace("{symbol}", symbol)
                    .replace("{start}", start)
                    .replace("{end}", end)
            }),
        }
    }

    /// Fetch and clean one chip source
    pub async fn fetch(
        &self,
        source: ChipSource,
        symbol: &str,
        start: &str,
        end: &str,
    ) -> ChipFetch {
        let url = match self.page_url(source, symbol, start, end) {
            Some(url) => url,
            None => {
                info!("Skipping {} source: no page configured", source);
                return ChipFetch::unavailable(source, "no page configured");
            }
        };

        let html = match self.fetch_page(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to fetch {} page: {}", source, e);
                return ChipFetch::unavailable(source, e.to_string());
            }
        };

        let blocks = match extract_tables(&html) {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!("Failed to parse {} page: {}", source, e);
                return ChipFetch::unavailable(source, e.to_string());
            }
        };

        let contract = ColumnContract::for_source(source);
        match clean_table(&blocks, &contract) {
            Some(rows) => {
                info!("Fetched {} {} rows", rows.len(), source);
                ChipFetch::Rows { source, rows }
            }
            None => {
                warn!(
                    "No table containing '{}' on {} page ({} tables scanned)",
                    contract.marker,
                    source,
                    blocks.len()
                );
                ChipFetch::unavailable(source, format!("marker '{}' not found", contract.marker))
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        tracing::debug!("Requesting chip page: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Chip page returned error status {}",
                response.status()
            )));
        }

        response
            .text_with_charset(CHIP_PAGE_CHARSET)
            .await
            .map_err(|e| Error::Network(format!("Failed to read chip page body: {}", e)))
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Collapse whitespace (including no-break spaces) and trim
fn normalize_cell(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every leaf `<table>` in document order, as rows of cell texts
///
/// Layout tables that wrap other tables are skipped so each data table is
/// returned exactly once with its own rows.
pub fn extract_tables(html: &str) -> Result<Vec<RawTable>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td, th")?;

    let mut tables = Vec::new();

    for table in document.select(&table_sel) {
        let has_nested = table
            .select(&table_sel)
            .any(|inner| inner.id() != table.id());
        if has_nested {
            continue;
        }

        let rows: RawTable = table
            .select(&row_sel)
            .map(|row| {
                row.select(&cell_sel)
                    .map(|cell| normalize_cell(&cell.text().collect::<String>()))
                    .collect::<Vec<String>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        if !rows.is_empty() {
            tables.push(rows);
        }
    }

    Ok(tables)
}
