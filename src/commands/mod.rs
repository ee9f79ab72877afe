pub mod export;
pub mod report;

use chrono::NaiveDate;
use std::fmt::Display;
use std::path::Path;
use tokio::runtime::Runtime;

use crate::error::{Error, Result};
use crate::models::{ChipSource, JobConfig, MergedRow};
use crate::services::{enhance, merge, read_daily_bars, ChipFetcher, PriceFetcher};

/// Current-thread runtime for the sequential fetches of one run
fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))
}

/// Where human-facing progress lines go; stderr keeps stdout clean for CSV
#[derive(Debug, Clone, Copy)]
enum Progress {
    Stdout,
    Stderr,
}

impl Progress {
    fn say(self, msg: impl Display) {
        match self {
            Progress::Stdout => println!("{}", msg),
            Progress::Stderr => eprintln!("{}", msg),
        }
    }
}

/// Price series (feed or local CSV) with indicators, left-joined with every
/// chip source. Only a missing price series is an error.
async fn collect_rows(
    config: &JobConfig,
    price_csv: Option<&Path>,
    today: NaiveDate,
    progress: Progress,
) -> Result<Vec<MergedRow>> {
    let bars = match price_csv {
        Some(path) => {
            progress.say(format!("📂 Reading prices from {}", path.display()));
            read_daily_bars(path)?
        }
        None => {
            progress.say(format!(
                "📥 Fetching {} days of prices for {}...",
                config.lookback_days, config.symbol
            ));
            PriceFetcher::new()?
                .fetch_daily(&config.symbol, config.lookback_days)
                .await?
        }
    };
    if bars.is_empty() {
        return Err(Error::NoPriceData(config.symbol.clone()));
    }
    progress.say(format!(
        "✅ {} daily bars ({} → {})",
        bars.len(),
        bars[0].date,
        bars[bars.len() - 1].date
    ));

    let series = enhance(&bars);

    let (start, end) = config.chip_date_range(today);
    progress.say(format!("📥 Fetching chip pages ({} → {})...", start, end));
    let chip_fetcher = ChipFetcher::new(config.breadth_url.clone())?;
    let mut fetches = Vec::with_capacity(ChipSource::ALL.len());
    for source in ChipSource::ALL {
        let fetch = chip_fetcher.fetch(source, &config.symbol, &start, &end).await;
        if fetch.is_available() {
            progress.say(format!("   ✅ {}: {} rows", source, fetch.rows().len()));
        } else {
            progress.say(format!("   ⚠️  {}: unavailable, plotted as zero", source));
        }
        fetches.push(fetch);
    }

    Ok(merge(&series, &fetches))
}
