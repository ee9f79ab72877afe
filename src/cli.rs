use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::commands;
use crate::constants::{DEFAULT_CHIP_LOOKBACK_DAYS, DEFAULT_DISPLAY_WINDOW, DEFAULT_LOOKBACK_DAYS};
use crate::models::{JobConfig, PanelKind};
use crate::utils::{get_breadth_url, get_output_dir, get_symbol, get_webhook_endpoint};

#[derive(Parser)]
#[command(name = "chipboard")]
#[command(about = "Daily price and chip-flow dashboard for Taiwan-listed stocks")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that builds the merged series
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    /// Stock symbol without exchange suffix (env: CHIPBOARD_SYMBOL)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Calendar days of price history
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    pub lookback_days: u32,

    /// Calendar days of chip history
    #[arg(long, default_value_t = DEFAULT_CHIP_LOOKBACK_DAYS)]
    pub chip_lookback_days: u32,

    /// Read daily bars from a local CSV instead of the price feed
    #[arg(long)]
    pub price_csv: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the dashboard image and post it to the webhook
    Report {
        #[command(flatten)]
        series: SeriesArgs,

        /// Trailing trading days to draw
        #[arg(
            long,
            default_value_t = DEFAULT_DISPLAY_WINDOW,
            value_parser = parse_display_window
        )]
        display_window: usize,

        /// Directory for dashboard.png (env: CHIPBOARD_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Panels: default, all, or comma-separated (e.g., price,volume,kd,macd)
        #[arg(long, default_value = "default")]
        panels: String,

        /// Render only; skip webhook delivery
        #[arg(long)]
        no_notify: bool,

        /// Also write the merged series to this CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Write the merged series as CSV
    Export {
        #[command(flatten)]
        series: SeriesArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// At least one row must be drawn
fn parse_display_window(s: &str) -> Result<usize, String> {
    let window: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid display window: {}", s))?;
    if window == 0 {
        return Err("Display window must be at least 1".to_string());
    }
    Ok(window)
}

impl SeriesArgs {
    /// Config from flags, falling back to the environment
    pub fn to_config(&self) -> JobConfig {
        let symbol = self.symbol.clone().unwrap_or_else(get_symbol);
        JobConfig {
            webhook_endpoint: get_webhook_endpoint(),
            lookback_days: self.lookback_days,
            chip_lookback_days: self.chip_lookback_days,
            breadth_url: get_breadth_url(),
            ..JobConfig::new(symbol)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            series,
            display_window,
            output_dir,
            panels,
            no_notify,
            csv,
        } => {
            let panels = match PanelKind::parse_panels(&panels) {
                Ok(panels) => panels,
                Err(e) => {
                    eprintln!("❌ Error parsing panels: {}", e);
                    eprintln!("   Valid options: default, all, or comma-separated (e.g., price,volume,institutional,margin,breadth,kd,macd)");
                    std::process::exit(1);
                }
            };

            let config = JobConfig {
                display_window,
                output_dir: output_dir.unwrap_or_else(get_output_dir),
                panels,
                ..series.to_config()
            };
            commands::report::run(config, series.price_csv, !no_notify, csv);
        }
        Commands::Export { series, output } => {
            let config = series.to_config();
            commands::export::run(config, series.price_csv, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_flags() {
        let cli = Cli::parse_from([
            "chipboard",
            "report",
            "--symbol",
            "2330",
            "--display-window",
            "60",
            "--panels",
            "price,macd",
            "--no-notify",
        ]);
        match cli.command {
            Commands::Report {
                series,
                display_window,
                panels,
                no_notify,
                ..
            } => {
                assert_eq!(series.symbol.as_deref(), Some("2330"));
                assert_eq!(series.lookback_days, 365);
                assert_eq!(display_window, 60);
                assert_eq!(panels, "price,macd");
                assert!(no_notify);
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn test_display_window_must_be_positive() {
        let result = Cli::try_parse_from(["chipboard", "report", "--display-window", "0"]);
        assert!(result.is_err());
        assert!(Cli::try_parse_from(["chipboard", "report", "--display-window", "abc"]).is_err());
        assert_eq!(parse_display_window("1"), Ok(1));
    }

    #[test]
    fn test_series_args_to_config() {
        let cli = Cli::parse_from([
            "chipboard",
            "export",
            "-s",
            "6488",
            "--chip-lookback-days",
            "90",
        ]);
        match cli.command {
            Commands::Export { series, output } => {
                let config = series.to_config();
                assert_eq!(config.symbol, "6488");
                assert_eq!(config.chip_lookback_days, 90);
                assert_eq!(config.display_window, 120);
                assert!(output.is_none());
            }
            _ => panic!("expected export"),
        }
    }
}
