use chrono::Local;
use std::fs::File;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::JobConfig;
use crate::services::{
    calculate_volume_profile, write_merged_rows, DashboardFrame, DashboardRenderer, Notification,
    Notifier, PngRenderer, WebhookNotifier,
};

pub fn run(config: JobConfig, price_csv: Option<PathBuf>, notify: bool, csv_out: Option<PathBuf>) {
    println!("📊 Chip dashboard for {}", config.symbol);

    match run_report(&config, price_csv, notify, csv_out) {
        Ok(()) => {
            println!("\n✅ Report completed");
        }
        Err(e) => {
            eprintln!("\n❌ Report failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_report(
    config: &JobConfig,
    price_csv: Option<PathBuf>,
    notify: bool,
    csv_out: Option<PathBuf>,
) -> Result<()> {
    let runtime = super::build_runtime()?;
    let today = Local::now().date_naive();

    let progress = super::Progress::Stdout;
    let rows =
        runtime.block_on(super::collect_rows(config, price_csv.as_deref(), today, progress))?;

    if let Some(path) = csv_out {
        write_merged_rows(File::create(&path)?, &rows)?;
        println!("💾 Wrote {} rows to {}", rows.len(), path.display());
    }

    let frame = DashboardFrame::from_rows(&config.symbol, &rows, config.display_window);
    let profile = calculate_volume_profile(&frame.bars());
    if let Some(poc) = &profile.poc {
        println!("📈 Point of control: {:.2} ({:.1}% of volume)", poc.price, poc.percentage);
    }

    std::fs::create_dir_all(&config.output_dir)?;
    let image_path = config.dashboard_path();
    println!("🎨 Rendering {} rows to {}...", frame.len(), image_path.display());
    PngRenderer::new(config.panels.clone()).render(&frame, &profile, &image_path)?;

    if !notify {
        println!("⏭️  Delivery disabled");
        return Ok(());
    }

    let Some(endpoint) = config.webhook_endpoint.clone() else {
        tracing::warn!("No webhook endpoint configured, skipping delivery");
        println!("⚠️  No webhook configured, image kept at {}", image_path.display());
        return Ok(());
    };

    let notification = Notification::dashboard(image_path, &config.symbol, today);
    let delivered = WebhookNotifier::new(endpoint)
        .and_then(|notifier| runtime.block_on(notifier.send(&notification)));
    match delivered {
        Ok(()) => println!("📨 Dashboard delivered"),
        Err(e) => {
            tracing::error!("Delivery failed: {}", e);
            eprintln!("⚠️  Delivery failed: {}", e);
        }
    }

    Ok(())
}
