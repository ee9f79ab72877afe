use chrono::Local;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::Result;
use crate::models::JobConfig;
use crate::services::write_merged_rows;

pub fn run(config: JobConfig, price_csv: Option<PathBuf>, output: Option<PathBuf>) {
    match run_export(&config, price_csv, output) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("❌ Export failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_export(
    config: &JobConfig,
    price_csv: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let runtime = super::build_runtime()?;
    let today = Local::now().date_naive();

    let progress = match output {
        Some(_) => super::Progress::Stdout,
        None => super::Progress::Stderr,
    };
    let rows =
        runtime.block_on(super::collect_rows(config, price_csv.as_deref(), today, progress))?;

    match output {
        Some(path) => {
            write_merged_rows(File::create(&path)?, &rows)?;
            println!("💾 Wrote {} rows to {}", rows.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            write_merged_rows(&mut stdout, &rows)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
