//! Sales Insight - prints the dashboard snapshot of a sales CSV as JSON.

use anyhow::{bail, Context, Result};
use sales_insight::{DashboardError, DashboardSession, DashboardSettings};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            let validation = err
                .downcast_ref::<DashboardError>()
                .is_some_and(DashboardError::is_validation);
            ExitCode::from(if validation { 1 } else { 2 })
        }
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args_os().skip(1);
    let Some(csv_path) = args.next().map(PathBuf::from) else {
        bail!("usage: sales-insight <sales.csv> [summary.csv]");
    };
    let export_path = args.next().map(PathBuf::from);

    let settings = match std::env::var_os("SALES_INSIGHT_SETTINGS") {
        Some(path) => DashboardSettings::from_json_file(&PathBuf::from(path))?,
        None => DashboardSettings::default(),
    };
    let export_path = export_path.map(|path| {
        if path.is_dir() {
            path.join(&settings.export_file_name)
        } else {
            path
        }
    });

    let mut session = DashboardSession::new(settings);
    session.load_csv_path(&csv_path)?;

    let snapshot = session.snapshot()?;
    let json = serde_json::to_string_pretty(&snapshot).context("serialising snapshot")?;
    println!("{json}");

    if let Some(path) = export_path {
        let bytes = session.export_product_summary()?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("writing product summary to {}", path.display()))?;
        log::info!("Product summary written to {}", path.display());
    }

    Ok(())
}
