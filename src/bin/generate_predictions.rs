use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use nfl_props::config::{PipelineConfig, init_cli};
use nfl_props::export::export_predictions_xlsx;
use nfl_props::model::ModelRegistry;
use nfl_props::pipeline::PredictionPipeline;
use nfl_props::sqlite_store::SqliteStore;
use nfl_props::writer::write_predictions;

/// Predict every active prop line for a week and persist the results.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[arg(long)]
    season: u16,
    #[arg(long)]
    week: u8,
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long)]
    models: Option<PathBuf>,
    /// Skip writing to the predictions table.
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    xlsx: Option<PathBuf>,
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_cli();
    let args = Args::parse();
    let cfg = PipelineConfig::from_env();
    let db_path = match args.db {
        Some(path) => path,
        None => cfg.db_path()?,
    };
    let model_path = match args.models {
        Some(path) => path,
        None => cfg.model_path()?,
    };

    let registry = ModelRegistry::load(&model_path)?;
    let store = SqliteStore::open(&db_path)?;
    let report = PredictionPipeline::new(&store, &registry, &cfg)
        .generate_predictions(args.season, args.week)?;

    if !args.dry_run {
        let mut conn = store.conn()?;
        let written = write_predictions(&mut conn, &report.results)?;
        println!("Predictions written: {written}");
    }
    if let Some(path) = args.xlsx.as_deref() {
        let summary = export_predictions_xlsx(path, &report)?;
        println!(
            "Workbook: {} ({} predictions, {} skipped)",
            path.display(),
            summary.predictions,
            summary.skipped
        );
    }
    if let Some(path) = args.json.as_deref() {
        let json = serde_json::to_string_pretty(&report.results)?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        println!("JSON: {}", path.display());
    }

    println!(
        "Season {} week {} model {}",
        report.season, report.week, report.model_version
    );
    println!("Succeeded: {}", report.succeeded());
    println!("Skipped: {}", report.skipped.len());
    for (kind, count) in report.skip_counts() {
        println!("  {kind}: {count}");
    }
    for s in report.skipped.iter().take(6) {
        println!("   - {} {}: {}", s.player_id, s.prop_type, s.reason);
    }
    Ok(())
}
