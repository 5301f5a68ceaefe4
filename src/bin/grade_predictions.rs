use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use nfl_props::config::{PipelineConfig, init_cli};
use nfl_props::grading::grade_run;
use nfl_props::sqlite_store::SqliteStore;
use nfl_props::writer::load_predictions;

/// Grade stored predictions for a week against recorded box scores.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[arg(long)]
    season: u16,
    #[arg(long)]
    week: u8,
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_cli();
    let args = Args::parse();
    let db_path = match args.db {
        Some(path) => path,
        None => PipelineConfig::from_env().db_path()?,
    };

    let store = SqliteStore::open(&db_path)?;
    let results = {
        let conn = store.conn()?;
        load_predictions(&conn, args.season, args.week)?
    };
    if results.is_empty() {
        println!("No predictions stored for season {} week {}", args.season, args.week);
        return Ok(());
    }
    let report = grade_run(&store, &results)?;

    println!("Season {} week {}", args.season, args.week);
    println!("Graded: {} (pending {})", report.graded, report.pending);
    println!(
        "Outcomes: over={} under={} push={}",
        report.overs, report.unders, report.pushes
    );
    println!(
        "Picks: {}/{} hit rate {:.3}",
        report.hits, report.picks, report.hit_rate
    );
    println!("Brier: {:.4}  log loss: {:.4}", report.brier, report.log_loss);
    for bin in report.bins.iter().filter(|b| b.count > 0) {
        println!(
            "  p {:.1}-{:.1}: n={} avg_p={:.3} hit={:.3}",
            bin.bucket_start, bin.bucket_end, bin.count, bin.avg_pred, bin.actual_rate
        );
    }
    Ok(())
}
