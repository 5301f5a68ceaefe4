use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use nfl_props::config::{PipelineConfig, TrainConfig, init_cli};
use nfl_props::model::save_artifact;
use nfl_props::sqlite_store::SqliteStore;
use nfl_props::train::train;

/// Fit one ridge model per prop type and write the model artifact.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[arg(long)]
    from: u16,
    #[arg(long)]
    to: u16,
    #[arg(long)]
    db: Option<PathBuf>,
    /// Artifact path; defaults to NFL_PROPS_MODEL_PATH or the cache dir.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_cli();
    let args = Args::parse();
    let cfg = PipelineConfig::from_env();
    let db_path = match args.db {
        Some(path) => path,
        None => cfg.db_path()?,
    };
    let out = match args.out {
        Some(path) => path,
        None => cfg.model_path()?,
    };

    let store = SqliteStore::open(&db_path)?;
    let artifact = train(&store, args.from..=args.to, &TrainConfig::from_env())?;
    save_artifact(&out, &artifact)?;

    println!("Models trained: {}", artifact.model_version);
    println!("Artifact: {}", out.display());
    for m in &artifact.models {
        println!(
            "{:<18} n={:<5} l2={:<5} val_mae={:.2} baseline={:.2} resid_std={:.2}",
            m.prop_type.to_string(),
            m.train_samples + m.val_samples,
            m.l2,
            m.val_mae,
            m.baseline_val_mae,
            m.residual_std
        );
    }
    Ok(())
}
