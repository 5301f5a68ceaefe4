use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use nfl_props::config::{PipelineConfig, init_cli};
use nfl_props::rankings::{derive_team_weeks, team_totals_from_stats};
use nfl_props::sqlite_store;

/// Recompute entering-week team defense and offense rankings from box scores.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Only this season; every season with games otherwise.
    #[arg(long)]
    season: Option<u16>,
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
    let mut conn = sqlite_store::open_db(&db_path)?;

    let seasons = match args.season {
        Some(season) => vec![season],
        None => sqlite_store::load_seasons(&conn)?,
    };
    if seasons.is_empty() {
        println!("No seasons found in {}", db_path.display());
        return Ok(());
    }

    for season in seasons {
        let stats = sqlite_store::load_season_stats(&conn, season)?;
        let games = sqlite_store::load_games(&conn, season)?;
        let totals = team_totals_from_stats(&stats, &games);
        let (defense, offense) = derive_team_weeks(&totals);
        sqlite_store::replace_team_weeks(&mut conn, season, &defense, &offense)?;
        info!(season, team_games = totals.len(), "rankings rebuilt");
        println!(
            "season {season}: team-games={} defense rows={} offense rows={}",
            totals.len(),
            defense.len(),
            offense.len()
        );
    }
    Ok(())
}
