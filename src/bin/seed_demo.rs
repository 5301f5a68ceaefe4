use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use nfl_props::config::{PipelineConfig, init_cli};
use nfl_props::demo::{DemoConfig, build_demo_league};
use nfl_props::sqlite_store;

/// Fill a record store with a seeded synthetic league.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Weeks played in the current season.
    #[arg(long, default_value_t = 8)]
    current_week: u8,
    /// Record store path; defaults to NFL_PROPS_DB or the cache dir.
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

    let cfg = DemoConfig {
        seed: args.seed,
        current_week: args.current_week.clamp(1, 17),
        ..DemoConfig::default()
    };
    let league = build_demo_league(&cfg);
    let mut conn = sqlite_store::open_db(&db_path)?;
    league.write_sqlite(&mut conn)?;

    println!("Demo league written");
    println!("DB: {}", db_path.display());
    println!("Seasons: {:?}", cfg.seasons);
    println!("Players: {}", league.players.len());
    println!("Games: {}", league.games.len());
    println!("Stat rows: {}", league.stats.len());
    println!(
        "Prop lines: {} (season {} week {})",
        league.lines.len(),
        cfg.line_season(),
        cfg.line_week()
    );
    Ok(())
}
