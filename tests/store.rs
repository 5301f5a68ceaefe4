use chrono::{TimeZone, Utc};

use nfl_props::config::PipelineConfig;
use nfl_props::demo::{DemoConfig, build_demo_league};
use nfl_props::grading::grade_run;
use nfl_props::model::{LinearPropModel, ModelRegistry, PropModelArtifact};
use nfl_props::defaults::FEATURE_COUNT;
use nfl_props::records::{Game, Player, PlayerWeekStat, PropLine, PropType, Season, Week};
use nfl_props::sqlite_store::{self, SqliteStore};
use nfl_props::writer::{load_predictions, write_predictions};
use nfl_props::{PredictionPipeline, RecordStore};

fn demo_sqlite() -> (DemoConfig, SqliteStore) {
    let cfg = DemoConfig::default();
    let league = build_demo_league(&cfg);
    let mut conn = sqlite_store::open_in_memory().unwrap();
    league.write_sqlite(&mut conn).expect("demo league should seed");
    (cfg, SqliteStore::new(conn))
}

/// Flat model: projects the intercept for every player.
fn flat_registry(prop_type: PropType, value: f64) -> ModelRegistry {
    let model = LinearPropModel::from_artifact(PropModelArtifact {
        prop_type,
        feature_means: vec![0.0; FEATURE_COUNT],
        feature_stds: vec![1.0; FEATURE_COUNT],
        coeffs: vec![0.0; FEATURE_COUNT],
        intercept: value,
        l2: 1.0,
        residual_std: 10.0,
        train_mae: 0.0,
        val_mae: 0.0,
        baseline_val_mae: 0.0,
        train_samples: 0,
        val_samples: 0,
    })
    .unwrap();
    let mut registry = ModelRegistry::empty(format!("flat-{value}"));
    registry.insert(Box::new(model));
    registry
}

fn receiver_row(season: Season, week: Week, team: &str) -> PlayerWeekStat {
    PlayerWeekStat {
        player_id: "wr1".to_string(),
        season,
        week,
        team: Some(team.to_string()),
        targets: 7.0,
        receptions: 5.0,
        receiving_yards: 60.0,
        ..Default::default()
    }
}

fn seeded_receiver(team_now: &str) -> rusqlite::Connection {
    let conn = sqlite_store::open_in_memory().unwrap();
    sqlite_store::upsert_player(
        &conn,
        &Player {
            player_id: "wr1".to_string(),
            name: "Wide Receiver".to_string(),
            position: "WR".to_string(),
            team: Some(team_now.to_string()),
        },
    )
    .unwrap();
    conn
}

fn scheduled(season: Season, week: Week, home: &str, away: &str) -> Game {
    Game {
        game_id: format!("{season}_{week:02}_{away}_{home}"),
        season,
        week,
        home_team: home.to_string(),
        away_team: away.to_string(),
        completed: false,
        home_score: None,
        away_score: None,
    }
}

#[test]
fn sqlite_store_matches_memory_store() {
    let cfg = DemoConfig::default();
    let memory = build_demo_league(&cfg).into_memory_store();
    let (_, sqlite) = demo_sqlite();

    assert_eq!(
        sqlite.player_ids_with_stats(2025).unwrap(),
        memory.player_ids_with_stats(2025).unwrap()
    );
    assert!(!sqlite.season_has_stats(2019).unwrap());

    let ids = sqlite.player_ids_with_stats(2025).unwrap();
    for id in ids.iter().take(5) {
        assert_eq!(sqlite.player(id).unwrap(), memory.player(id).unwrap());
        let a = sqlite.player_week_stats(id, 2025).unwrap();
        let b = memory.player_week_stats(id, 2025).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.week, y.week);
            assert_eq!(x.receiving_yards, y.receiving_yards);
            assert_eq!(x.passing_attempts, y.passing_attempts);
        }
        for week in [3, cfg.line_week()] {
            assert_eq!(
                sqlite.opponent(id, week, 2025).unwrap(),
                memory.opponent(id, week, 2025).unwrap()
            );
        }
    }

    let d1 = sqlite.team_week_defense("KC", 2025, 6).unwrap();
    let d2 = memory.team_week_defense("KC", 2025, 6).unwrap();
    assert_eq!(d1.as_ref().map(|d| d.overall_rank), d2.as_ref().map(|d| d.overall_rank));
    assert_eq!(d1.as_ref().map(|d| d.week), d2.as_ref().map(|d| d.week));

    let lines = sqlite
        .active_prop_lines(cfg.line_season(), cfg.line_week())
        .unwrap();
    assert_eq!(
        lines,
        memory
            .active_prop_lines(cfg.line_season(), cfg.line_week())
            .unwrap()
    );
    assert!(!lines.is_empty());
}

#[test]
fn rankings_are_never_ahead_of_the_requested_week() {
    let (_, store) = demo_sqlite();
    assert!(store.team_week_defense("KC", 2025, 1).unwrap().is_none());
    let row = store.team_week_offense("KC", 2025, 30).unwrap().unwrap();
    assert!(row.week <= 9);
}

#[test]
fn later_stat_insert_is_returned_after_earlier_one() {
    let conn = sqlite_store::open_in_memory().unwrap();
    let row = PlayerWeekStat {
        player_id: "p1".to_string(),
        season: 2025,
        week: 2,
        receiving_yards: 40.0,
        ..Default::default()
    };
    let first = sqlite_store::insert_stat(&conn, &row).unwrap();
    let second = sqlite_store::insert_stat(
        &conn,
        &PlayerWeekStat {
            receiving_yards: 75.0,
            ..row.clone()
        },
    )
    .unwrap();
    assert!(second > first);

    let store = SqliteStore::new(conn);
    let rows = store.player_week_stats("p1", 2025).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].receiving_yards, 75.0);
    assert_eq!(rows[1].ingest_seq, second);
}

#[test]
fn rerun_supersedes_stored_predictions() {
    let (cfg, store) = demo_sqlite();
    let config = PipelineConfig::default();
    let at = Utc.with_ymd_and_hms(2025, 11, 1, 9, 30, 0).unwrap();

    let low = flat_registry(PropType::ReceivingYards, 20.0);
    let first = PredictionPipeline::new(&store, &low, &config)
        .generate_predictions_at(cfg.line_season(), cfg.line_week(), at)
        .unwrap();
    assert!(first.succeeded() > 0);
    {
        let mut conn = store.conn().unwrap();
        write_predictions(&mut conn, &first.results).unwrap();
    }

    let high = flat_registry(PropType::ReceivingYards, 95.0);
    let second = PredictionPipeline::new(&store, &high, &config)
        .generate_predictions_at(cfg.line_season(), cfg.line_week(), at)
        .unwrap();
    let stored = {
        let mut conn = store.conn().unwrap();
        write_predictions(&mut conn, &second.results).unwrap();
        load_predictions(&conn, cfg.line_season(), cfg.line_week()).unwrap()
    };

    assert_eq!(stored.len(), second.succeeded());
    assert!(stored.iter().all(|r| r.projected_value == 95.0));
    assert!(stored.iter().all(|r| r.model_version == "flat-95"));
    assert_eq!(stored[0].generated_at, at);
    assert!(stored[0].rationale.contains("mean=95.0"));
    assert_eq!(stored[0].rationale, second.results[0].rationale);
}

#[test]
fn grading_counts_unplayed_weeks_as_pending() {
    let (cfg, store) = demo_sqlite();
    let config = PipelineConfig::default();
    let registry = flat_registry(PropType::ReceivingYards, 50.0);
    let report = PredictionPipeline::new(&store, &registry, &config)
        .generate_predictions(cfg.line_season(), cfg.line_week())
        .unwrap();

    let graded = grade_run(&store, &report.results).unwrap();
    assert_eq!(graded.graded, 0);
    assert_eq!(graded.pending, report.succeeded());
}

#[test]
fn unknown_market_line_is_dropped_not_fatal() {
    let conn = seeded_receiver("KC");
    for week in 1..=4 {
        sqlite_store::insert_stat(&conn, &receiver_row(2025, week, "KC")).unwrap();
    }
    sqlite_store::upsert_game(&conn, &scheduled(2025, 5, "KC", "BUF")).unwrap();
    sqlite_store::upsert_prop_line(
        &conn,
        &PropLine {
            player_id: "wr1".to_string(),
            prop_type: PropType::ReceivingYards,
            season: 2025,
            week: 5,
            line: 55.5,
            active: true,
        },
    )
    .unwrap();
    conn.execute_batch(
        "INSERT INTO prop_lines (player_id, prop_type, season, week, line, active, updated_at)
         VALUES ('wr1', 'player_anytime_td', 2025, 5, 0.5, 1, '2025-10-01T00:00:00Z')",
    )
    .unwrap();
    let store = SqliteStore::new(conn);

    let lines = store.active_prop_lines(2025, 5).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].prop_type, PropType::ReceivingYards);

    let config = PipelineConfig::default();
    let registry = flat_registry(PropType::ReceivingYards, 60.0);
    let report = PredictionPipeline::new(&store, &registry, &config)
        .generate_predictions(2025, 5)
        .unwrap();
    assert_eq!(report.succeeded(), 1);
    assert!(report.skipped.is_empty());
}

#[test]
fn sqlite_opponent_follows_team_on_stat_rows() {
    let conn = seeded_receiver("KC");
    for week in 1..=3 {
        sqlite_store::insert_stat(&conn, &receiver_row(2024, week, "DEN")).unwrap();
    }
    for game in [
        scheduled(2024, 3, "DEN", "LV"),
        scheduled(2024, 3, "KC", "BUF"),
        scheduled(2024, 4, "SF", "DEN"),
        scheduled(2024, 4, "KC", "NYJ"),
    ] {
        sqlite_store::upsert_game(&conn, &game).unwrap();
    }
    let store = SqliteStore::new(conn);

    assert_eq!(store.opponent("wr1", 3, 2024).unwrap().as_deref(), Some("LV"));
    assert_eq!(store.opponent("wr1", 4, 2024).unwrap().as_deref(), Some("SF"));
    // No 2025 rows yet, so the current roster team decides.
    {
        let conn = store.conn().unwrap();
        sqlite_store::upsert_game(&conn, &scheduled(2025, 1, "KC", "BAL")).unwrap();
    }
    assert_eq!(store.opponent("wr1", 1, 2025).unwrap().as_deref(), Some("BAL"));
}
