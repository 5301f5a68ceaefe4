use assert_float_eq::*;
use chrono::{TimeZone, Utc};

use nfl_props::config::{PipelineConfig, TrainConfig};
use nfl_props::defaults::{FEATURE_COUNT, FEATURE_NAMES};
use nfl_props::demo::{DemoConfig, build_demo_league};
use nfl_props::memory_store::MemoryStore;
use nfl_props::model::{LinearPropModel, ModelRegistry, PropModelArtifact, save_artifact};
use nfl_props::records::{EdgeBucket, Player, PlayerWeekStat, PropLine, PropType, Side};
use nfl_props::train::train;
use nfl_props::{PipelineError, PredictionPipeline};

/// A receiving-yards model that projects exactly the trailing three-week mean.
fn rolling_mean_model(prop_type: PropType, feature: &str, residual_std: f64) -> LinearPropModel {
    let mut coeffs = vec![0.0; FEATURE_COUNT];
    let idx = FEATURE_NAMES
        .iter()
        .position(|n| *n == feature)
        .expect("feature name should exist");
    coeffs[idx] = 1.0;
    LinearPropModel::from_artifact(PropModelArtifact {
        prop_type,
        feature_means: vec![0.0; FEATURE_COUNT],
        feature_stds: vec![1.0; FEATURE_COUNT],
        coeffs,
        intercept: 0.0,
        l2: 0.0,
        residual_std,
        train_mae: 0.0,
        val_mae: 0.0,
        baseline_val_mae: 0.0,
        train_samples: 0,
        val_samples: 0,
    })
    .expect("hand-built artifact should be valid")
}

fn receiver_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_player(Player {
        player_id: "wr1".to_string(),
        name: "Steady Receiver".to_string(),
        position: "WR".to_string(),
        team: Some("KC".to_string()),
    });
    for week in 1..=4 {
        store.insert_stat(PlayerWeekStat {
            player_id: "wr1".to_string(),
            season: 2025,
            week,
            team: Some("KC".to_string()),
            targets: 8.0,
            receptions: 5.0,
            receiving_yards: 60.0,
            ..Default::default()
        });
    }
    store.insert_line(line("wr1", PropType::ReceivingYards, 55.0));
    store
}

fn line(player_id: &str, prop_type: PropType, value: f64) -> PropLine {
    PropLine {
        player_id: player_id.to_string(),
        prop_type,
        season: 2025,
        week: 5,
        line: value,
        active: true,
    }
}

fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::empty("test-v1");
    registry.insert(Box::new(rolling_mean_model(
        PropType::ReceivingYards,
        "roll3_rec_yds",
        15.0,
    )));
    registry
}

#[test]
fn steady_receiver_projects_over_a_low_line() {
    let store = receiver_store();
    let registry = registry();
    let config = PipelineConfig::default();
    let report = PredictionPipeline::new(&store, &registry, &config)
        .generate_predictions(2025, 5)
        .expect("run should succeed");

    assert_eq!(report.succeeded(), 1);
    assert!(report.skipped.is_empty());
    let r = &report.results[0];
    assert_eq!(r.player_id, "wr1");
    assert_eq!(r.prop_type, PropType::ReceivingYards);
    assert_float_absolute_eq!(r.projected_value, 60.0, 1e-9);
    assert!(r.edge > 0.0);
    assert_eq!(r.side, Some(Side::Over));
    assert_eq!(r.bucket, EdgeBucket::GoodValue);
    assert!(r.over_probability > 0.5);
    assert_float_absolute_eq!(r.over_probability + r.under_probability, 1.0, 1e-12);
    assert!(r.confidence_low < r.projected_value && r.projected_value < r.confidence_high);
    assert_eq!(r.model_version, "test-v1");
    assert!(r.rationale.contains("mean=60.0"));
    assert!(r.rationale.contains("P(over 55.0)"));
}

#[test]
fn fixed_timestamp_runs_are_identical() {
    let store = receiver_store();
    let registry = registry();
    let config = PipelineConfig::default();
    let pipeline = PredictionPipeline::new(&store, &registry, &config);
    let at = Utc.with_ymd_and_hms(2025, 10, 2, 12, 0, 0).unwrap();

    let first = pipeline.generate_predictions_at(2025, 5, at).unwrap();
    let second = pipeline.generate_predictions_at(2025, 5, at).unwrap();
    assert_eq!(first.results, second.results);
    assert_eq!(first.generated_at, at);
}

#[test]
fn per_pair_failures_become_skips() {
    let mut store = receiver_store();
    store.insert_line(line("wr1", PropType::Receptions, 4.5));
    store.insert_line(line("ghost", PropType::ReceivingYards, 40.5));
    let mut inactive = line("wr1", PropType::RushingYards, 3.5);
    inactive.active = false;
    store.insert_line(inactive);

    let registry = registry();
    let config = PipelineConfig::default();
    let report = PredictionPipeline::new(&store, &registry, &config)
        .generate_predictions(2025, 5)
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skipped.len(), 2);
    let counts = report.skip_counts();
    assert_eq!(counts.get("model_unavailable"), Some(&1));
    assert_eq!(counts.get("data_unavailable"), Some(&1));
    let ghost = report
        .skipped
        .iter()
        .find(|s| s.player_id == "ghost")
        .unwrap();
    assert!(ghost.reason.contains("ghost"));
}

#[test]
fn season_without_stats_is_fatal() {
    let store = receiver_store();
    let registry = registry();
    let config = PipelineConfig::default();
    let err = PredictionPipeline::new(&store, &registry, &config)
        .generate_predictions(2019, 5)
        .unwrap_err();
    assert!(matches!(err, PipelineError::DataUnavailable(_)));
}

#[test]
fn week_without_lines_gives_empty_report() {
    let store = receiver_store();
    let registry = registry();
    let config = PipelineConfig::default();
    let report = PredictionPipeline::new(&store, &registry, &config)
        .generate_predictions(2025, 11)
        .unwrap();
    assert!(report.results.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn trained_demo_models_predict_posted_lines() {
    let cfg = DemoConfig::default();
    let store = build_demo_league(&cfg).into_memory_store();
    let artifact = train(&store, 2024..=2025, &TrainConfig::default()).expect("training");
    assert_eq!(artifact.model_version, "ridge-v1-2024-2025");
    assert_eq!(artifact.feature_names.len(), FEATURE_COUNT);
    assert!(!artifact.models.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models").join("prop_models_v1.json");
    save_artifact(&path, &artifact).unwrap();
    let registry = ModelRegistry::load(&path).expect("saved artifact should load");
    assert_eq!(registry.model_version(), artifact.model_version);
    assert_eq!(registry.prop_types().len(), artifact.models.len());

    let config = PipelineConfig::default();
    let report = PredictionPipeline::new(&store, &registry, &config)
        .generate_predictions(cfg.line_season(), cfg.line_week())
        .unwrap();
    assert!(report.succeeded() > 0);
    for r in &report.results {
        assert!((0.01..=0.99).contains(&r.over_probability));
        assert_float_absolute_eq!(r.over_probability + r.under_probability, 1.0, 1e-12);
        assert!(r.projected_value >= 0.0);
        assert!(r.confidence_low >= 0.0);
        assert_eq!(r.week, cfg.line_week());
    }
}
