use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use nfl_props::config::{PipelineConfig, TrainConfig};
use nfl_props::demo::{DemoConfig, DemoLeague, build_demo_league};
use nfl_props::features::FeatureAssembler;
use nfl_props::model::ModelRegistry;
use nfl_props::pipeline::PredictionPipeline;
use nfl_props::rankings::{derive_team_weeks, team_totals_from_stats};
use nfl_props::records::PropType;
use nfl_props::train::train;

fn demo() -> (DemoConfig, DemoLeague) {
    let cfg = DemoConfig::default();
    let league = build_demo_league(&cfg);
    (cfg, league)
}

fn bench_feature_assembly(c: &mut Criterion) {
    let (cfg, league) = demo();
    let ids = league
        .players
        .iter()
        .map(|p| p.player_id.clone())
        .collect::<Vec<_>>();
    let store = league.into_memory_store();
    let assembler = FeatureAssembler::new(&store);

    c.bench_function("feature_assembly_all_players", |b| {
        b.iter(|| {
            for id in &ids {
                let out = assembler.assemble(
                    id,
                    PropType::ReceivingYards,
                    cfg.line_week(),
                    cfg.line_season(),
                );
                black_box(out.ok());
            }
        })
    });
}

fn bench_rankings_derive(c: &mut Criterion) {
    let (_, league) = demo();
    let totals = team_totals_from_stats(&league.stats, &league.games);
    c.bench_function("rankings_derive", |b| {
        b.iter(|| black_box(derive_team_weeks(black_box(&totals))))
    });
}

fn bench_prediction_run(c: &mut Criterion) {
    let (cfg, league) = demo();
    let store = league.into_memory_store();
    let artifact = train(&store, 2024..=2025, &TrainConfig::default()).expect("demo training");
    let registry = ModelRegistry::from_artifact(artifact).expect("valid demo artifact");
    let config = PipelineConfig::default();
    let pipeline = PredictionPipeline::new(&store, &registry, &config);

    c.bench_function("prediction_run_demo_week", |b| {
        b.iter(|| black_box(pipeline.generate_predictions(cfg.line_season(), cfg.line_week()).ok()))
    });
}

criterion_group!(
    perf,
    bench_feature_assembly,
    bench_rankings_derive,
    bench_prediction_run
);
criterion_main!(perf);
