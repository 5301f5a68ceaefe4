use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::edge;
use crate::error::{PipelineError, PipelineResult};
use crate::features::FeatureAssembler;
use crate::model::{ModelRegistry, Projection};
use crate::records::{PredictionResult, PropLine, PropType, Season, Week};
use crate::store::RecordStore;

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPair {
    pub player_id: String,
    pub prop_type: PropType,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub season: Season,
    pub week: Week,
    pub model_version: String,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<PredictionResult>,
    pub skipped: Vec<SkippedPair>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn skip_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut out = BTreeMap::new();
        for s in &self.skipped {
            *out.entry(s.kind).or_insert(0) += 1;
        }
        out
    }
}

/// Batch entry point: one result per active prop line of a week.
pub struct PredictionPipeline<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    registry: &'a ModelRegistry,
    config: &'a PipelineConfig,
}

impl<'a, S: RecordStore + ?Sized> PredictionPipeline<'a, S> {
    pub fn new(store: &'a S, registry: &'a ModelRegistry, config: &'a PipelineConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn generate_predictions(&self, season: Season, week: Week) -> PipelineResult<RunReport> {
        self.generate_predictions_at(season, week, Utc::now())
    }

    /// Same inputs and timestamp always give the same report.
    ///
    /// Per-line failures are recorded as skips; only a missing season or a
    /// store read failure before any line is processed aborts the run.
    pub fn generate_predictions_at(
        &self,
        season: Season,
        week: Week,
        generated_at: DateTime<Utc>,
    ) -> PipelineResult<RunReport> {
        if !self.store.season_has_stats(season)? {
            return Err(PipelineError::empty_season(season));
        }
        let lines = self.store.active_prop_lines(season, week)?;
        if lines.is_empty() {
            warn!(season, week, "no active prop lines");
        }

        let outcomes: Vec<PipelineResult<PredictionResult>> =
            with_pool(self.config.parallelism, || {
                lines
                    .par_iter()
                    .map(|line| self.predict_line(line, generated_at))
                    .collect()
            });

        let mut results = Vec::with_capacity(lines.len());
        let mut skipped = Vec::new();
        for (line, outcome) in lines.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(
                        player_id = %line.player_id,
                        prop = %line.prop_type,
                        kind = err.kind(),
                        "pair skipped: {err}"
                    );
                    skipped.push(SkippedPair {
                        player_id: line.player_id.clone(),
                        prop_type: line.prop_type,
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            season,
            week,
            succeeded = results.len(),
            skipped = skipped.len(),
            "prediction run finished"
        );
        Ok(RunReport {
            season,
            week,
            model_version: self.registry.model_version().to_string(),
            generated_at,
            results,
            skipped,
        })
    }

    pub fn predict_line(
        &self,
        line: &PropLine,
        generated_at: DateTime<Utc>,
    ) -> PipelineResult<PredictionResult> {
        let estimator = self.registry.estimator(line.prop_type)?;
        if !line.line.is_finite() || line.line < 0.0 {
            return Err(PipelineError::DataUnavailable(format!(
                "prop line {} for {} is not a valid number",
                line.line, line.player_id
            )));
        }
        let assembled = FeatureAssembler::new(self.store).assemble(
            &line.player_id,
            line.prop_type,
            line.week,
            line.season,
        )?;
        let projection = estimator.predict(&assembled.vector, line.line, self.config.bounds)?;
        let edge = edge::compute(projection.mean, line.line);

        Ok(PredictionResult {
            player_id: line.player_id.clone(),
            prop_type: line.prop_type,
            season: line.season,
            week: line.week,
            line: line.line,
            projected_value: projection.mean,
            over_probability: projection.over_probability,
            under_probability: projection.under_probability,
            edge: edge.value,
            bucket: edge.bucket,
            side: edge.side,
            confidence_low: projection.low,
            confidence_high: projection.high,
            model_version: self.registry.model_version().to_string(),
            generated_at,
            rationale: rationale(&projection, line.line),
        })
    }
}

fn rationale(projection: &Projection, line: f64) -> String {
    format!(
        "normal projection: mean={:.1}, sd={:.1}, P(over {:.1})={:.1}%",
        projection.mean,
        projection.std,
        line,
        projection.over_probability * 100.0
    )
}

fn with_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
