//! Offline retraining: one ridge regression per prop type over every
//! historical player-week that had prior weeks in the same season.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use anyhow::{Result, anyhow};
use chrono::Utc;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::aggregate::PlayerHistory;
use crate::config::TrainConfig;
use crate::defaults::FEATURE_NAMES;
use crate::error::PipelineError;
use crate::features::{FeatureAssembler, FeatureVector};
use crate::linear::{RidgeFit, Standardizer, mean_abs_error, ridge_fit, rmse};
use crate::model::{ARTIFACT_VERSION, ModelRegistryArtifact, PropModelArtifact};
use crate::records::{PropType, Season, Week};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct Sample {
    pub season: Season,
    pub week: Week,
    pub player_id: String,
    pub features: FeatureVector,
    pub target: f64,
}

/// Chronologically ordered samples per prop type.
pub fn collect_samples<S: RecordStore + ?Sized>(
    store: &S,
    seasons: RangeInclusive<Season>,
) -> Result<BTreeMap<PropType, Vec<Sample>>> {
    let assembler = FeatureAssembler::new(store);
    let mut out: BTreeMap<PropType, Vec<Sample>> = BTreeMap::new();

    for season in seasons {
        let player_ids = store.player_ids_with_stats(season)?;
        if player_ids.is_empty() {
            debug!(season, "no stats recorded; skipping season");
            continue;
        }
        for player_id in player_ids {
            let Some(player) = store.player(&player_id)? else {
                warn!(%player_id, season, "stats without player record; skipping");
                continue;
            };
            let stats = store.player_week_stats(&player_id, season)?;
            let recorded = PlayerHistory::before(&stats, Week::MAX);
            for row in recorded.weeks().iter().skip(1) {
                for prop_type in PropType::iter() {
                    if prop_type.category().volume(row) <= 0.0 {
                        continue;
                    }
                    let assembled = match assembler.assemble_with_stats(
                        &player, &stats, prop_type, row.week, season,
                    ) {
                        Ok(a) => a,
                        Err(PipelineError::Store(err)) => return Err(err),
                        Err(err) => {
                            warn!(%player_id, season, week = row.week, %prop_type, "sample skipped: {err}");
                            continue;
                        }
                    };
                    out.entry(prop_type).or_default().push(Sample {
                        season,
                        week: row.week,
                        player_id: player_id.clone(),
                        features: assembled.vector,
                        target: prop_type.actual(row),
                    });
                }
            }
        }
    }

    for samples in out.values_mut() {
        samples.sort_by(|a, b| {
            (a.season, a.week)
                .cmp(&(b.season, b.week))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
    }
    Ok(out)
}

/// Fits one prop type. Returns `None` when there are too few samples.
pub fn fit_prop(
    prop_type: PropType,
    samples: &[Sample],
    config: &TrainConfig,
) -> Result<Option<PropModelArtifact>> {
    let n = samples.len();
    if n < config.min_samples.max(2) {
        return Ok(None);
    }
    let split = ((n as f64 * config.train_split).floor() as usize).clamp(1, n - 1);
    let (train, val) = samples.split_at(split);

    let (train_std, train_z, train_y) = design(train);
    let val_z: Vec<Vec<f64>> = val
        .iter()
        .map(|s| train_std.transform(s.features.values()))
        .collect();
    let val_y: Vec<f64> = val.iter().map(|s| s.target).collect();

    let mut best: Option<(f64, f64, RidgeFit)> = None;
    for &l2 in &config.l2_grid {
        let fit = match ridge_fit(&train_z, &train_y, l2) {
            Ok(fit) => fit,
            Err(err) => {
                debug!(%prop_type, l2, "ridge fit failed: {err:#}");
                continue;
            }
        };
        let preds = predict_all(&fit, &val_z);
        let score = rmse(&preds, &val_y);
        debug!(%prop_type, l2, val_rmse = score, "l2 candidate");
        if best.as_ref().is_none_or(|(s, _, _)| score < *s) {
            best = Some((score, l2, fit));
        }
    }
    let Some((_, l2, train_fit)) = best else {
        return Err(anyhow!("{prop_type}: no l2 candidate produced a fit"));
    };

    let train_mae = mean_abs_error(&predict_all(&train_fit, &train_z), &train_y);
    let val_mae = mean_abs_error(&predict_all(&train_fit, &val_z), &val_y);
    let train_mean = train_y.iter().sum::<f64>() / train_y.len() as f64;
    let baseline_val_mae = mean_abs_error(&vec![train_mean; val_y.len()], &val_y);

    let (full_std, full_z, full_y) = design(samples);
    let full_fit = ridge_fit(&full_z, &full_y, l2)?;
    let residual_std = rmse(&predict_all(&full_fit, &full_z), &full_y);

    Ok(Some(PropModelArtifact {
        prop_type,
        feature_means: full_std.means,
        feature_stds: full_std.stds,
        coeffs: full_fit.coeffs,
        intercept: full_fit.intercept,
        l2,
        residual_std,
        train_mae,
        val_mae,
        baseline_val_mae,
        train_samples: train.len(),
        val_samples: val.len(),
    }))
}

pub fn train<S: RecordStore + ?Sized>(
    store: &S,
    seasons: RangeInclusive<Season>,
    config: &TrainConfig,
) -> Result<ModelRegistryArtifact> {
    let (first, last) = (*seasons.start(), *seasons.end());
    if first > last {
        return Err(anyhow!("empty season range {first}..={last}"));
    }
    let samples = collect_samples(store, seasons)?;

    let mut models = Vec::new();
    for prop_type in PropType::iter() {
        let prop_samples = samples.get(&prop_type).map(Vec::as_slice).unwrap_or(&[]);
        match fit_prop(prop_type, prop_samples, config)? {
            Some(model) => {
                info!(
                    %prop_type,
                    samples = prop_samples.len(),
                    l2 = model.l2,
                    val_mae = model.val_mae,
                    baseline_val_mae = model.baseline_val_mae,
                    residual_std = model.residual_std,
                    "model fitted"
                );
                models.push(model);
            }
            None => warn!(
                %prop_type,
                samples = prop_samples.len(),
                min_samples = config.min_samples,
                "too few samples; prop type left untrained"
            ),
        }
    }
    if models.is_empty() {
        return Err(anyhow!(
            "no prop type reached {} samples in seasons {first}..={last}",
            config.min_samples
        ));
    }

    Ok(ModelRegistryArtifact {
        version: ARTIFACT_VERSION,
        model_version: format!("ridge-v{ARTIFACT_VERSION}-{first}-{last}"),
        generated_at: Utc::now().to_rfc3339(),
        seasons: (first..=last).collect(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        models,
    })
}

fn design(samples: &[Sample]) -> (Standardizer, Vec<Vec<f64>>, Vec<f64>) {
    let rows: Vec<&[f64]> = samples.iter().map(|s| s.features.values()).collect();
    let std = Standardizer::fit(&rows);
    let z = rows.iter().map(|r| std.transform(r)).collect();
    let y = samples.iter().map(|s| s.target).collect();
    (std, z, y)
}

fn predict_all(fit: &RidgeFit, z: &[Vec<f64>]) -> Vec<f64> {
    z.iter().map(|row| fit.predict(row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::FEATURE_COUNT;

    fn sample(week: Week, x: f64, y: f64) -> Sample {
        let mut values = vec![0.0; FEATURE_COUNT];
        values[18] = x;
        Sample {
            season: 2024,
            week,
            player_id: format!("p{week}"),
            features: FeatureVector::new(values).unwrap(),
            target: y,
        }
    }

    #[test]
    fn below_min_samples_is_skipped() {
        let samples: Vec<_> = (0..5).map(|i| sample(i, 1.0, 1.0)).collect();
        let cfg = TrainConfig::default();
        assert!(fit_prop(PropType::Receptions, &samples, &cfg).unwrap().is_none());
    }

    #[test]
    fn fit_tracks_rolling_signal() {
        let samples: Vec<_> = (0..60)
            .map(|i| {
                let x = 20.0 + (i % 15) as f64 * 5.0;
                sample((i % 17) as Week + 2, x, 0.9 * x + 4.0)
            })
            .collect();
        let cfg = TrainConfig::default();
        let model = fit_prop(PropType::ReceivingYards, &samples, &cfg)
            .unwrap()
            .unwrap();
        assert!(model.val_mae < model.baseline_val_mae);
        assert!(model.coeffs[18] > 0.0);
        assert_eq!(model.train_samples + model.val_samples, 60);
    }
}
