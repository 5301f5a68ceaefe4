use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use strum_macros::Display;

use crate::records::{PlayerWeekStat, PredictionResult, Season, Side};
use crate::store::RecordStore;

pub const CALIBRATION_BINS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Over,
    Under,
    Push,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CalibrationBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub graded: usize,
    pub pending: usize,
    pub overs: usize,
    pub unders: usize,
    pub pushes: usize,
    /// Recommended side versus outcome; pushes and no-side results excluded.
    pub picks: usize,
    pub hits: usize,
    pub hit_rate: f64,
    pub brier: f64,
    pub log_loss: f64,
    pub bins: Vec<CalibrationBin>,
}

const PUSH_TOLERANCE: f64 = 1e-9;

pub fn grade(result: &PredictionResult, actual: f64) -> Outcome {
    if (actual - result.line).abs() <= PUSH_TOLERANCE {
        Outcome::Push
    } else if actual > result.line {
        Outcome::Over
    } else {
        Outcome::Under
    }
}

/// Grades results against recorded box scores. Results whose week has no
/// stat row yet count as pending.
pub fn grade_run<S: RecordStore + ?Sized>(
    store: &S,
    results: &[PredictionResult],
) -> Result<GradeReport> {
    let mut cache: HashMap<(String, Season), Vec<PlayerWeekStat>> = HashMap::new();
    let mut graded = Vec::new();
    let mut pending = 0usize;

    for r in results {
        let key = (r.player_id.clone(), r.season);
        if !cache.contains_key(&key) {
            let stats = store.player_week_stats(&r.player_id, r.season)?;
            cache.insert(key.clone(), stats);
        }
        let newest = cache.get(&key).and_then(|rows| {
            rows.iter()
                .filter(|s| s.week == r.week)
                .max_by_key(|s| s.ingest_seq)
        });
        match newest {
            Some(stat) => graded.push((r, grade(r, r.prop_type.actual(stat)))),
            None => pending += 1,
        }
    }

    Ok(summarize(&graded, pending))
}

fn summarize(graded: &[(&PredictionResult, Outcome)], pending: usize) -> GradeReport {
    let mut overs = 0;
    let mut unders = 0;
    let mut pushes = 0;
    let mut picks = 0;
    let mut hits = 0;
    let mut probs = Vec::new();
    let mut labels = Vec::new();

    for (r, outcome) in graded {
        match outcome {
            Outcome::Over => overs += 1,
            Outcome::Under => unders += 1,
            Outcome::Push => pushes += 1,
        }
        if *outcome == Outcome::Push {
            continue;
        }
        probs.push(r.over_probability);
        labels.push(*outcome == Outcome::Over);
        if let Some(side) = r.side {
            picks += 1;
            let hit = matches!(
                (side, outcome),
                (Side::Over, Outcome::Over) | (Side::Under, Outcome::Under)
            );
            if hit {
                hits += 1;
            }
        }
    }

    let (brier, log_loss) = probability_scores(&probs, &labels);
    GradeReport {
        graded: graded.len(),
        pending,
        overs,
        unders,
        pushes,
        picks,
        hits,
        hit_rate: if picks > 0 {
            hits as f64 / picks as f64
        } else {
            0.0
        },
        brier,
        log_loss,
        bins: calibration_bins(&probs, &labels, CALIBRATION_BINS),
    }
}

fn probability_scores(probs: &[f64], labels: &[bool]) -> (f64, f64) {
    if probs.is_empty() {
        return (0.0, 0.0);
    }
    let mut brier = 0.0_f64;
    let mut log_loss = 0.0_f64;
    for (p, over) in probs.iter().zip(labels) {
        let y = if *over { 1.0 } else { 0.0 };
        brier += (p - y).powi(2);
        let p_actual = if *over { *p } else { 1.0 - p };
        log_loss += -p_actual.clamp(1e-12, 1.0).ln();
    }
    let n = probs.len() as f64;
    (brier / n, log_loss / n)
}

pub fn calibration_bins(probs: &[f64], labels: &[bool], bins: usize) -> Vec<CalibrationBin> {
    let bins = bins.max(2);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut actual_sum = vec![0.0_f64; bins];

    for (p, over) in probs.iter().zip(labels) {
        let p = p.clamp(0.0, 1.0);
        let idx = ((p * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += p;
        if *over {
            actual_sum[idx] += 1.0;
        }
    }

    (0..bins)
        .map(|i| {
            let count = counts[i];
            let (avg_pred, actual_rate) = if count > 0 {
                (pred_sum[i] / count as f64, actual_sum[i] / count as f64)
            } else {
                (0.0, 0.0)
            };
            CalibrationBin {
                bucket_start: i as f64 / bins as f64,
                bucket_end: (i + 1) as f64 / bins as f64,
                count,
                avg_pred,
                actual_rate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EdgeBucket, PropType};
    use assert_float_eq::*;
    use chrono::Utc;

    fn result(line: f64, over: f64, side: Option<Side>) -> PredictionResult {
        PredictionResult {
            player_id: "p".into(),
            prop_type: PropType::ReceivingYards,
            season: 2025,
            week: 5,
            line,
            projected_value: line,
            over_probability: over,
            under_probability: 1.0 - over,
            edge: 0.0,
            bucket: EdgeBucket::Marginal,
            side,
            confidence_low: 0.0,
            confidence_high: 0.0,
            model_version: "t".into(),
            generated_at: Utc::now(),
            rationale: String::new(),
        }
    }

    #[test]
    fn grade_compares_against_line() {
        let r = result(55.5, 0.6, Some(Side::Over));
        assert_eq!(grade(&r, 60.0), Outcome::Over);
        assert_eq!(grade(&r, 12.0), Outcome::Under);
        assert_eq!(grade(&result(50.0, 0.5, None), 50.0), Outcome::Push);
    }

    #[test]
    fn float_noise_around_the_line_is_a_push() {
        let r = result(0.3, 0.5, None);
        assert_eq!(grade(&r, 0.1 + 0.2), Outcome::Push);
        assert_eq!(grade(&r, 0.3 - 1e-12), Outcome::Push);
        assert_eq!(grade(&r, 0.3 + 1e-6), Outcome::Over);
    }

    #[test]
    fn perfect_predictions_have_zero_brier() {
        let (brier, _) = probability_scores(&[1.0, 0.0], &[true, false]);
        assert_float_absolute_eq!(brier, 0.0, 1e-12);
    }

    #[test]
    fn summary_counts_hits_and_excludes_pushes() {
        let a = result(50.5, 0.7, Some(Side::Over));
        let b = result(50.5, 0.3, Some(Side::Under));
        let c = result(50.0, 0.5, None);
        let graded = vec![
            (&a, Outcome::Over),
            (&b, Outcome::Over),
            (&c, Outcome::Push),
        ];
        let report = summarize(&graded, 2);
        assert_eq!(report.graded, 3);
        assert_eq!(report.pending, 2);
        assert_eq!(report.picks, 2);
        assert_eq!(report.hits, 1);
        assert_float_absolute_eq!(report.hit_rate, 0.5, 1e-12);
        assert_eq!(report.bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }
}
