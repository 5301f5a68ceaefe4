use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::config::ProbabilityBounds;
use crate::defaults::{FEATURE_COUNT, FEATURE_NAMES};
use crate::error::{PipelineError, PipelineResult};
use crate::features::FeatureVector;
use crate::linear::{dot, standardized};
use crate::records::PropType;

pub const ARTIFACT_VERSION: u32 = 1;

/// z-score of the two-sided 90% interval.
const Z_90: f64 = 1.645;
const MIN_SIGMA: f64 = 1.0;
const MIN_SIGMA_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropModelArtifact {
    pub prop_type: PropType,
    pub feature_means: Vec<f64>,
    pub feature_stds: Vec<f64>,
    pub coeffs: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub l2: f64,
    pub residual_std: f64,
    #[serde(default)]
    pub train_mae: f64,
    #[serde(default)]
    pub val_mae: f64,
    #[serde(default)]
    pub baseline_val_mae: f64,
    #[serde(default)]
    pub train_samples: usize,
    #[serde(default)]
    pub val_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRegistryArtifact {
    pub version: u32,
    pub model_version: String,
    pub generated_at: String,
    pub seasons: Vec<u16>,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub models: Vec<PropModelArtifact>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub mean: f64,
    pub std: f64,
    pub over_probability: f64,
    pub under_probability: f64,
    pub low: f64,
    pub high: f64,
}

/// One trained estimator per prop type, all sharing the 75-slot contract.
pub trait PropEstimator: Send + Sync {
    fn prop_type(&self) -> PropType;

    fn predict(
        &self,
        features: &FeatureVector,
        line: f64,
        bounds: ProbabilityBounds,
    ) -> PipelineResult<Projection>;
}

#[derive(Debug, Clone)]
pub struct LinearPropModel {
    artifact: PropModelArtifact,
}

impl LinearPropModel {
    pub fn from_artifact(artifact: PropModelArtifact) -> Result<Self> {
        for (name, len) in [
            ("feature_means", artifact.feature_means.len()),
            ("feature_stds", artifact.feature_stds.len()),
            ("coeffs", artifact.coeffs.len()),
        ] {
            if len != FEATURE_COUNT {
                return Err(anyhow!(
                    "{} model has {len} {name}, expected {FEATURE_COUNT}",
                    artifact.prop_type
                ));
            }
        }
        Ok(Self { artifact })
    }

    pub fn artifact(&self) -> &PropModelArtifact {
        &self.artifact
    }

    pub fn mean(&self, features: &FeatureVector) -> f64 {
        let z = features
            .values()
            .iter()
            .zip(self.artifact.feature_means.iter().zip(&self.artifact.feature_stds))
            .map(|(v, (m, s))| standardized(*v, *m, *s))
            .collect::<Vec<_>>();
        (self.artifact.intercept + dot(&self.artifact.coeffs, &z)).max(0.0)
    }
}

impl PropEstimator for LinearPropModel {
    fn prop_type(&self) -> PropType {
        self.artifact.prop_type
    }

    fn predict(
        &self,
        features: &FeatureVector,
        line: f64,
        bounds: ProbabilityBounds,
    ) -> PipelineResult<Projection> {
        let mean = self.mean(features);
        if !mean.is_finite() {
            return Err(PipelineError::InvalidVector(format!(
                "{} projection is not finite",
                self.artifact.prop_type
            )));
        }
        Ok(project(mean, self.artifact.residual_std, line, bounds))
    }
}

/// Normal outcome model around `mean`; the spread never collapses below 20%
/// of the mean or one unit.
pub fn project(mean: f64, residual_std: f64, line: f64, bounds: ProbabilityBounds) -> Projection {
    let std = residual_std
        .max(MIN_SIGMA_FRACTION * mean)
        .max(MIN_SIGMA);
    let over = bounds.clamp(1.0 - normal_cdf((line - mean) / std));
    Projection {
        mean,
        std,
        over_probability: over,
        under_probability: 1.0 - over,
        low: (mean - Z_90 * std).max(0.0),
        high: mean + Z_90 * std,
    }
}

/// Abramowitz-Stegun 26.2.17; absolute error below 7.5e-8.
pub fn normal_cdf(z: f64) -> f64 {
    if z < -8.0 {
        return 0.0;
    }
    if z > 8.0 {
        return 1.0;
    }
    if z < 0.0 {
        return 1.0 - normal_cdf(-z);
    }

    const P: f64 = 0.2316419;
    const B: [f64; 5] = [
        0.319381530,
        -0.356563782,
        1.781477937,
        -1.821255978,
        1.330274429,
    ];

    let t = 1.0 / (1.0 + P * z);
    let mut poly = 0.0;
    let mut tk = t;
    for b in B {
        poly += b * tk;
        tk *= t;
    }
    let pdf = (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt();
    1.0 - pdf * poly
}

/// Estimators keyed by prop type, chosen once at startup.
pub struct ModelRegistry {
    model_version: String,
    models: HashMap<PropType, Box<dyn PropEstimator>>,
}

impl ModelRegistry {
    pub fn empty(model_version: impl Into<String>) -> Self {
        Self {
            model_version: model_version.into(),
            models: HashMap::new(),
        }
    }

    pub fn from_artifact(artifact: ModelRegistryArtifact) -> Result<Self> {
        if artifact.version != ARTIFACT_VERSION {
            return Err(anyhow!(
                "unsupported model artifact version {} (expected {ARTIFACT_VERSION})",
                artifact.version
            ));
        }
        check_feature_contract(&artifact.feature_names)?;
        let mut registry = Self::empty(artifact.model_version);
        for model in artifact.models {
            registry.insert(Box::new(LinearPropModel::from_artifact(model)?));
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_artifact(load_artifact(path)?)
    }

    pub fn insert(&mut self, estimator: Box<dyn PropEstimator>) {
        self.models.insert(estimator.prop_type(), estimator);
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn prop_types(&self) -> Vec<PropType> {
        let mut out: Vec<_> = self.models.keys().copied().collect();
        out.sort();
        out
    }

    pub fn estimator(&self, prop_type: PropType) -> PipelineResult<&dyn PropEstimator> {
        self.models
            .get(&prop_type)
            .map(|m| m.as_ref())
            .ok_or(PipelineError::ModelUnavailable(prop_type))
    }

    pub fn predict(
        &self,
        features: &FeatureVector,
        prop_type: PropType,
        line: f64,
        bounds: ProbabilityBounds,
    ) -> PipelineResult<Projection> {
        self.estimator(prop_type)?.predict(features, line, bounds)
    }
}

fn check_feature_contract(names: &[String]) -> Result<()> {
    if names.len() != FEATURE_COUNT {
        return Err(anyhow!(
            "model artifact lists {} features, expected {FEATURE_COUNT}",
            names.len()
        ));
    }
    if let Some((idx, (got, want))) = names
        .iter()
        .zip(FEATURE_NAMES)
        .enumerate()
        .find(|(_, (got, want))| got.as_str() != *want)
    {
        return Err(anyhow!(
            "model artifact feature {idx} is {got:?}, expected {want:?}"
        ));
    }
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<ModelRegistryArtifact> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read model artifact {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse model artifact {}", path.display()))
}

pub fn save_artifact(path: &Path, artifact: &ModelRegistryArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create model dir {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(artifact).context("serialize model artifact")?;
    fs::write(&tmp, json).context("write model artifact")?;
    fs::rename(&tmp, path).context("swap model artifact")?;
    Ok(())
}
