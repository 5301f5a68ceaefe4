use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CACHE_DIR: &str = "nfl_props";
const DB_FILE: &str = "records.sqlite";
const MODEL_FILE: &str = "prop_models_v1.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityBounds {
    pub floor: f64,
    pub ceil: f64,
}

impl Default for ProbabilityBounds {
    fn default() -> Self {
        Self {
            floor: 0.01,
            ceil: 0.99,
        }
    }
}

impl ProbabilityBounds {
    pub fn clamp(&self, p: f64) -> f64 {
        p.clamp(self.floor, self.ceil)
    }

    fn sanitized(self) -> Self {
        let floor = self.floor.clamp(0.0, 0.49);
        let ceil = self.ceil.clamp(0.51, 1.0);
        Self { floor, ceil }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub db_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub parallelism: usize,
    #[serde(default)]
    pub bounds: ProbabilityBounds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: app_cache_dir().map(|dir| dir.join(DB_FILE)),
            model_path: app_cache_dir().map(|dir| dir.join(MODEL_FILE)),
            parallelism: 4,
            bounds: ProbabilityBounds::default(),
        }
    }
}

impl PipelineConfig {
    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        self.db_path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no database path: set NFL_PROPS_DB or HOME"))
    }

    pub fn model_path(&self) -> anyhow::Result<PathBuf> {
        self.model_path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no model path: set NFL_PROPS_MODEL_PATH or HOME"))
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(path) = path_env("NFL_PROPS_DB") {
            cfg.db_path = Some(path);
        }
        if let Some(path) = path_env("NFL_PROPS_MODEL_PATH") {
            cfg.model_path = Some(path);
        }
        cfg.parallelism = env::var("NFL_PROPS_PARALLELISM")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(cfg.parallelism)
            .clamp(1, 32);
        let floor = f64_env("NFL_PROPS_PROB_FLOOR").unwrap_or(cfg.bounds.floor);
        let ceil = f64_env("NFL_PROPS_PROB_CEIL").unwrap_or(cfg.bounds.ceil);
        cfg.bounds = ProbabilityBounds { floor, ceil }.sanitized();
        cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub min_samples: usize,
    pub train_split: f64,
    pub l2_grid: Vec<f64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            min_samples: 30,
            train_split: 0.85,
            l2_grid: vec![0.03, 0.1, 0.3, 1.0, 3.0],
        }
    }
}

impl TrainConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(n) = env::var("NFL_PROPS_MIN_SAMPLES")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
        {
            cfg.min_samples = n.max(2);
        }
        if let Some(split) = f64_env("NFL_PROPS_TRAIN_SPLIT") {
            cfg.train_split = split.clamp(0.5, 0.95);
        }
        cfg
    }
}

/// Binary startup: `.env.local` / `.env` overrides, then a fmt subscriber
/// filtered by `RUST_LOG` (default `info`).
pub fn init_cli() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn path_env(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn f64_env(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_clamp_to_open_interval() {
        let b = ProbabilityBounds::default();
        assert_eq!(b.clamp(1.0), 0.99);
        assert_eq!(b.clamp(0.0), 0.01);
        assert_eq!(b.clamp(0.4), 0.4);
    }

    #[test]
    fn sanitized_bounds_never_cross() {
        let b = ProbabilityBounds {
            floor: 0.8,
            ceil: 0.2,
        }
        .sanitized();
        assert!(b.floor < 0.5 && b.ceil > 0.5);
    }
}
