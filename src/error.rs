use thiserror::Error;

use crate::records::{PropType, Season};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("no trained model for prop type {0}")]
    ModelUnavailable(PropType),

    #[error("invalid feature vector: {0}")]
    InvalidVector(String),

    #[error("record store: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn unknown_player(player_id: &str) -> Self {
        Self::DataUnavailable(format!("player {player_id} not found"))
    }

    pub fn empty_season(season: Season) -> Self {
        Self::DataUnavailable(format!("no player stats recorded for season {season}"))
    }

    /// Short tag for grouping skip reasons in a run report.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::DataUnavailable(_) => "data_unavailable",
            PipelineError::ModelUnavailable(_) => "model_unavailable",
            PipelineError::InvalidVector(_) => "invalid_vector",
            PipelineError::Store(_) => "store",
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
