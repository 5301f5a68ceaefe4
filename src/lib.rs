pub mod aggregate;
pub mod config;
pub mod defaults;
pub mod demo;
pub mod edge;
pub mod error;
pub mod export;
pub mod features;
pub mod grading;
pub mod linear;
pub mod memory_store;
pub mod model;
pub mod opponent;
pub mod pipeline;
pub mod rankings;
pub mod records;
pub mod sqlite_store;
pub mod store;
pub mod train;
pub mod writer;

pub use error::{PipelineError, PipelineResult};
pub use features::{AssembledFeatures, DegradedFeature, FeatureAssembler, FeatureVector};
pub use model::{ModelRegistry, PropEstimator};
pub use pipeline::{PredictionPipeline, RunReport};
pub use store::RecordStore;
