//! Core library for bioink printability prediction
//!
//! This crate provides the core functionality for:
//! - Cleaning raw experimental records and extracting model features
//! - Training a seeded random-forest classifier
//! - Persisting and loading model artifacts
//! - Inference with rule-based remarks
//! - Parameter ranges and observability

pub mod artifact;
pub mod error;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod ranges;
pub mod training;

pub use artifact::{ArtifactStore, ModelArtifact};
pub use error::{ArtifactError, PredictionError, RangeError, TrainingError};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{
    InferenceStats, ModelInfo, Prediction, PredictionService, Predictor, Remark, RemarkConfig,
    RemarkEngine,
};
pub use ranges::{ParameterRange, ParameterRangeRegistry};
pub use training::{ModelTrainer, TrainingOutcome};
