//! Printability prediction engine

mod cleaner;
mod features;
mod inference;
mod remarks;

pub use cleaner::{clean_numeric, clean_numeric_str, DASH_GLYPHS};
pub use features::{
    crosslinker_flag, kpa_to_psi, parse_composition, FeatureExtractor, DEFAULT_NEEDLE_GAUGE,
    KPA_TO_PSI,
};
pub use inference::{InferenceStats, Prediction, PredictionService};
pub use remarks::{
    Remark, RemarkConfig, RemarkEngine, EXCELLENT_PROBABILITY, MAX_LAYER_HEIGHT_MM,
    MIN_EXTRUSION_PSI, STABLE_PROBABILITY,
};

use crate::error::PredictionError;
use crate::models::{FeatureVector, PredictionResult, PrintParameters};
use serde::{Deserialize, Serialize};

/// Summary of the model behind a predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_version: String,
    pub trees: usize,
    pub training_samples: usize,
}

/// Trait for prediction implementations
pub trait Predictor: Send + Sync {
    /// Classify one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictionError>;

    /// Classify boundary inputs and attach a remark
    fn evaluate(&self, params: &PrintParameters) -> Result<PredictionResult, PredictionError>;

    /// Get current model version
    fn model_version(&self) -> &str;

    /// Describe the loaded model
    fn model_info(&self) -> ModelInfo;

    /// Inference counters since construction
    fn stats(&self) -> InferenceStats;
}
