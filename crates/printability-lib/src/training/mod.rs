//! Offline model training
//!
//! One-shot pipeline: CSV export → raw records → feature vectors + labels →
//! seeded random forest → persisted artifact.

mod dataset;
mod forest;
mod trainer;

#[cfg(test)]
mod tests;

pub use dataset::{load_csv, load_csv_reader};
pub use forest::{
    DecisionTree, ForestConfig, MaxFeatures, RandomForest, TreeNode, DEFAULT_N_ESTIMATORS,
    DEFAULT_SEED,
};
pub use trainer::{FeatureStats, ModelTrainer, TrainingOutcome, TrainingSet, TrainingSummary};

use serde::{Deserialize, Serialize};

/// One entry of the diagnostic importance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

impl FeatureImportance {
    /// Pair names with scores and sort descending; ties keep schema order
    pub fn ranked(names: &[String], scores: &[f64]) -> Vec<Self> {
        let mut ranking: Vec<Self> = names
            .iter()
            .zip(scores)
            .map(|(feature, &importance)| Self {
                feature: feature.clone(),
                importance,
            })
            .collect();
        ranking.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        ranking
    }
}
