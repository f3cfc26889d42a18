//! Model training over extracted feature vectors

use super::forest::{ForestConfig, RandomForest};
use super::FeatureImportance;
use crate::artifact::{ArtifactMetadata, ModelArtifact};
use crate::error::TrainingError;
use crate::models::{columns, FeatureVector, Label, RawRecord, FEATURE_NAMES};
use crate::predictor::FeatureExtractor;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Feature vectors paired with labels, after dropping unusable records
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<Label>,
    /// Records rejected because their composition could not be parsed
    pub dropped: usize,
}

impl TrainingSet {
    /// Build from raw records, reading labels from the `Printable` column
    pub fn from_records(records: &[RawRecord], extractor: &FeatureExtractor) -> Self {
        let labels: Vec<Label> = records
            .iter()
            .map(|r| Label::from_cell(r.get(columns::PRINTABLE)))
            .collect();
        Self::assemble(records, &labels, extractor)
    }

    /// Build from raw records with labels supplied separately
    pub fn from_records_with_labels(
        records: &[RawRecord],
        labels: &[Label],
        extractor: &FeatureExtractor,
    ) -> Result<Self, TrainingError> {
        if records.len() != labels.len() {
            return Err(TrainingError::LengthMismatch {
                features: records.len(),
                labels: labels.len(),
            });
        }
        Ok(Self::assemble(records, labels, extractor))
    }

    fn assemble(records: &[RawRecord], labels: &[Label], extractor: &FeatureExtractor) -> Self {
        let (kept, dropped) = extractor.extract_all(records);
        let (features, labels) = kept
            .into_iter()
            .map(|(idx, features)| (features, labels[idx]))
            .unzip();
        Self {
            features,
            labels,
            dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn n_printable(&self) -> usize {
        self.labels.iter().filter(|l| l.is_printable()).count()
    }

    /// Min/mean/max per feature, in schema order
    pub fn feature_stats(&self) -> Vec<FeatureStats> {
        FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<f64> = self.features.iter().map(|f| f.to_array()[idx]).collect();
                FeatureStats::from_values(name, &values)
            })
            .collect()
    }
}

/// Descriptive statistics for one feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub feature: String,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl FeatureStats {
    fn from_values(name: &str, values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                feature: name.to_string(),
                min: 0.0,
                mean: 0.0,
                max: 0.0,
            };
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Self {
            feature: name.to_string(),
            min,
            mean,
            max,
        }
    }
}

/// Dataset overview reported after training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub total_samples: usize,
    pub printable_samples: usize,
    pub printable_share: f64,
    pub dropped_records: usize,
    pub feature_stats: Vec<FeatureStats>,
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub summary: TrainingSummary,
    pub importances: Vec<FeatureImportance>,
}

/// Fits the printability classifier
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: ForestConfig,
    extractor: FeatureExtractor,
}

impl ModelTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ForestConfig) -> Self {
        Self {
            config,
            extractor: FeatureExtractor::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Extract features from raw records and train on them
    pub fn train_records(&self, records: &[RawRecord]) -> Result<TrainingOutcome, TrainingError> {
        let set = TrainingSet::from_records(records, &self.extractor);
        if set.dropped > 0 {
            warn!(
                dropped = set.dropped,
                total = records.len(),
                "Dropped records with unparseable composition"
            );
        }
        self.train(&set)
    }

    /// Fit the forest and bind it to the feature schema
    pub fn train(&self, set: &TrainingSet) -> Result<TrainingOutcome, TrainingError> {
        if set.features.len() != set.labels.len() {
            return Err(TrainingError::LengthMismatch {
                features: set.features.len(),
                labels: set.labels.len(),
            });
        }
        if set.is_empty() {
            return Err(TrainingError::EmptyDataset {
                dropped: set.dropped,
            });
        }

        let rows: Vec<Vec<f64>> = set.features.iter().map(|f| f.to_array().to_vec()).collect();
        let labels: Vec<bool> = set.labels.iter().map(|l| l.is_printable()).collect();
        let forest = RandomForest::fit(&rows, &labels, &self.config)?;

        let trained_at = chrono::Utc::now();
        let metadata = ArtifactMetadata {
            model_version: format!(
                "rf{}-s{}-{}",
                self.config.n_estimators,
                self.config.seed,
                trained_at.format("%Y%m%d%H%M%S")
            ),
            trained_at: trained_at.timestamp(),
            n_samples: set.len(),
            n_printable: set.n_printable(),
            dropped_records: set.dropped,
            config: self.config.clone(),
        };
        let feature_names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let artifact = ModelArtifact::new(forest, feature_names, metadata)
            .map_err(|e| TrainingError::InvalidConfig(e.to_string()))?;

        let summary = TrainingSummary {
            total_samples: set.len(),
            printable_samples: set.n_printable(),
            printable_share: set.n_printable() as f64 / set.len() as f64,
            dropped_records: set.dropped,
            feature_stats: set.feature_stats(),
        };
        let importances = artifact.feature_importances();

        info!(
            samples = summary.total_samples,
            printable = summary.printable_samples,
            dropped = summary.dropped_records,
            trees = artifact.forest().n_trees(),
            avg_depth = artifact.forest().avg_depth(),
            "Model trained"
        );

        Ok(TrainingOutcome {
            artifact,
            summary,
            importances,
        })
    }
}
