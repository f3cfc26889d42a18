//! Error types for training, artifact handling and inference

use std::path::PathBuf;

/// Errors surfaced by a prediction request.
///
/// `InvalidInput` is the caller's fault and safe to show to a user.
/// The other variants mean the service itself is misconfigured or broken.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// Boundary input failed validation (non-numeric, out of range, missing field)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Feature vector cannot be projected onto the persisted feature list
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Unexpected failure while scoring
    #[error("Prediction failed: {0}")]
    Internal(String),
}

impl PredictionError {
    /// True when the caller supplied bad data rather than the service failing
    pub fn is_user_error(&self) -> bool {
        matches!(self, PredictionError::InvalidInput(_))
    }
}

/// Errors loading or saving a model artifact. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to access artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Model and feature list disagree, or the list is not the canonical schema
    #[error("Artifact schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Unsupported artifact format version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Errors raised while preparing data or fitting the classifier
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("No usable training records ({dropped} dropped during extraction)")]
    EmptyDataset { dropped: usize },

    #[error("Feature and label counts differ: {features} features, {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read dataset {path:?}: {source}")]
    Dataset {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Invalid entry in the parameter range registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("{key}: range values must be finite")]
    NonFinite { key: &'static str },

    #[error("{key}: min {min} exceeds max {max}")]
    Inverted {
        key: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{key}: default {default} outside [{min}, {max}]")]
    DefaultOutOfRange {
        key: &'static str,
        default: f64,
        min: f64,
        max: f64,
    },

    #[error("{key}: step must be positive")]
    NonPositiveStep { key: &'static str },
}
