//! Inference over a loaded model artifact
//!
//! [`PredictionService`] is built once per process from a persisted artifact
//! and then only read. Every request re-projects its features onto the
//! artifact's feature list, so a schema drift between training and serving
//! surfaces as an error instead of a silently misaligned input.

use super::remarks::RemarkEngine;
use super::{ModelInfo, Predictor};
use crate::artifact::{ArtifactStore, ModelArtifact};
use crate::error::{ArtifactError, PredictionError};
use crate::models::{FeatureVector, PredictionResult, PrintParameters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 5;

/// Raw classifier output for one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub verdict: bool,
    /// Probability of the printable class, in [0, 1]
    pub probability: f64,
}

/// Inference statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

/// Immutable prediction service bound to one model artifact
pub struct PredictionService {
    artifact: ModelArtifact,
    remarks: RemarkEngine,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl PredictionService {
    pub fn new(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self {
            artifact,
            remarks: RemarkEngine::new(),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    /// Load the artifact pair from a model directory
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let artifact = ArtifactStore::new(dir).load()?;
        info!(
            dir = %dir.display(),
            model_version = %artifact.model_version(),
            "Prediction service ready"
        );
        Self::new(artifact)
    }

    pub fn with_remark_engine(mut self, remarks: RemarkEngine) -> Self {
        self.remarks = remarks;
        self
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn feature_names(&self) -> &[String] {
        self.artifact.feature_names()
    }

    /// Order the vector's values by the persisted feature list
    pub fn project(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        self.feature_names()
            .iter()
            .map(|name| {
                features.get(name).ok_or_else(|| {
                    PredictionError::SchemaMismatch(format!(
                        "model expects feature '{name}' which the input schema does not provide"
                    ))
                })
            })
            .collect()
    }

    /// Classify a feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictionError> {
        let row = self.project(features)?;
        self.score(&row)
    }

    /// Classify named values; every persisted feature must be present
    pub fn predict_named(
        &self,
        values: &BTreeMap<String, f64>,
    ) -> Result<Prediction, PredictionError> {
        let row = self
            .feature_names()
            .iter()
            .map(|name| {
                values.get(name).copied().ok_or_else(|| {
                    PredictionError::InvalidInput(format!("missing required feature '{name}'"))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        self.score(&row)
    }

    /// Classify boundary inputs and attach a remark
    pub fn evaluate(&self, params: &PrintParameters) -> Result<PredictionResult, PredictionError> {
        let features = FeatureVector::from(*params);
        self.explain(&features)
    }

    /// Classify a feature vector and attach a remark
    pub fn explain(&self, features: &FeatureVector) -> Result<PredictionResult, PredictionError> {
        let prediction = self.predict(features)?;
        let remark = self
            .remarks
            .explain(prediction.verdict, prediction.probability, features);
        Ok(PredictionResult {
            verdict: prediction.verdict,
            probability: prediction.probability,
            remark: remark.message().to_string(),
        })
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }

    fn score(&self, row: &[f64]) -> Result<Prediction, PredictionError> {
        if let Some(idx) = row.iter().position(|v| !v.is_finite()) {
            return Err(PredictionError::InvalidInput(format!(
                "feature '{}' is not a finite number",
                self.feature_names()[idx]
            )));
        }

        let start = Instant::now();
        let forest = self.artifact.forest();
        let probability = forest.predict_proba(row);
        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::Internal(format!(
                "model produced probability {probability} outside [0, 1]"
            )));
        }

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(Prediction {
            verdict: probability > 0.5,
            probability,
        })
    }
}

impl Predictor for PredictionService {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictionError> {
        PredictionService::predict(self, features)
    }

    fn evaluate(&self, params: &PrintParameters) -> Result<PredictionResult, PredictionError> {
        PredictionService::evaluate(self, params)
    }

    fn model_version(&self) -> &str {
        self.artifact.model_version()
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_version: self.artifact.model_version().to_string(),
            trees: self.artifact.forest().n_trees(),
            training_samples: self.artifact.metadata().n_samples,
        }
    }

    fn stats(&self) -> InferenceStats {
        PredictionService::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FEATURE_NAMES;
    use crate::predictor::RemarkConfig;
    use crate::training::test_support::small_artifact;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn service() -> PredictionService {
        PredictionService::new(small_artifact()).unwrap()
    }

    fn params() -> PrintParameters {
        PrintParameters {
            silk_pct: 5.0,
            gelatin_pct: 15.0,
            crosslinker: true,
            needle_gauge: 22,
            layer_height_mm: 0.1,
            pressure_psi: 6.0,
            temp_c: 25.0,
        }
    }

    #[test]
    fn test_projection_uses_persisted_order() {
        let svc = service();
        let features = FeatureVector::from(params());
        let row = svc.project(&features).unwrap();
        assert_eq!(row, features.to_array().to_vec());
        assert_eq!(svc.feature_names(), FEATURE_NAMES);
    }

    #[test]
    fn test_probability_in_range_and_consistent_with_verdict() {
        let svc = service();
        let p = svc.predict(&FeatureVector::from(params())).unwrap();
        assert!((0.0..=1.0).contains(&p.probability));
        assert_eq!(p.verdict, p.probability > 0.5);
    }

    #[test]
    fn test_repeated_predictions_identical() {
        let svc = service();
        let features = FeatureVector::from(params());
        let first = svc.predict(&features).unwrap();
        for _ in 0..20 {
            assert_eq!(svc.predict(&features).unwrap(), first);
        }
        assert_eq!(svc.stats().total_inferences, 21);
    }

    #[test]
    fn test_predict_named_requires_every_feature() {
        let svc = service();
        let mut named = FeatureVector::from(params()).to_named();
        let expected = svc.predict(&FeatureVector::from(params())).unwrap();
        assert_eq!(svc.predict_named(&named).unwrap(), expected);

        named.remove("Temp_C");
        let err = svc.predict_named(&named).unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("Temp_C"));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let svc = service();
        let mut p = params();
        p.pressure_psi = f64::NAN;
        let err = svc.evaluate(&p).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidInput(_)));
    }

    #[test]
    fn test_evaluate_attaches_remark() {
        let svc = service();
        let mut p = params();
        p.pressure_psi = 1.0;
        let result = svc.evaluate(&p).unwrap();
        let expected = RemarkEngine::new().explain(
            result.verdict,
            result.probability,
            &FeatureVector::from(p),
        );
        assert_eq!(result.remark, expected.message());
    }

    #[test]
    fn test_load_from_store() {
        let temp = TempDir::new().unwrap();
        let artifact = small_artifact();
        ArtifactStore::new(temp.path()).save(&artifact).unwrap();

        let loaded = PredictionService::load(temp.path()).unwrap();
        let fresh = PredictionService::new(artifact).unwrap();
        let features = FeatureVector::from(params());
        assert_eq!(loaded.predict(&features).unwrap(), fresh.predict(&features).unwrap());
        assert_eq!(Predictor::model_version(&loaded), fresh.artifact().model_version());
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        assert!(PredictionService::load(&temp.path().join("absent")).is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let svc = Arc::new(service());
        let features = FeatureVector::from(params());
        let expected = svc.predict(&features).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let svc = Arc::clone(&svc);
                std::thread::spawn(move || svc.predict(&features).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_trait_object() {
        let predictor: Arc<dyn Predictor> = Arc::new(service());
        let p = predictor.predict(&FeatureVector::from(params())).unwrap();
        assert!((0.0..=1.0).contains(&p.probability));
        assert!(predictor.model_version().starts_with("rf100-s42-"));

        let result = predictor.evaluate(&params()).unwrap();
        assert_eq!(result.probability, p.probability);
        assert_eq!(predictor.stats().total_inferences, 2);

        let info = predictor.model_info();
        assert_eq!(info.model_version, predictor.model_version());
        assert_eq!(info.trees, 100);
        assert_eq!(info.training_samples, 40);
    }

    #[test]
    fn test_custom_remark_engine_changes_remark_only() {
        let default_svc = service();
        let strict = service().with_remark_engine(RemarkEngine::with_config(RemarkConfig {
            min_extrusion_psi: 20.0,
            ..RemarkConfig::default()
        }));

        // Under-pressured for the training data but above the default 3 psi floor
        let mut p = params();
        p.pressure_psi = 3.2;
        let baseline = default_svc.evaluate(&p).unwrap();
        let adjusted = strict.evaluate(&p).unwrap();
        assert_eq!(adjusted.verdict, baseline.verdict);
        assert_eq!(adjusted.probability, baseline.probability);
        assert!(!adjusted.verdict);
        assert_eq!(baseline.remark, "Formulation lacks required cohesion.");
        assert_eq!(adjusted.remark, "Pressure too low for proper extrusion.");
    }
}
