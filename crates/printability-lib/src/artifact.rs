//! Model artifact persistence
//!
//! A trained model is persisted as a matched pair: `model.json` (the forest
//! plus the feature names it was fitted on) and `features.json` (the ordered
//! feature list inference projects onto). `manifest.json` records SHA256
//! checksums of both so a partial or tampered write is caught at load time.
//! `feature_importance.json` is diagnostic only and never read by inference.

use crate::error::ArtifactError;
use crate::models::FEATURE_NAMES;
use crate::training::{FeatureImportance, ForestConfig, RandomForest};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk format version understood by this build
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

pub const MODEL_FILE: &str = "model.json";
pub const FEATURES_FILE: &str = "features.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const IMPORTANCE_FILE: &str = "feature_importance.json";

/// Provenance recorded alongside the fitted forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_version: String,
    pub trained_at: i64,
    pub n_samples: usize,
    pub n_printable: usize,
    pub dropped_records: usize,
    pub config: ForestConfig,
}

/// Trained classifier bound to its feature schema. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    metadata: ArtifactMetadata,
    feature_names: Vec<String>,
    forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(
        forest: RandomForest,
        feature_names: Vec<String>,
        metadata: ArtifactMetadata,
    ) -> Result<Self, ArtifactError> {
        let artifact = Self {
            metadata,
            feature_names,
            forest,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// The forest must be well formed and fitted on exactly the canonical schema
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.forest
            .validate()
            .map_err(|e| ArtifactError::SchemaMismatch(format!("invalid forest: {e}")))?;
        if self.forest.n_features() != self.feature_names.len() {
            return Err(ArtifactError::SchemaMismatch(format!(
                "forest expects {} features but {} names are recorded",
                self.forest.n_features(),
                self.feature_names.len()
            )));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ArtifactError::SchemaMismatch(format!(
                "feature list {:?} does not match schema {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        Ok(())
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn model_version(&self) -> &str {
        &self.metadata.model_version
    }

    /// Importance ranking, most important first
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        FeatureImportance::ranked(&self.feature_names, self.forest.feature_importances())
    }
}

/// Checksums written after both artifact files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    pub model_version: String,
    pub model_sha256: String,
    pub features_sha256: String,
    pub created_at: String,
}

/// Reads and writes artifacts under a model directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when a manifest exists, i.e. a complete save has happened
    pub fn exists(&self) -> bool {
        self.dir.join(MANIFEST_FILE).is_file()
    }

    /// Persist the model/feature pair, the diagnostic ranking, then the manifest
    pub fn save(&self, artifact: &ModelArtifact) -> Result<ArtifactManifest, ArtifactError> {
        artifact.validate()?;
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let model_bytes = to_json_bytes(artifact, &self.dir.join(MODEL_FILE))?;
        let features_bytes = to_json_bytes(&artifact.feature_names, &self.dir.join(FEATURES_FILE))?;
        let importance_bytes =
            to_json_bytes(&artifact.feature_importances(), &self.dir.join(IMPORTANCE_FILE))?;

        self.write(MODEL_FILE, &model_bytes)?;
        self.write(FEATURES_FILE, &features_bytes)?;
        self.write(IMPORTANCE_FILE, &importance_bytes)?;

        let manifest = ArtifactManifest {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_version: artifact.model_version().to_string(),
            model_sha256: compute_checksum(&model_bytes),
            features_sha256: compute_checksum(&features_bytes),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let manifest_bytes = to_json_bytes(&manifest, &self.dir.join(MANIFEST_FILE))?;
        self.write(MANIFEST_FILE, &manifest_bytes)?;

        info!(
            dir = %self.dir.display(),
            model_version = %manifest.model_version,
            "Saved model artifact"
        );
        Ok(manifest)
    }

    /// Load and verify the model/feature pair. Any failure is fatal for serving.
    pub fn load(&self) -> Result<ModelArtifact, ArtifactError> {
        let manifest: ArtifactManifest = self.read_json(MANIFEST_FILE)?;
        if manifest.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: manifest.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        let model_bytes = self.read_verified(MODEL_FILE, &manifest.model_sha256)?;
        let features_bytes = self.read_verified(FEATURES_FILE, &manifest.features_sha256)?;

        let artifact: ModelArtifact = parse_json(&model_bytes, &self.dir.join(MODEL_FILE))?;
        let features: Vec<String> = parse_json(&features_bytes, &self.dir.join(FEATURES_FILE))?;

        if features != artifact.feature_names {
            return Err(ArtifactError::SchemaMismatch(format!(
                "{FEATURES_FILE} lists {:?} but the model was trained on {:?}",
                features, artifact.feature_names
            )));
        }
        artifact.validate()?;

        debug!(
            model_version = %artifact.model_version(),
            trees = artifact.forest.n_trees(),
            "Loaded model artifact"
        );
        Ok(artifact)
    }

    pub fn load_manifest(&self) -> Result<ArtifactManifest, ArtifactError> {
        self.read_json(MANIFEST_FILE)
    }

    /// Diagnostic importance ranking written at training time
    pub fn load_importances(&self) -> Result<Vec<FeatureImportance>, ArtifactError> {
        self.read_json(IMPORTANCE_FILE)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let path = self.dir.join(name);
        fs::write(&path, bytes).map_err(|source| ArtifactError::Io { path, source })
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.dir.join(name);
        fs::read(&path).map_err(|source| ArtifactError::Io { path, source })
    }

    fn read_verified(&self, name: &str, expected: &str) -> Result<Vec<u8>, ArtifactError> {
        let bytes = self.read(name)?;
        let actual = compute_checksum(&bytes);
        if actual != expected {
            return Err(ArtifactError::ChecksumMismatch {
                path: self.dir.join(name),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(bytes)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArtifactError> {
        let bytes = self.read(name)?;
        parse_json(&bytes, &self.dir.join(name))
    }
}

fn to_json_bytes<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<Vec<u8>, ArtifactError> {
    serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8], path: &Path) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
