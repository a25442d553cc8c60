//! Logistic adapter: Implementation of `RiskModel` over a frozen artifact.
//!
//! The artifact is installed exactly once into an init-once cell and shared
//! read-only afterwards. Concurrent requests read it without locking; a
//! second install is rejected instead of silently swapping models under
//! in-flight requests.
//!
//! # Artifact format
//!
//! JSON exported by the training pipeline:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "model_version": "diabetes-logreg-2024.1",
//!   "feature_names": ["glucose", "hba1c", "bmi", "hypertension", "heart_disease"],
//!   "coefficients": [1.52, 1.08, 0.61, 0.27, 0.19],
//!   "intercept": -1.31,
//!   "scaler": { "mean": [...], "scale": [...] }
//! }
//! ```

use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::domain::{DomainError, FeatureVector, ModelArtifact, ModelVersion};
use crate::ports::RiskModel;
use crate::{GlycoriskError, Result};

/// Largest `f64` strictly below 1.0.
const MAX_INTERIOR_PROBABILITY: f64 = 1.0 - f64::EPSILON / 2.0;

/// Installed artifact plus values derived from it once at install time.
#[derive(Debug)]
struct LoadedModel {
    artifact: Arc<ModelArtifact>,
    fingerprint: String,
}

/// Logistic regression adapter.
#[derive(Debug, Default)]
pub struct LogisticAdapter {
    model: OnceLock<LoadedModel>,
}

impl LogisticAdapter {
    /// Create an empty adapter. Scoring fails until an artifact is installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter with the artifact already installed.
    ///
    /// # Errors
    /// Returns `Model` if the artifact is inconsistent.
    pub fn with_artifact(artifact: ModelArtifact) -> Result<Self> {
        let adapter = Self::new();
        adapter.install(artifact)?;
        Ok(adapter)
    }

    /// Install the artifact. Succeeds at most once per adapter.
    ///
    /// # Errors
    /// Returns `Model` if the artifact is inconsistent or an artifact is
    /// already installed.
    pub fn install(&self, artifact: ModelArtifact) -> Result<()> {
        artifact.validate()?;
        let fingerprint = artifact.fingerprint()?;
        let version = artifact.model_version.clone();
        let n_features = artifact.feature_names.len();
        let standardized = artifact.scaler.is_some();

        self.model
            .set(LoadedModel {
                artifact: Arc::new(artifact),
                fingerprint,
            })
            .map_err(|_| {
                GlycoriskError::Model("a model artifact is already installed".into())
            })?;

        tracing::info!(
            "Installed model {} (n_features={}, standardized={})",
            version,
            n_features,
            standardized
        );
        Ok(())
    }

    /// Read, validate and install a JSON artifact from disk.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, `Serialization` if it is not a
    /// valid artifact document, and `Model` if it is inconsistent or an
    /// artifact is already installed.
    pub fn load_model(&self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let artifact = ModelArtifact::from_json_str(&content)?;
        tracing::debug!("Read model artifact from {:?}", path);
        self.install(artifact)
    }

    /// Shared handle to the installed artifact.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed.
    pub fn artifact(&self) -> Result<Arc<ModelArtifact>> {
        self.loaded().map(|m| Arc::clone(&m.artifact))
    }

    fn loaded(&self) -> Result<&LoadedModel> {
        self.model.get().ok_or_else(|| {
            GlycoriskError::ModelNotLoaded(
                "install a model artifact before scoring".to_string(),
            )
        })
    }

    fn check_alignment(artifact: &ModelArtifact, features: &FeatureVector) -> Result<()> {
        if features.names() != artifact.feature_names.as_slice() {
            return Err(GlycoriskError::Configuration(format!(
                "feature vector [{}] does not match model features [{}]",
                features.names().join(", "),
                artifact.feature_names.join(", ")
            )));
        }
        Ok(())
    }
}

/// Logistic function, evaluated without overflow for large `|z|` and kept
/// strictly inside (0, 1).
fn sigmoid(z: f64) -> f64 {
    let p = if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    };
    p.clamp(f64::MIN_POSITIVE, MAX_INTERIOR_PROBABILITY)
}

impl RiskModel for LogisticAdapter {
    fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    fn feature_names(&self) -> Result<&[String]> {
        Ok(self.loaded()?.artifact.feature_names.as_slice())
    }

    fn coefficients(&self) -> Result<&[f64]> {
        Ok(self.loaded()?.artifact.coefficients.as_slice())
    }

    fn intercept(&self) -> Result<f64> {
        Ok(self.loaded()?.artifact.intercept)
    }

    fn version(&self) -> Result<ModelVersion> {
        let loaded = self.loaded()?;
        Ok(ModelVersion {
            version: loaded.artifact.model_version.clone(),
            fingerprint: loaded.fingerprint.clone(),
        })
    }

    fn model_values(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let artifact = &self.loaded()?.artifact;
        Self::check_alignment(artifact, features)?;
        Ok(artifact.to_model_space(features.values()))
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64> {
        let artifact = &self.loaded()?.artifact;
        Self::check_alignment(artifact, features)?;

        let z = artifact.linear_score(&artifact.to_model_space(features.values()));
        if !z.is_finite() {
            return Err(DomainError::NonFiniteScore(z).into());
        }

        let probability = sigmoid(z);
        tracing::debug!("Linear score {:.4} -> probability {:.4}", z, probability);
        Ok(probability)
    }
}
