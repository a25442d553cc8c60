//! Frozen logistic model artifact.
//!
//! Produced offline by the training pipeline and consumed read-only here.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::GlycoriskError;

/// Artifact layout version understood by this crate.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Standard scaler fitted alongside the model.
///
/// Model-space value for feature `i` is `(x_i - mean_i) / scale_i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Trained logistic regression parameters.
///
/// `coefficients[i]` is the weight of `feature_names[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_version: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
}

/// Identity of the artifact a result was computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub version: String,
    pub fingerprint: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl ModelArtifact {
    /// Create an artifact without standardization.
    #[must_use]
    pub fn new(
        model_version: impl Into<String>,
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_version: model_version.into(),
            feature_names,
            coefficients,
            intercept,
            scaler: None,
        }
    }

    #[must_use]
    pub fn with_scaler(mut self, mean: Vec<f64>, scale: Vec<f64>) -> Self {
        self.scaler = Some(StandardScaler { mean, scale });
        self
    }

    /// Parse an artifact from its JSON export.
    ///
    /// # Errors
    /// Returns `Serialization` for malformed JSON and `Model` for an
    /// inconsistent artifact.
    pub fn from_json_str(json: &str) -> Result<Self, GlycoriskError> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check the artifact is internally consistent.
    ///
    /// # Errors
    /// Returns `GlycoriskError::Model` describing the first inconsistency.
    pub fn validate(&self) -> Result<(), GlycoriskError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(GlycoriskError::Model(format!(
                "unsupported artifact format version {} (expected {ARTIFACT_FORMAT_VERSION})",
                self.format_version
            )));
        }

        let n = self.feature_names.len();
        if n == 0 {
            return Err(GlycoriskError::Model("artifact declares no features".into()));
        }
        if self.coefficients.len() != n {
            return Err(GlycoriskError::Model(format!(
                "coefficient count {} does not match feature count {n}",
                self.coefficients.len()
            )));
        }
        if let Some(i) = self.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(GlycoriskError::Model(format!(
                "coefficient for '{}' is not finite",
                self.feature_names[i]
            )));
        }
        if !self.intercept.is_finite() {
            return Err(GlycoriskError::Model("intercept is not finite".into()));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(GlycoriskError::Model(
                    "scaler parameter lengths do not match feature count".into(),
                ));
            }
            for (i, (mean, scale)) in scaler.mean.iter().zip(&scaler.scale).enumerate() {
                if !mean.is_finite() || !scale.is_finite() || *scale <= 0.0 {
                    return Err(GlycoriskError::Model(format!(
                        "scaler for '{}' must have a finite mean and a positive scale",
                        self.feature_names[i]
                    )));
                }
            }
        }

        Ok(())
    }

    /// SHA-256 of the artifact's canonical JSON encoding.
    ///
    /// # Errors
    /// Returns `Serialization` if the artifact cannot be encoded.
    pub fn fingerprint(&self) -> Result<String, GlycoriskError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(sha256_hex(&bytes))
    }

    /// Map encoded feature values into the space the coefficients were fit in.
    #[must_use]
    pub fn to_model_space(&self, values: &[f64]) -> Vec<f64> {
        match &self.scaler {
            Some(scaler) => values
                .iter()
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|(x, (mean, scale))| (x - mean) / scale)
                .collect(),
            None => values.to_vec(),
        }
    }

    /// Intercept plus the weighted sum of model-space values.
    #[must_use]
    pub fn linear_score(&self, model_values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(model_values)
            .fold(self.intercept, |acc, (c, x)| acc + c * x)
    }
}
