//! Risk model port: Trait for scoring a validated feature vector.
//!
//! This trait abstracts the frozen classifier from the explanation and
//! recommendation logic.

use crate::domain::{FeatureVector, ModelVersion};
use crate::Result;

/// Trait for a loaded linear risk model.
///
/// Implementations provide:
/// - Probability scoring through the logistic link
/// - Read-only views of the coefficients and intercept
/// - The model-space encoding the coefficients apply to
///
/// Every method fails with `GlycoriskError::ModelNotLoaded` until the
/// artifact has been installed.
pub trait RiskModel: Send + Sync {
    /// Whether an artifact is installed.
    fn is_loaded(&self) -> bool;

    /// Feature names in coefficient order.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed.
    fn feature_names(&self) -> Result<&[String]>;

    /// Coefficients aligned to `feature_names`.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed.
    fn coefficients(&self) -> Result<&[f64]>;

    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed.
    fn intercept(&self) -> Result<f64>;

    /// Version and fingerprint of the installed artifact.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed.
    fn version(&self) -> Result<ModelVersion>;

    /// Values the coefficients multiply, one per feature.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed, or
    /// `Configuration` if the vector's features are not the model's.
    fn model_values(&self, features: &FeatureVector) -> Result<Vec<f64>>;

    /// Probability of a positive outcome, strictly inside (0, 1).
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed,
    /// `Configuration` on a feature mismatch, or `Domain` if the linear
    /// score is not finite.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64>;
}
