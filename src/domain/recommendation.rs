//! Final output of the screening pipeline.

use serde::{Deserialize, Serialize};

use super::{FeatureContribution, ModelVersion, OddsRatio, PredictionResult, RiskTier};

/// A clinically notable value in the patient's own input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFinding {
    pub feature: String,
    pub label: String,
    /// Encoded input value that triggered the finding
    pub value: f64,
    /// Model-wide odds ratio, per model-space unit (see [`OddsRatio`])
    pub odds_ratio: f64,
}

/// Rating of one input parameter against clinical reference ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStatus {
    pub feature: String,
    pub value: f64,
    pub status: String,
    pub flagged: bool,
}

/// Everything the presentation layer needs to render one screening.
///
/// Contains no timestamps or identifiers, so identical input always yields
/// an identical bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub probability: f64,
    pub prediction: u8,
    pub confidence: f64,
    pub tier: RiskTier,

    /// Features ranked by absolute contribution, bounded by the configured top-k
    pub top_factors: Vec<FeatureContribution>,

    pub guidance: String,
    pub clinical_findings: Vec<ClinicalFinding>,

    /// Every feature rated in schema order, whatever its odds ratio
    pub parameter_status: Vec<ParameterStatus>,

    pub suggested_tests: Vec<String>,

    /// Model-wide odds ratios in schema order
    pub odds_ratios: Vec<OddsRatio>,

    pub model: ModelVersion,
}

impl RecommendationBundle {
    #[must_use]
    pub fn prediction_result(&self) -> PredictionResult {
        PredictionResult {
            probability: self.probability,
            prediction: self.prediction,
            confidence: self.confidence,
            tier: self.tier,
        }
    }

    /// Names of the ranked factors, most influential first.
    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.top_factors.iter().map(|f| f.feature.as_str())
    }
}
