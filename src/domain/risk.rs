//! Risk tiers and prediction results.

use serde::{Deserialize, Serialize};

use crate::GlycoriskError;

/// Ordinal diabetes risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    /// Low risk of diabetes
    Low,
    /// Moderate risk, monitoring recommended
    Moderate,
    /// High risk, confirmatory testing recommended
    High,
}

impl RiskTier {
    /// Every tier, lowest first.
    pub const ALL: [RiskTier; 3] = [Self::Low, Self::Moderate, Self::High];

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Confirmatory testing advised",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Internal invariant violations.
///
/// These indicate a defect in the model adapter or configuration and are
/// never clamped away.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("probability {0} outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("linear score {0} is not finite")]
    NonFiniteScore(f64),
}

/// Lower bounds of the MODERATE and HIGH tiers.
///
/// `[0, moderate) → LOW`, `[moderate, high) → MODERATE`, `[high, 1] → HIGH`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    moderate: f64,
    high: f64,
}

impl RiskThresholds {
    /// # Errors
    /// Returns `GlycoriskError::Configuration` unless `0 < moderate < high <= 1`.
    pub fn new(moderate: f64, high: f64) -> Result<Self, GlycoriskError> {
        let thresholds = Self { moderate, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Cut points used by the clinic screening report (20% and 50%).
    #[must_use]
    pub fn screening() -> Self {
        Self {
            moderate: 0.20,
            high: 0.50,
        }
    }

    /// # Errors
    /// Returns `GlycoriskError::Configuration` unless `0 < moderate < high <= 1`.
    pub fn validate(&self) -> Result<(), GlycoriskError> {
        let ordered = 0.0 < self.moderate && self.moderate < self.high && self.high <= 1.0;
        if !ordered {
            return Err(GlycoriskError::Configuration(format!(
                "risk thresholds must satisfy 0 < moderate < high <= 1, got moderate={} high={}",
                self.moderate, self.high
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn moderate(&self) -> f64 {
        self.moderate
    }

    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.33,
            high: 0.66,
        }
    }
}

/// Result of the model prediction (before explanation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted probability of diabetes, strictly inside (0, 1)
    pub probability: f64,

    /// Binary prediction (0 = negative, 1 = positive at p >= 0.5)
    pub prediction: u8,

    /// Probability of the predicted class
    pub confidence: f64,

    pub tier: RiskTier,
}

impl PredictionResult {
    #[must_use]
    pub fn new(probability: f64, tier: RiskTier) -> Self {
        let prediction = u8::from(probability >= 0.5);
        let confidence = if probability >= 0.5 {
            probability
        } else {
            1.0 - probability
        };

        Self {
            probability,
            prediction,
            confidence,
            tier,
        }
    }
}
