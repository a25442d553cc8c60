//! Per-feature explanation records.

use serde::{Deserialize, Serialize};

/// Contribution scores closer than this are treated as tied.
pub const CONTRIBUTION_EPSILON: f64 = 1e-9;

/// Which way a feature pulls this patient's linear score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    RiskIncreasing,
    Protective,
    Neutral,
}

/// Model-wide odds ratio of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRatio {
    pub feature: String,
    pub coefficient: f64,
    /// `exp(coefficient)`: multiplicative change in odds per unit increase of
    /// the model-space value. With a standardized artifact that unit is one
    /// scaler `scale` (standard deviation) of the raw input.
    pub odds_ratio: f64,
}

impl OddsRatio {
    #[must_use]
    pub fn new(feature: impl Into<String>, coefficient: f64) -> Self {
        Self {
            feature: feature.into(),
            coefficient,
            odds_ratio: coefficient.exp(),
        }
    }

    /// Raises the odds of a positive outcome.
    #[must_use]
    pub fn is_risk_factor(&self) -> bool {
        self.odds_ratio > 1.0
    }
}

/// How much one feature drove one patient's prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    /// Model-space value the coefficient multiplied
    pub value: f64,
    pub coefficient: f64,
    pub odds_ratio: f64,
    /// Signed `coefficient * value`
    pub contribution: f64,
    pub direction: Direction,
}

impl FeatureContribution {
    #[must_use]
    pub fn new(feature: impl Into<String>, value: f64, coefficient: f64) -> Self {
        let contribution = coefficient * value;
        let direction = if contribution > CONTRIBUTION_EPSILON {
            Direction::RiskIncreasing
        } else if contribution < -CONTRIBUTION_EPSILON {
            Direction::Protective
        } else {
            Direction::Neutral
        };

        Self {
            feature: feature.into(),
            value,
            coefficient,
            odds_ratio: coefficient.exp(),
            contribution,
            direction,
        }
    }

    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.contribution.abs()
    }

    /// Pushes this patient's risk up.
    #[must_use]
    pub fn is_driving(&self) -> bool {
        self.direction == Direction::RiskIncreasing
    }
}
