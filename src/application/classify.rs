//! Risk classifier: Maps a probability onto an ordinal tier.

use crate::domain::{DomainError, RiskThresholds, RiskTier};

/// Threshold-based tier assignment.
///
/// Tiers are half-open on the right except the top one, so every probability
/// in `[0, 1]` lands in exactly one tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier {
    thresholds: RiskThresholds,
}

impl RiskClassifier {
    #[must_use]
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> RiskThresholds {
        self.thresholds
    }

    /// # Errors
    /// Returns `DomainError::ProbabilityOutOfRange` for values outside
    /// `[0, 1]`, including NaN.
    pub fn classify(&self, probability: f64) -> Result<RiskTier, DomainError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(DomainError::ProbabilityOutOfRange(probability));
        }

        let tier = if probability < self.thresholds.moderate() {
            RiskTier::Low
        } else if probability < self.thresholds.high() {
            RiskTier::Moderate
        } else {
            RiskTier::High
        };
        Ok(tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boundaries() {
        let c = RiskClassifier::default();
        assert_eq!(c.classify(0.0), Ok(RiskTier::Low));
        assert_eq!(c.classify(0.182), Ok(RiskTier::Low));
        assert_eq!(c.classify(0.329_999), Ok(RiskTier::Low));
        assert_eq!(c.classify(0.33), Ok(RiskTier::Moderate));
        assert_eq!(c.classify(0.659_999), Ok(RiskTier::Moderate));
        assert_eq!(c.classify(0.66), Ok(RiskTier::High));
        assert_eq!(c.classify(1.0), Ok(RiskTier::High));
    }

    #[test]
    fn test_out_of_range() {
        let c = RiskClassifier::default();
        assert_eq!(
            c.classify(1.000_001),
            Err(DomainError::ProbabilityOutOfRange(1.000_001))
        );
        assert!(c.classify(-0.1).is_err());
        assert!(c.classify(f64::NAN).is_err());
    }

    #[test]
    fn test_screening_thresholds() {
        let c = RiskClassifier::new(RiskThresholds::screening());
        assert_eq!(c.classify(0.19), Ok(RiskTier::Low));
        assert_eq!(c.classify(0.2), Ok(RiskTier::Moderate));
        assert_eq!(c.classify(0.5), Ok(RiskTier::High));
    }
}
