//! Odds-ratio engine: Explains a prediction feature by feature.
//!
//! Two views of the same coefficients:
//! - the model-wide odds ratio `exp(coefficient)`, identical for every patient
//! - the per-patient contribution `coefficient * value`, which ranks the
//!   factors that drove this particular prediction

use crate::domain::{FeatureContribution, FeatureVector, OddsRatio, CONTRIBUTION_EPSILON};
use crate::ports::RiskModel;
use crate::Result;

/// Stateless explanation over any [`RiskModel`].
pub struct OddsRatioEngine;

impl OddsRatioEngine {
    /// Per-feature contributions for one patient, ranked by absolute
    /// contribution (largest first).
    ///
    /// Contributions within [`CONTRIBUTION_EPSILON`] of each other keep schema
    /// declaration order.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` or `Configuration` from the model.
    pub fn explain<M>(model: &M, features: &FeatureVector) -> Result<Vec<FeatureContribution>>
    where
        M: RiskModel + ?Sized,
    {
        let values = model.model_values(features)?;
        let contributions = features
            .names()
            .iter()
            .zip(values)
            .zip(model.coefficients()?)
            .map(|((name, value), coefficient)| {
                FeatureContribution::new(name.clone(), value, *coefficient)
            })
            .collect();

        Ok(rank_by_magnitude(contributions))
    }

    /// Model-wide odds ratios in schema order.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed.
    pub fn odds_ratio_table<M>(model: &M) -> Result<Vec<OddsRatio>>
    where
        M: RiskModel + ?Sized,
    {
        Ok(model
            .feature_names()?
            .iter()
            .zip(model.coefficients()?)
            .map(|(name, coefficient)| OddsRatio::new(name.clone(), *coefficient))
            .collect())
    }

    /// Features whose odds ratio exceeds 1.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` before the artifact is installed.
    pub fn risk_factors<M>(model: &M) -> Result<Vec<OddsRatio>>
    where
        M: RiskModel + ?Sized,
    {
        let mut table = Self::odds_ratio_table(model)?;
        table.retain(OddsRatio::is_risk_factor);
        Ok(table)
    }
}

/// Stable insertion by descending magnitude.
///
/// Each item goes before the first ranked item it beats by more than the
/// epsilon, so near-ties keep their input (schema) order.
fn rank_by_magnitude(contributions: Vec<FeatureContribution>) -> Vec<FeatureContribution> {
    let mut ranked: Vec<FeatureContribution> = Vec::with_capacity(contributions.len());
    for item in contributions {
        let magnitude = item.magnitude();
        let position = ranked
            .iter()
            .position(|r| magnitude > r.magnitude() + CONTRIBUTION_EPSILON)
            .unwrap_or(ranked.len());
        ranked.insert(position, item);
    }
    ranked
}
