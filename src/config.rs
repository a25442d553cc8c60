//! Screening policy: schema, tier thresholds and rule tables.
//!
//! These are clinical-policy decisions, so they are data rather than code.
//! `ScreeningConfig::default()` is the diabetes screening policy; a JSON file
//! with the same shape overrides it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::recommend::{
    default_findings, default_rules, FindingRule, RecommendationRule, StatusTable, SuggestedTests,
};
use crate::domain::{FeatureSchema, RiskThresholds};
use crate::{GlycoriskError, Result};

fn default_top_factors() -> usize {
    3
}

/// Complete screening policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    #[serde(default)]
    pub schema: FeatureSchema,

    #[serde(default)]
    pub thresholds: RiskThresholds,

    /// Number of ranked factors reported in a bundle
    #[serde(default = "default_top_factors")]
    pub top_factors: usize,

    #[serde(default = "default_rules")]
    pub recommendations: Vec<RecommendationRule>,

    #[serde(default = "default_findings")]
    pub findings: Vec<FindingRule>,

    /// Per-parameter reference ranges
    #[serde(default)]
    pub parameter_status: StatusTable,

    #[serde(default)]
    pub suggested_tests: SuggestedTests,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            schema: FeatureSchema::diabetes(),
            thresholds: RiskThresholds::default(),
            top_factors: default_top_factors(),
            recommendations: default_rules(),
            findings: default_findings(),
            parameter_status: StatusTable::default(),
            suggested_tests: SuggestedTests::default(),
        }
    }
}

impl ScreeningConfig {
    /// Parse a policy from JSON; omitted sections keep their defaults.
    ///
    /// # Errors
    /// Returns `Serialization` for malformed JSON (including an invalid
    /// schema) and `Configuration` for an inconsistent policy.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`ScreeningConfig::from_json_str`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        tracing::info!("Loaded screening policy from {:?}", path);
        Ok(config)
    }

    /// Check cross-references the individual types cannot check alone.
    ///
    /// # Errors
    /// Returns `GlycoriskError::Configuration` for invalid thresholds, a zero
    /// top-k, or a rule naming a feature the schema does not declare.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        if self.top_factors == 0 {
            return Err(GlycoriskError::Configuration(
                "top_factors must be at least 1".into(),
            ));
        }

        let referenced = self
            .recommendations
            .iter()
            .flat_map(|r| r.requires.iter())
            .chain(self.findings.iter().map(|f| &f.feature))
            .chain(self.parameter_status.rules.iter().map(|r| &r.feature));
        for feature in referenced {
            if !self.schema.contains(feature) {
                return Err(GlycoriskError::Configuration(format!(
                    "rule references unknown feature '{feature}'"
                )));
            }
        }

        Ok(())
    }
}
