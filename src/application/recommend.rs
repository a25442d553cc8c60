//! Recommendation engine: Rule tables from (tier, factors) to guidance.
//!
//! All tables are ordered lists evaluated first-match, so the active policy
//! can be read top to bottom and each rule tested on its own.

use serde::{Deserialize, Serialize};

use crate::domain::{
    ClinicalFinding, FeatureContribution, FeatureVector, OddsRatio, ParameterStatus, RiskTier,
};
use crate::GlycoriskError;

/// One row of the guidance table.
///
/// Matches when the tier is equal and every feature in `requires` appears
/// among the top factors with a risk-increasing contribution. An empty
/// `requires` is the tier's catch-all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub tier: RiskTier,
    #[serde(default)]
    pub requires: Vec<String>,
    pub guidance: String,
}

impl RecommendationRule {
    #[must_use]
    pub fn new(tier: RiskTier, requires: &[&str], guidance: impl Into<String>) -> Self {
        Self {
            tier,
            requires: requires.iter().map(|s| (*s).to_string()).collect(),
            guidance: guidance.into(),
        }
    }

    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.requires.is_empty()
    }

    #[must_use]
    pub fn matches(&self, tier: RiskTier, top_factors: &[FeatureContribution]) -> bool {
        self.tier == tier
            && self.requires.iter().all(|required| {
                top_factors
                    .iter()
                    .any(|f| f.feature == *required && f.is_driving())
            })
    }
}

/// Comparison applied by a [`FindingRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    AtLeast,
    Equals,
}

impl Comparison {
    fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Above => value > threshold,
            Self::AtLeast => value >= threshold,
            Self::Equals => value == threshold,
        }
    }
}

/// Flags a notable input value, e.g. HbA1c in the diabetic range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingRule {
    pub feature: String,
    pub comparison: Comparison,
    pub threshold: f64,
    pub label: String,
}

impl FindingRule {
    #[must_use]
    pub fn new(
        feature: impl Into<String>,
        comparison: Comparison,
        threshold: f64,
        label: impl Into<String>,
    ) -> Self {
        Self {
            feature: feature.into(),
            comparison,
            threshold,
            label: label.into(),
        }
    }
}

/// One row of the parameter status table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRule {
    pub feature: String,
    pub comparison: Comparison,
    pub threshold: f64,
    pub status: String,
    /// Whether the status needs attention
    #[serde(default)]
    pub flagged: bool,
}

impl StatusRule {
    #[must_use]
    pub fn new(
        feature: impl Into<String>,
        comparison: Comparison,
        threshold: f64,
        status: impl Into<String>,
        flagged: bool,
    ) -> Self {
        Self {
            feature: feature.into(),
            comparison,
            threshold,
            status: status.into(),
            flagged,
        }
    }
}

fn default_unmatched_status() -> String {
    "Normal".to_string()
}

/// Rates every feature, independent of the model.
///
/// Rules are evaluated first-match per feature; a feature no rule matches
/// gets `unmatched` (unflagged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTable {
    pub rules: Vec<StatusRule>,
    #[serde(default = "default_unmatched_status")]
    pub unmatched: String,
}

impl StatusTable {
    /// Status of one encoded value.
    #[must_use]
    pub fn rate(&self, feature: &str, value: f64) -> ParameterStatus {
        let (status, flagged) = self
            .rules
            .iter()
            .find(|rule| rule.feature == feature && rule.comparison.holds(value, rule.threshold))
            .map_or((self.unmatched.as_str(), false), |rule| {
                (rule.status.as_str(), rule.flagged)
            });

        ParameterStatus {
            feature: feature.to_string(),
            value,
            status: status.to_string(),
            flagged,
        }
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self {
            rules: vec![
                StatusRule::new("glucose", Comparison::Above, 125.0, "Elevated", true),
                StatusRule::new("hba1c", Comparison::AtLeast, 6.5, "Elevated", true),
                StatusRule::new("hba1c", Comparison::AtLeast, 5.7, "Prediabetes", true),
                StatusRule::new("bmi", Comparison::Above, 30.0, "Elevated", true),
                StatusRule::new("bmi", Comparison::Above, 25.0, "Overweight", true),
                StatusRule::new("hypertension", Comparison::Equals, 1.0, "Present", true),
                StatusRule::new("hypertension", Comparison::Equals, 0.0, "Absent", false),
                StatusRule::new("heart_disease", Comparison::Equals, 1.0, "Present", true),
                StatusRule::new("heart_disease", Comparison::Equals, 0.0, "Absent", false),
            ],
            unmatched: default_unmatched_status(),
        }
    }
}

/// Follow-up tests suggested for each tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTests {
    pub low: Vec<String>,
    pub moderate: Vec<String>,
    pub high: Vec<String>,
}

impl SuggestedTests {
    #[must_use]
    pub fn for_tier(&self, tier: RiskTier) -> &[String] {
        match tier {
            RiskTier::Low => &self.low,
            RiskTier::Moderate => &self.moderate,
            RiskTier::High => &self.high,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SuggestedTests {
    fn default() -> Self {
        Self {
            low: strings(&[
                "Routine annual blood glucose",
                "Weight and blood pressure check",
            ]),
            moderate: strings(&[
                "Fasting plasma glucose every 3-6 months",
                "HbA1c every 6 months",
                "Lipid panel",
            ]),
            high: strings(&[
                "Fasting plasma glucose",
                "Oral glucose tolerance test",
                "Full lipid panel",
                "Renal function (creatinine, urea)",
                "Dilated eye exam",
            ]),
        }
    }
}

/// Default guidance table for the diabetes schema.
#[must_use]
pub fn default_rules() -> Vec<RecommendationRule> {
    vec![
        RecommendationRule::new(
            RiskTier::High,
            &["glucose", "bmi"],
            "High risk driven by glucose and BMI: order confirmatory testing (fasting plasma glucose, oral glucose tolerance test) and refer for dietary counselling.",
        ),
        RecommendationRule::new(
            RiskTier::High,
            &["hba1c"],
            "High risk with HbA1c as a leading factor: confirm with a repeat HbA1c or fasting glucose and consider referral to endocrinology.",
        ),
        RecommendationRule::new(
            RiskTier::High,
            &["glucose"],
            "High risk driven by glucose: order confirmatory testing (fasting plasma glucose, oral glucose tolerance test) and consider referral to endocrinology.",
        ),
        RecommendationRule::new(
            RiskTier::High,
            &[],
            "Immediate action: request confirmatory tests (fasting glucose, oral glucose tolerance test) and consider referral to endocrinology.",
        ),
        RecommendationRule::new(
            RiskTier::Moderate,
            &["bmi"],
            "Moderate risk with BMI as a leading factor: start a structured weight-management and lifestyle programme and review in 3-6 months.",
        ),
        RecommendationRule::new(
            RiskTier::Moderate,
            &["hypertension"],
            "Moderate risk with hypertension as a leading factor: optimise blood pressure control and recheck glucose every 3-6 months.",
        ),
        RecommendationRule::new(
            RiskTier::Moderate,
            &[],
            "Active monitoring: periodic review every 3-6 months and a lifestyle modification programme (diet, exercise).",
        ),
        RecommendationRule::new(
            RiskTier::Low,
            &["glucose"],
            "Low overall risk, but glucose is the leading factor: repeat fasting glucose at the next annual check.",
        ),
        RecommendationRule::new(
            RiskTier::Low,
            &[],
            "Prevention: keep routine annual check-ups and continue healthy habits.",
        ),
    ]
}

/// Default findings for the diabetes schema. Order matters per feature:
/// the diabetic HbA1c range is checked before the prediabetic one.
#[must_use]
pub fn default_findings() -> Vec<FindingRule> {
    vec![
        FindingRule::new("glucose", Comparison::Above, 100.0, "Elevated glucose"),
        FindingRule::new(
            "hba1c",
            Comparison::AtLeast,
            6.5,
            "HbA1c in the diabetic range (ADA criteria)",
        ),
        FindingRule::new(
            "hba1c",
            Comparison::AtLeast,
            5.7,
            "HbA1c in the prediabetic range",
        ),
        FindingRule::new("bmi", Comparison::Above, 25.0, "Elevated BMI (overweight or obesity)"),
        FindingRule::new("hypertension", Comparison::Equals, 1.0, "Hypertension present"),
        FindingRule::new(
            "heart_disease",
            Comparison::Equals,
            1.0,
            "Cardiovascular disease present",
        ),
    ]
}

/// Validated rule tables.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    rules: Vec<RecommendationRule>,
    findings: Vec<FindingRule>,
    status: StatusTable,
    suggested_tests: SuggestedTests,
}

impl RecommendationEngine {
    /// # Errors
    /// Returns `GlycoriskError::Configuration` if a tier has no catch-all
    /// rule, any guidance, label or status is empty, or a finding or status
    /// threshold is not finite.
    pub fn new(
        rules: Vec<RecommendationRule>,
        findings: Vec<FindingRule>,
        status: StatusTable,
        suggested_tests: SuggestedTests,
    ) -> Result<Self, GlycoriskError> {
        if let Some(rule) = rules.iter().find(|r| r.guidance.trim().is_empty()) {
            return Err(GlycoriskError::Configuration(format!(
                "{} rule requiring [{}] has empty guidance",
                rule.tier,
                rule.requires.join(", ")
            )));
        }
        for tier in RiskTier::ALL {
            if !rules.iter().any(|r| r.tier == tier && r.is_catch_all()) {
                return Err(GlycoriskError::Configuration(format!(
                    "no catch-all recommendation rule for tier {tier}"
                )));
            }
        }
        for finding in &findings {
            if finding.label.trim().is_empty() || !finding.threshold.is_finite() {
                return Err(GlycoriskError::Configuration(format!(
                    "finding rule for '{}' needs a label and a finite threshold",
                    finding.feature
                )));
            }
        }

        if status.unmatched.trim().is_empty() {
            return Err(GlycoriskError::Configuration(
                "status table needs a non-empty unmatched status".into(),
            ));
        }
        for rule in &status.rules {
            if rule.status.trim().is_empty() || !rule.threshold.is_finite() {
                return Err(GlycoriskError::Configuration(format!(
                    "status rule for '{}' needs a status and a finite threshold",
                    rule.feature
                )));
            }
        }

        Ok(Self {
            rules,
            findings,
            status,
            suggested_tests,
        })
    }

    #[must_use]
    pub fn rules(&self) -> &[RecommendationRule] {
        &self.rules
    }

    #[must_use]
    pub fn finding_rules(&self) -> &[FindingRule] {
        &self.findings
    }

    /// Guidance of the first matching rule. Never empty.
    #[must_use]
    pub fn recommend(&self, tier: RiskTier, top_factors: &[FeatureContribution]) -> String {
        self.rules
            .iter()
            .find(|rule| rule.matches(tier, top_factors))
            .map(|rule| rule.guidance.clone())
            .unwrap_or_else(|| tier.description().to_string())
    }

    /// One status per feature, in schema order.
    #[must_use]
    pub fn parameter_status(&self, features: &FeatureVector) -> Vec<ParameterStatus> {
        features
            .iter()
            .map(|(name, value)| self.status.rate(name, value))
            .collect()
    }

    #[must_use]
    pub fn suggested_tests(&self, tier: RiskTier) -> &[String] {
        self.suggested_tests.for_tier(tier)
    }

    /// Notable input values among features that raise the odds.
    ///
    /// Features are visited in schema order; for each, the first matching
    /// finding rule wins.
    #[must_use]
    pub fn findings(&self, features: &FeatureVector, odds_ratios: &[OddsRatio]) -> Vec<ClinicalFinding> {
        features
            .iter()
            .zip(odds_ratios)
            .filter(|(_, ratio)| ratio.is_risk_factor())
            .filter_map(|((name, value), ratio)| {
                self.findings
                    .iter()
                    .find(|rule| rule.feature == name && rule.comparison.holds(value, rule.threshold))
                    .map(|rule| ClinicalFinding {
                        feature: name.to_string(),
                        label: rule.label.clone(),
                        value,
                        odds_ratio: ratio.odds_ratio,
                    })
            })
            .collect()
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            findings: default_findings(),
            status: StatusTable::default(),
            suggested_tests: SuggestedTests::default(),
        }
    }
}
