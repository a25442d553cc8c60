//! Feature schema and input validation for diabetes risk screening.
//!
//! The schema is the single declaration of the model inputs. The validator
//! uses it to accept or reject raw form input, and the pipeline checks the
//! model artifact against the same ordered names.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::GlycoriskError;

/// A raw answer as submitted by the presentation layer.
///
/// Untagged, so a plain JSON object such as
/// `{"glucose": 120, "hypertension": true}` deserializes into a [`RawInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Raw request input: feature name to submitted value.
pub type RawInput = BTreeMap<String, RawValue>;

/// A categorical answer and the numeric code it encodes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLevel {
    pub label: String,
    pub code: f64,
}

/// Declared domain of a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureDomain {
    /// Numeric value within a closed range.
    Continuous { min: f64, max: f64 },
    /// Yes/no answer encoded as 0 or 1.
    Binary,
    /// One of a fixed set of labels, encoded as the level's code.
    Categorical { levels: Vec<CategoryLevel> },
}

/// Declaration of one schema feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub domain: FeatureDomain,
}

impl FeatureSpec {
    #[must_use]
    pub fn continuous(name: impl Into<String>, unit: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            unit: Some(unit.into()),
            domain: FeatureDomain::Continuous { min, max },
        }
    }

    #[must_use]
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            domain: FeatureDomain::Binary,
        }
    }

    #[must_use]
    pub fn categorical(name: impl Into<String>, levels: &[(&str, f64)]) -> Self {
        Self {
            name: name.into(),
            unit: None,
            domain: FeatureDomain::Categorical {
                levels: levels
                    .iter()
                    .map(|(label, code)| CategoryLevel {
                        label: (*label).to_string(),
                        code: *code,
                    })
                    .collect(),
            },
        }
    }

    /// Encode a raw answer into the feature's numeric value.
    fn encode(&self, value: &RawValue) -> Result<f64, SchemaViolation> {
        match (&self.domain, value) {
            (FeatureDomain::Continuous { min, max }, RawValue::Number(x)) => {
                self.check_range(*x, *min, *max)
            }
            (FeatureDomain::Continuous { min, max }, RawValue::Text(s)) => {
                match s.trim().parse::<f64>() {
                    Ok(x) => self.check_range(x, *min, *max),
                    Err(_) => Err(self.wrong_type("number", value)),
                }
            }
            (FeatureDomain::Binary, RawValue::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
            (FeatureDomain::Binary, RawValue::Number(x)) => {
                // -0.0 compares equal to 0.0 and is normalized away
                if *x == 1.0 {
                    Ok(1.0)
                } else if *x == 0.0 {
                    Ok(0.0)
                } else {
                    Err(self.invalid_category(x.to_string()))
                }
            }
            (FeatureDomain::Binary, RawValue::Text(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "yes" | "true" | "1" => Ok(1.0),
                    "no" | "false" | "0" => Ok(0.0),
                    _ => Err(self.invalid_category(s.clone())),
                }
            }
            (FeatureDomain::Categorical { levels }, RawValue::Text(s)) => levels
                .iter()
                .find(|level| level.label == s.trim())
                .map(|level| level.code)
                .ok_or_else(|| self.invalid_category(s.clone())),
            (FeatureDomain::Continuous { .. }, _) => Err(self.wrong_type("number", value)),
            (FeatureDomain::Binary, _) => Err(self.wrong_type("boolean", value)),
            (FeatureDomain::Categorical { .. }, _) => Err(self.wrong_type("text", value)),
        }
    }

    fn check_range(&self, x: f64, min: f64, max: f64) -> Result<f64, SchemaViolation> {
        if !x.is_finite() {
            return Err(SchemaViolation::NotFinite {
                feature: self.name.clone(),
            });
        }
        if !(min..=max).contains(&x) {
            return Err(SchemaViolation::OutOfRange {
                feature: self.name.clone(),
                value: x,
                min,
                max,
            });
        }
        Ok(x)
    }

    fn allowed_labels(&self) -> Vec<String> {
        match &self.domain {
            FeatureDomain::Binary => ["yes", "no", "true", "false", "1", "0"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            FeatureDomain::Categorical { levels } => {
                levels.iter().map(|l| l.label.clone()).collect()
            }
            FeatureDomain::Continuous { .. } => Vec::new(),
        }
    }

    fn invalid_category(&self, got: String) -> SchemaViolation {
        SchemaViolation::InvalidCategory {
            feature: self.name.clone(),
            got,
            allowed: self.allowed_labels(),
        }
    }

    fn wrong_type(&self, expected: &'static str, got: &RawValue) -> SchemaViolation {
        SchemaViolation::WrongType {
            feature: self.name.clone(),
            expected,
            got: got.kind(),
        }
    }

    fn check_declaration(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("feature name must not be empty".into());
        }
        match &self.domain {
            FeatureDomain::Continuous { min, max } => {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(format!(
                        "feature '{}' has an invalid range [{min}, {max}]",
                        self.name
                    ));
                }
            }
            FeatureDomain::Binary => {}
            FeatureDomain::Categorical { levels } => {
                if levels.is_empty() {
                    return Err(format!("feature '{}' declares no levels", self.name));
                }
                let mut seen = HashSet::new();
                for level in levels {
                    if !level.code.is_finite() {
                        return Err(format!(
                            "feature '{}' level '{}' has a non-finite code",
                            self.name, level.label
                        ));
                    }
                    if !seen.insert(level.label.as_str()) {
                        return Err(format!(
                            "feature '{}' declares level '{}' twice",
                            self.name, level.label
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A single reason an input was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("missing required feature '{feature}'")]
    Missing { feature: String },

    #[error("unexpected feature '{feature}'")]
    Unexpected { feature: String },

    #[error("{feature} must be a finite number")]
    NotFinite { feature: String },

    #[error("{feature} {value} out of range [{min}, {max}]")]
    OutOfRange {
        feature: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{feature} '{got}' is not one of: {}", .allowed.join(", "))]
    InvalidCategory {
        feature: String,
        got: String,
        allowed: Vec<String>,
    },

    #[error("{feature} expects a {expected}, got a {got}")]
    WrongType {
        feature: String,
        expected: &'static str,
        got: &'static str,
    },
}

impl SchemaViolation {
    /// Name of the feature (or unexpected key) this violation refers to.
    #[must_use]
    pub fn feature(&self) -> &str {
        match self {
            Self::Missing { feature }
            | Self::Unexpected { feature }
            | Self::NotFinite { feature }
            | Self::OutOfRange { feature, .. }
            | Self::InvalidCategory { feature, .. }
            | Self::WrongType { feature, .. } => feature.as_str(),
        }
    }
}

/// Malformed or out-of-domain patient input.
///
/// Carries every violation found: declared features in schema order first,
/// then unexpected keys in sorted order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid patient data: {}", join_violations(.violations))]
pub struct SchemaError {
    violations: Vec<SchemaViolation>,
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SchemaError {
    #[must_use]
    pub fn new(violations: Vec<SchemaViolation>) -> Self {
        Self { violations }
    }

    #[must_use]
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

/// Validated, encoded features in schema order.
///
/// Only produced by [`FeatureSchema::validate`], so every value is known to be
/// finite and inside its declared domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a feature by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Ordered feature declarations shared by the validator and the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureSpec>", into = "Vec<FeatureSpec>")]
pub struct FeatureSchema {
    features: Vec<FeatureSpec>,
    names: Arc<[String]>,
}

impl FeatureSchema {
    /// Build a schema from ordered feature declarations.
    ///
    /// # Errors
    /// Returns `GlycoriskError::Configuration` if the schema is empty, a name is
    /// repeated, or a domain is malformed.
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self, GlycoriskError> {
        if features.is_empty() {
            return Err(GlycoriskError::Configuration(
                "feature schema must declare at least one feature".into(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &features {
            spec.check_declaration()
                .map_err(GlycoriskError::Configuration)?;
            if !seen.insert(spec.name.as_str()) {
                return Err(GlycoriskError::Configuration(format!(
                    "feature '{}' declared twice",
                    spec.name
                )));
            }
        }

        let names: Arc<[String]> = features.iter().map(|f| f.name.clone()).collect();
        Ok(Self { features, names })
    }

    /// Default schema of the diabetes screening form.
    ///
    /// Glucose (mg/dL), HbA1c (%), BMI (kg/m²), hypertension and heart disease.
    #[must_use]
    pub fn diabetes() -> Self {
        let features = vec![
            FeatureSpec::continuous("glucose", "mg/dL", 70.0, 300.0),
            FeatureSpec::continuous("hba1c", "%", 3.0, 15.0),
            FeatureSpec::continuous("bmi", "kg/m²", 15.0, 80.0),
            FeatureSpec::binary("hypertension"),
            FeatureSpec::binary("heart_disease"),
        ];
        let names: Arc<[String]> = features.iter().map(|f| f.name.clone()).collect();
        Self { features, names }
    }

    #[must_use]
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name)
    }

    /// Validate and encode raw input into a [`FeatureVector`].
    ///
    /// Pure: identical input always yields an identical vector.
    ///
    /// # Errors
    /// Returns a `SchemaError` listing every missing, unexpected, mistyped or
    /// out-of-domain value.
    pub fn validate(&self, raw: &RawInput) -> Result<FeatureVector, SchemaError> {
        let mut violations = Vec::new();
        let mut values = Vec::with_capacity(self.features.len());

        for spec in &self.features {
            match raw.get(&spec.name) {
                None => violations.push(SchemaViolation::Missing {
                    feature: spec.name.clone(),
                }),
                Some(value) => match spec.encode(value) {
                    Ok(v) => values.push(v),
                    Err(v) => violations.push(v),
                },
            }
        }

        // BTreeMap keys iterate sorted, keeping the report deterministic.
        for key in raw.keys() {
            if !self.contains(key) {
                violations.push(SchemaViolation::Unexpected {
                    feature: key.clone(),
                });
            }
        }

        if !violations.is_empty() {
            return Err(SchemaError::new(violations));
        }

        Ok(FeatureVector {
            names: Arc::clone(&self.names),
            values,
        })
    }
}

impl TryFrom<Vec<FeatureSpec>> for FeatureSchema {
    type Error = GlycoriskError;

    fn try_from(features: Vec<FeatureSpec>) -> Result<Self, Self::Error> {
        Self::new(features)
    }
}

impl From<FeatureSchema> for Vec<FeatureSpec> {
    fn from(schema: FeatureSchema) -> Self {
        schema.features
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::diabetes()
    }
}
