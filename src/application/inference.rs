//! Inference service: Orchestrates the screening pipeline.
//!
//! This service coordinates:
//! - Input validation against the feature schema
//! - Probability scoring by the risk model
//! - Contribution ranking and odds ratios
//! - Tier classification
//! - Guidance, findings and follow-up tests
//!
//! A request either yields a complete bundle or a single typed error.

use std::sync::Arc;

use crate::application::classify::RiskClassifier;
use crate::application::explain::OddsRatioEngine;
use crate::application::recommend::RecommendationEngine;
use crate::config::ScreeningConfig;
use crate::domain::{FeatureSchema, PredictionResult, RawInput, RecommendationBundle};
use crate::ports::RiskModel;
use crate::{GlycoriskError, Result};

/// Service for running explainable risk screening.
///
/// Holds no per-request state; a single instance can serve concurrent
/// requests through a shared reference.
pub struct InferenceService<M>
where
    M: RiskModel,
{
    model: Arc<M>,
    schema: FeatureSchema,
    classifier: RiskClassifier,
    recommender: RecommendationEngine,
    top_factors: usize,
}

impl<M> InferenceService<M>
where
    M: RiskModel,
{
    /// Create a service over a loaded model and a screening policy.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` if the model has no artifact yet, and
    /// `Configuration` if the policy is inconsistent or the schema does not
    /// declare exactly the model's features in the model's order.
    pub fn new(model: Arc<M>, config: ScreeningConfig) -> Result<Self> {
        tracing::info!("Initializing inference service...");

        config.validate()?;

        let model_features = model.feature_names()?;
        if model_features != config.schema.names() {
            return Err(GlycoriskError::Configuration(format!(
                "schema features [{}] do not match model features [{}]",
                config.schema.names().join(", "),
                model_features.join(", ")
            )));
        }

        let recommender = RecommendationEngine::new(
            config.recommendations,
            config.findings,
            config.parameter_status,
            config.suggested_tests,
        )?;

        let version = model.version()?;
        tracing::info!(
            "Inference service ready: model={}, features={}, top_factors={}",
            version.version,
            config.schema.len(),
            config.top_factors
        );

        Ok(Self {
            model,
            schema: config.schema,
            classifier: RiskClassifier::new(config.thresholds),
            recommender,
            top_factors: config.top_factors,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    /// Validate, score and classify without the explanation steps.
    ///
    /// # Errors
    /// Returns `Schema` for invalid input, or a system fault from the model
    /// or classifier.
    pub fn predict(&self, raw: &RawInput) -> Result<PredictionResult> {
        let features = self.schema.validate(raw)?;
        let probability = self.model.predict_probability(&features)?;
        let tier = self.classifier.classify(probability)?;
        Ok(PredictionResult::new(probability, tier))
    }

    /// Run the full pipeline on raw patient input.
    ///
    /// Performs, in order:
    /// 1. Schema validation and encoding
    /// 2. Probability scoring
    /// 3. Contribution ranking
    /// 4. Tier classification
    /// 5. Guidance lookup, findings and suggested tests
    ///
    /// # Errors
    /// Returns the first failure. `Schema` errors are the caller's to fix;
    /// anything else is a system fault and is logged as such.
    pub fn run_inference(&self, raw: &RawInput) -> Result<RecommendationBundle> {
        self.run_pipeline(raw).inspect_err(|e| match e {
            // Violations echo submitted values, so only the count is logged
            GlycoriskError::Schema(schema) => tracing::warn!(
                "Rejected screening input: {} violation(s)",
                schema.violations().len()
            ),
            _ => tracing::error!("Screening pipeline fault: {}", e),
        })
    }

    fn run_pipeline(&self, raw: &RawInput) -> Result<RecommendationBundle> {
        tracing::debug!("Step 1: Validating {} submitted fields...", raw.len());
        let features = self.schema.validate(raw)?;

        tracing::debug!("Step 2: Scoring...");
        let probability = self.model.predict_probability(&features)?;

        tracing::debug!("Step 3: Ranking contributions...");
        let mut contributions = OddsRatioEngine::explain(self.model.as_ref(), &features)?;
        contributions.truncate(self.top_factors);

        tracing::debug!("Step 4: Classifying...");
        let tier = self.classifier.classify(probability)?;
        let prediction = PredictionResult::new(probability, tier);

        tracing::debug!("Step 5: Building recommendation...");
        let guidance = self.recommender.recommend(tier, &contributions);
        let odds_ratios = OddsRatioEngine::odds_ratio_table(self.model.as_ref())?;
        let clinical_findings = self.recommender.findings(&features, &odds_ratios);
        let parameter_status = self.recommender.parameter_status(&features);
        let suggested_tests = self.recommender.suggested_tests(tier).to_vec();
        let model = self.model.version()?;

        tracing::info!(
            "Screening complete: tier={}, confidence={:.2}%, findings={}",
            tier,
            prediction.confidence * 100.0,
            clinical_findings.len()
        );

        Ok(RecommendationBundle {
            probability: prediction.probability,
            prediction: prediction.prediction,
            confidence: prediction.confidence,
            tier,
            top_factors: contributions,
            guidance,
            clinical_findings,
            parameter_status,
            suggested_tests,
            odds_ratios,
            model,
        })
    }
}
