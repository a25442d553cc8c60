use std::sync::Arc;

use glycorisk::adapters::sanitize::sanitize;
use glycorisk::adapters::LogisticAdapter;
use glycorisk::application::{OddsRatioEngine, RecommendationEngine, RiskClassifier};
use glycorisk::domain::{FeatureSchema, ModelArtifact, OddsRatio, RiskThresholds};
use glycorisk::ports::RiskModel;
use glycorisk::{FeatureContribution, InferenceService, RawInput, RiskTier, ScreeningConfig};
use proptest::prelude::*;

const EPSILON: f64 = 1e-9;

fn diabetes_model(coefficients: Vec<f64>, intercept: f64) -> LogisticAdapter {
    let artifact = ModelArtifact::new(
        "property",
        FeatureSchema::diabetes().names().to_vec(),
        coefficients,
        intercept,
    );
    LogisticAdapter::with_artifact(artifact).expect("install")
}

fn coefficients() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0f64..3.0, 5)
}

prop_compose! {
    fn patient()(
        glucose in 70.0f64..=300.0,
        hba1c in 3.0f64..=15.0,
        bmi in 15.0f64..=80.0,
        hypertension in any::<bool>(),
        heart_disease in any::<bool>(),
    ) -> RawInput {
        let mut raw = RawInput::new();
        raw.insert("glucose".into(), glucose.into());
        raw.insert("hba1c".into(), hba1c.into());
        raw.insert("bmi".into(), bmi.into());
        raw.insert("hypertension".into(), hypertension.into());
        raw.insert("heart_disease".into(), heart_disease.into());
        raw
    }
}

fn tier() -> impl Strategy<Value = RiskTier> {
    prop_oneof![Just(RiskTier::Low), Just(RiskTier::Moderate), Just(RiskTier::High)]
}

// ── Probability is strictly inside (0, 1) ──────────────────────────────────

proptest! {
    #[test]
    fn probability_strictly_inside_unit_interval(
        coefs in coefficients(),
        intercept in -50.0f64..50.0,
        raw in patient(),
    ) {
        let model = diabetes_model(coefs, intercept);
        let features = FeatureSchema::diabetes().validate(&raw).unwrap();
        let p = model.predict_probability(&features).unwrap();
        prop_assert!(p > 0.0 && p < 1.0, "p = {}", p);
    }
}

// ── Classification is total and monotone ──────────────────────────────────

proptest! {
    #[test]
    fn classify_total_on_unit_interval(p in 0.0f64..=1.0) {
        let classifier = RiskClassifier::default();
        prop_assert!(classifier.classify(p).is_ok());
    }

    #[test]
    fn classify_monotone(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        moderate in 0.05f64..0.5,
        gap in 0.05f64..0.45,
    ) {
        let thresholds = RiskThresholds::new(moderate, moderate + gap).unwrap();
        let classifier = RiskClassifier::new(thresholds);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classifier.classify(lo).unwrap() <= classifier.classify(hi).unwrap());
    }
}

// ── Ranking law ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn contributions_ranked_by_magnitude(coefs in coefficients(), raw in patient()) {
        let model = diabetes_model(coefs, 0.0);
        let features = FeatureSchema::diabetes().validate(&raw).unwrap();
        let ranked = OddsRatioEngine::explain(&model, &features).unwrap();

        prop_assert_eq!(ranked.len(), features.len());
        for pair in ranked.windows(2) {
            prop_assert!(
                pair[0].magnitude() + EPSILON >= pair[1].magnitude(),
                "{} ({}) ranked above {} ({})",
                pair[0].feature, pair[0].contribution,
                pair[1].feature, pair[1].contribution
            );
        }

        let mut names: Vec<&str> = ranked.iter().map(|c| c.feature.as_str()).collect();
        names.sort_unstable();
        let mut expected: Vec<&str> = features.names().iter().map(String::as_str).collect();
        expected.sort_unstable();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn contribution_is_coefficient_times_value(coefs in coefficients(), raw in patient()) {
        let model = diabetes_model(coefs, 0.0);
        let features = FeatureSchema::diabetes().validate(&raw).unwrap();
        for c in OddsRatioEngine::explain(&model, &features).unwrap() {
            let value = features.get(&c.feature).unwrap();
            prop_assert_eq!(c.contribution, c.coefficient * value);
            prop_assert_eq!(c.odds_ratio, c.coefficient.exp());
        }
    }
}

// ── Odds ratios ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn zero_coefficient_has_unit_odds_ratio(
        mut coefs in coefficients(),
        zeroed in 0usize..5,
    ) {
        coefs[zeroed] = 0.0;
        let model = diabetes_model(coefs, 0.0);
        let table = OddsRatioEngine::odds_ratio_table(&model).unwrap();
        prop_assert_eq!(table[zeroed].odds_ratio, 1.0);
        prop_assert!(!table[zeroed].is_risk_factor());
    }

    #[test]
    fn odds_ratio_above_one_iff_positive_coefficient(coefficient in -10.0f64..10.0) {
        let ratio = OddsRatio::new("x", coefficient);
        prop_assert_eq!(ratio.is_risk_factor(), coefficient > 0.0);
    }
}

// ── Recommendation completeness ────────────────────────────────────────────

proptest! {
    #[test]
    fn guidance_never_empty(
        tier in tier(),
        factors in prop::collection::vec(
            (prop::sample::select(vec!["glucose", "hba1c", "bmi", "hypertension", "heart_disease"]),
             -5.0f64..5.0),
            0..5,
        ),
    ) {
        let top: Vec<FeatureContribution> = factors
            .into_iter()
            .map(|(name, value)| FeatureContribution::new(name, value, 1.0))
            .collect();
        let guidance = RecommendationEngine::default().recommend(tier, &top);
        prop_assert!(!guidance.trim().is_empty());
    }
}

// ── Determinism ────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pipeline_is_deterministic(
        coefs in coefficients(),
        intercept in -5.0f64..5.0,
        raw in patient(),
    ) {
        let model = Arc::new(diabetes_model(coefs, intercept));
        let service = InferenceService::new(model, ScreeningConfig::default()).unwrap();
        let first = service.run_inference(&raw).unwrap();
        let second = service.run_inference(&raw).unwrap();
        prop_assert!(first.top_factors.len() <= 3);
        prop_assert_eq!(first, second);
    }
}

// ── Log lines never carry clinical values ─────────────────────────────────

proptest! {
    #[test]
    fn sanitized_log_line_drops_measurement(
        name in prop::sample::select(vec!["glucose", "hba1c", "bmi", "age"]),
        whole in 10u32..999,
        frac in 0u32..99,
    ) {
        let value = format!("{whole}.{frac}");
        let line = format!("scored patient with {name}={value}");
        let sanitized = sanitize(&line);
        prop_assert!(!sanitized.contains(&value), "{}", sanitized);
        prop_assert_eq!(sanitize(&sanitized), sanitized);
    }
}
