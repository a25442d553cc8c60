//! End-to-end screening through the public API.

use std::path::PathBuf;
use std::sync::Arc;

use glycorisk::adapters::LogisticAdapter;
use glycorisk::application::{
    Comparison, RecommendationEngine, RecommendationRule, StatusRule, StatusTable,
};
use glycorisk::domain::{FeatureSchema, FeatureSpec, ModelArtifact, SchemaViolation};
use glycorisk::{
    FeatureContribution, GlycoriskError, InferenceService, RawInput, RiskTier, ScreeningConfig,
};

fn shipped_model() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("models")
        .join("diabetes_logreg.json")
}

fn default_service() -> InferenceService<LogisticAdapter> {
    let model = Arc::new(LogisticAdapter::new());
    model.load_model(&shipped_model()).expect("Shipped model loads");
    InferenceService::new(model, ScreeningConfig::default()).expect("Service builds")
}

fn patient(glucose: f64, hba1c: f64, bmi: f64, hypertension: u8, heart_disease: u8) -> RawInput {
    let mut raw = RawInput::new();
    raw.insert("glucose".into(), glucose.into());
    raw.insert("hba1c".into(), hba1c.into());
    raw.insert("bmi".into(), bmi.into());
    raw.insert("hypertension".into(), f64::from(hypertension).into());
    raw.insert("heart_disease".into(), f64::from(heart_disease).into());
    raw
}

fn catch_all_rules() -> Vec<RecommendationRule> {
    RiskTier::ALL
        .iter()
        .map(|tier| RecommendationRule::new(*tier, &[], tier.description()))
        .collect()
}

#[test]
fn worked_example_age_bmi_glucose() {
    let schema = FeatureSchema::new(vec![
        FeatureSpec::continuous("age", "years", 0.0, 120.0),
        FeatureSpec::continuous("bmi", "kg/m²", 10.0, 80.0),
        FeatureSpec::continuous("glucose", "mg/dL", 0.0, 600.0),
    ])
    .expect("Valid schema");

    // 0.5 + 1.5 + 11.2 - 14.7 = -1.5
    let artifact = ModelArtifact::new(
        "worked-example",
        schema.names().to_vec(),
        vec![0.01, 0.05, 0.08],
        -14.7,
    );
    let model = Arc::new(LogisticAdapter::with_artifact(artifact).expect("install"));
    let config = ScreeningConfig {
        schema,
        recommendations: catch_all_rules(),
        findings: vec![],
        parameter_status: StatusTable {
            rules: vec![StatusRule::new("glucose", Comparison::Above, 125.0, "Elevated", true)],
            unmatched: "Normal".into(),
        },
        ..ScreeningConfig::default()
    };
    let service = InferenceService::new(model, config).expect("service");

    let mut raw = RawInput::new();
    raw.insert("age".into(), 50.0.into());
    raw.insert("bmi".into(), 30.0.into());
    raw.insert("glucose".into(), 140.0.into());

    let bundle = service.run_inference(&raw).expect("bundle");
    assert!((bundle.probability - 0.182_425_52).abs() < 1e-6);
    assert_eq!(bundle.tier, RiskTier::Low);
    assert_eq!(bundle.top_factors[0].feature, "glucose");
    assert!((bundle.top_factors[0].contribution - 11.2).abs() < 1e-9);
    let statuses: Vec<&str> = bundle.parameter_status.iter().map(|p| p.status.as_str()).collect();
    assert_eq!(statuses, vec!["Normal", "Normal", "Elevated"]);

    let glucose = bundle
        .odds_ratios
        .iter()
        .find(|r| r.feature == "glucose")
        .expect("glucose odds ratio");
    assert!((glucose.odds_ratio - 1.083_287).abs() < 1e-6);
}

#[test]
fn shipped_model_high_risk_patient() {
    let bundle = default_service()
        .run_inference(&patient(200.0, 8.0, 35.0, 1, 0))
        .expect("bundle");

    assert_eq!(bundle.tier, RiskTier::High);
    assert_eq!(bundle.prediction, 1);
    assert_eq!(bundle.model.version, "diabetes-logreg-2024.1");
    assert_eq!(bundle.model.fingerprint.len(), 64);

    // glucose 2.2475, hba1c 2.2, hypertension 0.941; BMI misses the top 3
    assert_eq!(
        bundle.factor_names().collect::<Vec<_>>(),
        vec!["glucose", "hba1c", "hypertension"]
    );
    assert!(bundle.guidance.starts_with("High risk with HbA1c"));

    let findings: Vec<&str> = bundle.clinical_findings.iter().map(|f| f.feature.as_str()).collect();
    assert_eq!(findings, vec!["glucose", "hba1c", "bmi", "hypertension"]);

    let statuses: Vec<(&str, &str)> = bundle
        .parameter_status
        .iter()
        .map(|p| (p.feature.as_str(), p.status.as_str()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("glucose", "Elevated"),
            ("hba1c", "Elevated"),
            ("bmi", "Elevated"),
            ("hypertension", "Present"),
            ("heart_disease", "Absent"),
        ]
    );
    assert!(bundle
        .suggested_tests
        .iter()
        .any(|t| t == "Oral glucose tolerance test"));
}

#[test]
fn shipped_model_low_risk_patient() {
    let bundle = default_service()
        .run_inference(&patient(90.0, 5.0, 22.0, 0, 0))
        .expect("bundle");

    assert_eq!(bundle.tier, RiskTier::Low);
    assert!(bundle.probability < 0.05);
    assert!(bundle.top_factors.iter().all(|f| f.contribution < 0.0));
    assert!(bundle.guidance.starts_with("Prevention"));
    assert!(bundle.clinical_findings.is_empty());
}

#[test]
fn identical_input_yields_identical_bundle() {
    let service = default_service();
    let raw = patient(142.0, 6.1, 29.4, 1, 1);

    let first = serde_json::to_string(&service.run_inference(&raw).expect("first")).expect("json");
    let second = serde_json::to_string(&service.run_inference(&raw).expect("second")).expect("json");
    assert_eq!(first, second);
}

#[test]
fn form_style_input_is_accepted() {
    let raw: RawInput = serde_json::from_str(
        r#"{"glucose": "142", "hba1c": 6.1, "bmi": 29.4, "hypertension": "Yes", "heart_disease": false}"#,
    )
    .expect("json");
    let service = default_service();
    let from_form = service.run_inference(&raw).expect("bundle");
    let typed = service
        .run_inference(&patient(142.0, 6.1, 29.4, 1, 0))
        .expect("bundle");
    assert_eq!(from_form, typed);
}

#[test]
fn negative_glucose_is_rejected() {
    let err = default_service()
        .run_inference(&patient(-5.0, 5.5, 25.0, 0, 0))
        .unwrap_err();

    let GlycoriskError::Schema(schema) = err else {
        panic!("expected a schema error");
    };
    assert!(matches!(
        schema.violations(),
        [SchemaViolation::OutOfRange { feature, .. }] if feature == "glucose"
    ));
}

#[test]
fn missing_and_unexpected_features_are_all_reported() {
    let mut raw = patient(120.0, 5.5, 25.0, 0, 0);
    raw.remove("bmi");
    raw.insert("smoker".into(), true.into());

    let err = default_service().run_inference(&raw).unwrap_err();
    assert!(err.is_user_correctable());
    let GlycoriskError::Schema(schema) = err else {
        panic!("expected a schema error");
    };
    let features: Vec<&str> = schema.violations().iter().map(SchemaViolation::feature).collect();
    assert_eq!(features, vec!["bmi", "smoker"]);
}

#[test]
fn every_tier_and_factor_subset_gets_guidance() {
    let engine = RecommendationEngine::default();
    let names = FeatureSchema::diabetes().names().to_vec();

    for tier in RiskTier::ALL {
        for mask in 0u32..(1 << names.len()) {
            let top: Vec<FeatureContribution> = names
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, name)| FeatureContribution::new(name.clone(), 1.0, 0.5))
                .collect();

            let guidance = engine.recommend(tier, &top);
            assert!(!guidance.trim().is_empty(), "{tier} mask {mask:05b}");
            assert!(
                engine
                    .rules()
                    .iter()
                    .any(|r| r.tier == tier && r.guidance == guidance),
                "{tier} mask {mask:05b} matched a rule of another tier"
            );
        }
    }
}
