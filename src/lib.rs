//! # Glycorisk
//!
//! Explainable diabetes risk screening over a fixed clinical feature schema.
//!
//! This crate provides:
//! - Validation and encoding of raw form input against a declared schema
//! - Logistic scoring against a frozen, init-once model artifact
//! - Per-feature odds ratios and per-patient contribution ranking
//! - Tier classification and rule-driven clinical guidance
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (schema, feature vectors, artifact, tiers, bundles)
//! - `ports`: Trait definitions for the scoring model
//! - `adapters`: Concrete implementations (logistic model, log sanitizing)
//! - `application`: Explanation, classification, recommendation and the pipeline
//! - `config`: Screening policy (schema, thresholds, rule tables)

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::InferenceService;
pub use config::ScreeningConfig;
pub use domain::{
    DomainError, FeatureContribution, FeatureVector, RawInput, RawValue, RecommendationBundle,
    RiskTier, SchemaError,
};

/// Result type for Glycorisk operations
pub type Result<T> = std::result::Result<T, GlycoriskError>;

/// Main error type for Glycorisk
#[derive(Debug, thiserror::Error)]
pub enum GlycoriskError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Domain invariant violated: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid model artifact: {0}")]
    Model(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GlycoriskError {
    /// Whether the caller can fix this by correcting the submitted input.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Whether this indicates a defect in model state or configuration.
    ///
    /// Retrying the same request never clears a system fault.
    #[must_use]
    pub fn is_system_fault(&self) -> bool {
        !self.is_user_correctable()
    }
}
