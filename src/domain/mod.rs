//! Domain layer: Core screening types.
//!
//! Pure types with no I/O. Everything here is serializable and validated on
//! construction or at the point it enters the pipeline.

mod contribution;
mod model;
mod recommendation;
mod risk;
mod schema;

pub use contribution::{Direction, FeatureContribution, OddsRatio, CONTRIBUTION_EPSILON};
pub use model::{ModelArtifact, ModelVersion, StandardScaler, ARTIFACT_FORMAT_VERSION};
pub use recommendation::{ClinicalFinding, ParameterStatus, RecommendationBundle};
pub use risk::{DomainError, PredictionResult, RiskThresholds, RiskTier};
pub use schema::{
    CategoryLevel, FeatureDomain, FeatureSchema, FeatureSpec, FeatureVector, RawInput, RawValue,
    SchemaError, SchemaViolation,
};
