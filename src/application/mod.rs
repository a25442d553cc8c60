//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the screening pipeline.

mod classify;
mod explain;
mod inference;
pub mod recommend;

pub use classify::RiskClassifier;
pub use explain::OddsRatioEngine;
pub use inference::InferenceService;
pub use recommend::{
    Comparison, FindingRule, RecommendationEngine, RecommendationRule, StatusRule, StatusTable,
    SuggestedTests,
};
