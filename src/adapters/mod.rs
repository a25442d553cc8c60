//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: init-once logistic regression over a JSON artifact
//! - `sanitize`: PHI filtering for log output

pub mod logistic;
pub mod sanitize;

pub use logistic::LogisticAdapter;
