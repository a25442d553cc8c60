//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the screening pipeline and the trained model it consumes.

mod risk_model;

pub use risk_model::RiskModel;
