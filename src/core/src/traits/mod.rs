//! Shared traits for the security model

pub mod evaluator;

// Re-export commonly used traits
pub use evaluator::{AccessEvaluation, AccessEvaluator, AccessTypeStatistics};
