//! Error types for the expansion engine

use aclx_core::CoreError;
use thiserror::Error;

/// Expansion engine errors
#[derive(Debug, Error)]
pub enum ExpansionError {
    /// Malformed input: user without tenant, role without position or group,
    /// entry whose hierarchy cannot accept the synthesized owner
    #[error("Invalid probe: {0}")]
    InvalidProbe(String),

    /// The probe builder broke its own contract; aborts the expansion
    #[error("Probe invariant violated: {0}")]
    ProbeInvariant(String),

    /// Entry creation attempted outside an active evaluation context
    #[error("No active evaluation context")]
    NoActiveContext,

    /// Security model error
    #[error("Model error: {0}")]
    Model(CoreError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExpansionError {
    /// Whether this error signals a bug rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExpansionError::ProbeInvariant(_))
    }
}

impl From<CoreError> for ExpansionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoActiveContext => ExpansionError::NoActiveContext,
            other => ExpansionError::Model(other),
        }
    }
}

/// Result type for expansion operations
pub type Result<T> = std::result::Result<T, ExpansionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_active_context_is_lifted() {
        let err: ExpansionError = CoreError::NoActiveContext.into();
        assert!(matches!(err, ExpansionError::NoActiveContext));

        let err: ExpansionError = CoreError::not_found("user", "u1").into();
        assert!(matches!(err, ExpansionError::Model(_)));
    }

    #[test]
    fn test_only_invariant_violations_are_fatal() {
        assert!(ExpansionError::ProbeInvariant("x".into()).is_fatal());
        assert!(!ExpansionError::InvalidProbe("x".into()).is_fatal());
        assert!(!ExpansionError::NoActiveContext.is_fatal());
    }
}
