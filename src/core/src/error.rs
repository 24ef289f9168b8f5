//! Error types for the security model
//!
//! Every failure in this crate is a data problem (a malformed model, a
//! dangling reference) or a caller problem (evaluating outside a context).
//! None of them are transient.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for the security model
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two entities of the same kind share an identifier
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// A reference points at an entity that does not exist
    #[error("Unknown {kind} '{id}' referenced by {referenced_by}")]
    UnknownReference {
        kind: &'static str,
        id: String,
        referenced_by: String,
    },

    /// A lookup by identifier found nothing
    #[error("Not found: {kind} '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// An owned entity disagrees with its owner (role.user, entry.acl)
    #[error("Inconsistent owner: {0}")]
    InconsistentOwner(String),

    /// A parent chain loops back on itself
    #[error("Hierarchy cycle in {kind} '{id}'")]
    HierarchyCycle { kind: &'static str, id: String },

    /// An evaluation was attempted without an active evaluation context
    #[error("No active evaluation context")]
    NoActiveContext,

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(kind: &'static str, id: S) -> Self {
        CoreError::NotFound { kind, id: id.into() }
    }

    /// Create an unknown reference error
    pub fn unknown_reference<S: Into<String>, R: Into<String>>(
        kind: &'static str,
        id: S,
        referenced_by: R,
    ) -> Self {
        CoreError::UnknownReference {
            kind,
            id: id.into(),
            referenced_by: referenced_by.into(),
        }
    }

    /// Create an inconsistent owner error
    pub fn inconsistent_owner<S: Into<String>>(msg: S) -> Self {
        CoreError::InconsistentOwner(msg.into())
    }
}
