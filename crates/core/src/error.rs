//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// immutability, state conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty items, non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A mutation targeted a version that is no longer a draft.
    #[error("version is immutable: {0}")]
    ImmutableVersion(String),

    /// A concurrent accept lost the race, or the version is already accepted.
    #[error("already accepted: {0}")]
    AlreadyAccepted(String),

    /// No accepted offer version exists for the project.
    #[error("no accepted offer version for project")]
    NoAcceptedVersion,

    /// A requested document/version was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. a second writer lost a store-level race).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A downstream side effect (finance entry, numbering, order fan-out)
    /// failed. Whether this aborts the primary operation is the caller's
    /// policy, not encoded here.
    #[error("side effect failed: {0}")]
    SideEffect(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn immutable(msg: impl Into<String>) -> Self {
        Self::ImmutableVersion(msg.into())
    }

    pub fn already_accepted(msg: impl Into<String>) -> Self {
        Self::AlreadyAccepted(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn side_effect(msg: impl Into<String>) -> Self {
        Self::SideEffect(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
