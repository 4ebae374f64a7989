//! Error types for lifecycle-service operations.

use crate::domain::{IssueId, ProjectId, SprintId, SprintStatus};
use thiserror::Error;

/// The error type for all lifecycle-service operations.
///
/// Errors surface to callers unmodified; the core never retries and never
/// recovers silently. Retries, if any, belong to the storage or transport
/// collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// No actor could be resolved for the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The actor was resolved but lacks permission for the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Project absent, or not visible from the actor's organisation.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Sprint absent, or not visible from the actor's organisation.
    #[error("Sprint not found: {0}")]
    SprintNotFound(SprintId),

    /// Issue absent, or not visible from the actor's organisation.
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    /// A sprint status change violated the state machine rules.
    #[error("Invalid sprint transition {from} -> {to}: {reason}")]
    InvalidTransition {
        /// The sprint's current status.
        from: SprintStatus,

        /// The requested target status.
        to: SprintStatus,

        /// Which rule was violated.
        reason: String,
    },

    /// An ordering operation was given an out-of-bounds position.
    #[error("Index {index} out of range for bucket of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,

        /// Length of the bucket it was applied to.
        len: usize,
    },

    /// Malformed input fields.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Backend-specific storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Shorthand for a [`Error::Forbidden`] with a reason.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Error::Forbidden(reason.into())
    }
}

/// A specialized Result type for lifecycle-service operations.
pub type Result<T> = std::result::Result<T, Error>;
