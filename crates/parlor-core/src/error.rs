//! Error types for Parlor.
//!
//! Every operation in this crate fails with a [`ChatError`]. The transport
//! layer translates each kind into its own status codes; nothing here retries
//! or recovers locally.

use std::fmt;
use thiserror::Error;

/// Errors raised by a [`Store`](crate::store::Store) implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A participant with this name already exists.
    #[error("Duplicate participant: {0}")]
    Duplicate(String),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("Store failure: {0}")]
    Backend(String),
}

/// A single violated input constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: &'static str,
}

impl Violation {
    /// Create a new violation.
    #[must_use]
    pub const fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Errors surfaced by the presence and message operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed or missing input. Carries every violated constraint.
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<Violation>),

    /// A participant with this name is already active.
    #[error("Participant already exists: {0}")]
    Conflict(String),

    /// The referenced participant does not exist.
    #[error("Participant not found: {0}")]
    NotFound(String),

    /// The sender is not an active participant.
    #[error("Sender is not an active participant: {0}")]
    Unauthenticated(String),

    /// The store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ChatError {
    /// Shorthand for a validation error with a single violation.
    #[must_use]
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        ChatError::Validation(vec![Violation::new(field, reason)])
    }

    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => "validation_error",
            ChatError::Conflict(_) => "conflict",
            ChatError::NotFound(_) => "not_found",
            ChatError::Unauthenticated(_) => "unauthenticated",
            ChatError::Storage(_) => "storage_error",
        }
    }

    /// The violations carried by a validation error, empty otherwise.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            ChatError::Validation(v) => v,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
