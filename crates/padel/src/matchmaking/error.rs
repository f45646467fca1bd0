//! Error types for the matchmaking workflows.

use thiserror::Error;

/// Errors that can occur while grouping waitlist entries or managing
/// pairings and class membership.
#[derive(Debug, Error)]
pub enum MatchmakingError {
    /// Input rejected before any mutation (e.g. player count out of range)
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// An identifier did not resolve to an existing record
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The requested change is already in effect; surfaced as a warning
    #[error("{message}")]
    AlreadyInState { message: String },

    /// Store-level failure
    #[error("Storage error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl MatchmakingError {
    pub fn validation(message: impl Into<String>) -> Self {
        MatchmakingError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str) -> Self {
        MatchmakingError::NotFound { entity }
    }

    /// Returns true if the operation left state as it already was.
    pub fn is_warning(&self) -> bool {
        matches!(self, MatchmakingError::AlreadyInState { .. })
    }
}
