use thiserror::Error;
use uuid::Uuid;

/// Typed causes carried inside `anyhow::Error` by the services.
/// Callers that need to tell them apart use `err.downcast_ref::<ClubError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClubError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} with ID {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

impl ClubError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClubError::Validation(msg.into())
    }

    pub fn player_not_found(id: Uuid) -> Self {
        ClubError::NotFound { kind: "Player", id }
    }

    pub fn match_not_found(id: Uuid) -> Self {
        ClubError::NotFound { kind: "Match", id }
    }

    /// Input problems the user can fix and retry.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ClubError::Validation(_) | ClubError::NotFound { .. })
    }
}
