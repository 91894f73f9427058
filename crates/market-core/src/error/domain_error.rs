//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::EntityId;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(EntityId),

    #[error("Message not found: {0}")]
    MessageNotFound(EntityId),

    // =========================================================================
    // Caller Errors
    // =========================================================================
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl DomainError {
    /// Get an error code string for outbound error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::InvalidId(_) => "INVALID_ID",
            Self::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::MessageNotFound(_))
    }

    /// Check if this error comes from infrastructure rather than the caller
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::DatabaseError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::UserNotFound(EntityId::generate());
        assert_eq!(err.code(), "UNKNOWN_USER");

        let err = DomainError::DatabaseError("boom".to_string());
        assert_eq!(err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_classifiers() {
        assert!(DomainError::MessageNotFound(EntityId::generate()).is_not_found());
        assert!(!DomainError::InvalidId("x".to_string()).is_not_found());
        assert!(DomainError::DatabaseError("x".to_string()).is_infrastructure());
        assert!(!DomainError::MessageNotFound(EntityId::generate()).is_infrastructure());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidId("nope".to_string());
        assert_eq!(err.to_string(), "Invalid identifier: nope");
    }
}
