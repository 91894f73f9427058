//! Service layer error types

use market_core::DomainError;

/// Message shown to clients for failures that are not their fault
const GENERIC_FAILURE: &str = "Internal server error";

/// Service layer error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Domain rule violation or persistence failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Resource not found
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code for outbound error events
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure came from infrastructure rather than the request
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Domain(e) => e.is_infrastructure(),
            Self::Internal(_) => true,
            Self::NotFound { .. } | Self::Validation(_) => false,
        }
    }

    /// Text safe to send to a client; infrastructure details stay in the logs
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::EntityId;

    #[test]
    fn test_not_found_error() {
        let err = ServiceError::not_found("User", "123");
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "User not found: 123");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_database_failure_is_hidden() {
        let err = ServiceError::from(DomainError::DatabaseError("connection reset".into()));
        assert!(err.is_internal());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_domain_not_found_is_public() {
        let id = EntityId::generate();
        let err = ServiceError::from(DomainError::UserNotFound(id));
        assert_eq!(err.public_message(), format!("User not found: {id}"));
    }
}
