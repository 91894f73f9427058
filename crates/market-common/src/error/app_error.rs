//! Application error types
//!
//! Errors raised while wiring the process together: configuration, pools,
//! migrations, and the listener. Request-level failures use the service
//! layer's own error type.

use market_core::DomainError;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Stable code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Create a database error from anything displayable
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }

    /// Create a cache error from anything displayable
    pub fn cache(err: impl std::fmt::Display) -> Self {
        Self::Cache(err.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Config(ConfigError::MissingVar("GATEWAY_PORT")).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(AppError::database("refused").error_code(), "DATABASE_ERROR");
        assert_eq!(AppError::cache("refused").error_code(), "CACHE_ERROR");
        assert_eq!(
            AppError::from(DomainError::InvalidId("x".into())).error_code(),
            "INVALID_ID"
        );
    }

    #[test]
    fn test_messages() {
        let err = AppError::from(ConfigError::MissingVar("DATABASE_URL"));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variable: DATABASE_URL"
        );

        let err = AppError::internal(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
