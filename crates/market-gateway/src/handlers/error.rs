//! Handler error types

use market_core::DomainError;
use market_service::ServiceError;
use thiserror::Error;

use crate::protocol::{CloseCode, OutboundEvent, ProtocolError};

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame could not be decoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Mutation before `auth`
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Second `auth` on one socket
    #[error("Already authenticated")]
    AlreadyAuthenticated,

    /// `auth` named an unknown or malformed user
    #[error("{0}")]
    AuthenticationFailed(String),

    /// `type` the gateway does not handle
    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    /// Service error
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<DomainError> for HandlerError {
    fn from(err: DomainError) -> Self {
        Self::Service(ServiceError::Domain(err))
    }
}

impl HandlerError {
    /// Event reported back to the client
    pub fn to_event(&self) -> OutboundEvent {
        match self {
            Self::AuthenticationFailed(msg) => OutboundEvent::auth_failed(msg.clone()),
            Self::Protocol(ProtocolError::Malformed(_)) => {
                OutboundEvent::error("Invalid message format")
            }
            Self::Service(e) => OutboundEvent::error(e.public_message()),
            other => OutboundEvent::error(other.to_string()),
        }
    }

    /// Close code, for errors that end the connection
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::AuthenticationFailed(_) => Some(CloseCode::AuthenticationFailed),
            _ => None,
        }
    }

    /// Infrastructure failures, logged with their details
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Service(e) if e.is_internal())
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
