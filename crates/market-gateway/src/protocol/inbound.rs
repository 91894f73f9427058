//! Client-to-server events
//!
//! Every frame is a `{type, payload}` envelope. The envelope is decoded first
//! so a bad payload can be reported against the event it belongs to.

use market_service::dto::{
    AuthRequest, HistoryRequest, MarkAsReadRequest, ProjectUsersRequest, SendMessageRequest,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Protocol decoding errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not a JSON envelope
    #[error("Invalid message format: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Envelope was fine but its payload does not fit the event
    #[error("Invalid payload for {event}: {source}")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// A decoded client event
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Auth(AuthRequest),
    MessageSend(SendMessageRequest),
    MessageHistory(HistoryRequest),
    GetProjectUsers(ProjectUsersRequest),
    GetUserProjects,
    MarkAsRead(MarkAsReadRequest),
    /// Any `type` the gateway does not know
    Unknown(String),
}

impl InboundEvent {
    /// Decode one text frame
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { kind, payload } = serde_json::from_str(text)?;
        // A missing payload reads as an empty object
        let payload = if payload.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            payload
        };

        Ok(match kind.as_str() {
            "auth" => Self::Auth(decode("auth", payload)?),
            "message_send" => Self::MessageSend(decode("message_send", payload)?),
            "message_history" => Self::MessageHistory(decode("message_history", payload)?),
            "get_project_users" => Self::GetProjectUsers(decode("get_project_users", payload)?),
            "get_user_projects" => Self::GetUserProjects,
            "mark_as_read" => Self::MarkAsRead(decode("mark_as_read", payload)?),
            _ => Self::Unknown(kind),
        })
    }

    /// Wire name of the event
    pub fn name(&self) -> &str {
        match self {
            Self::Auth(_) => "auth",
            Self::MessageSend(_) => "message_send",
            Self::MessageHistory(_) => "message_history",
            Self::GetProjectUsers(_) => "get_project_users",
            Self::GetUserProjects => "get_user_projects",
            Self::MarkAsRead(_) => "mark_as_read",
            Self::Unknown(kind) => kind,
        }
    }

    /// Events that change state; before `auth` these are answered with an error
    /// instead of being dropped
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::MessageSend(_) | Self::MarkAsRead(_))
    }
}

fn decode<T: DeserializeOwned>(event: &'static str, payload: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload { event, source })
}
