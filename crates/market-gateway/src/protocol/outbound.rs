//! Server-to-client events
//!
//! Serialized as `{"type": "<snake_case>", "payload": {...camelCase}}`.

use market_core::EntityId;
use market_service::dto::{HistoryPage, MessagePayload, ProjectUser, UserProject};
use serde::Serialize;

/// A user as announced in presence events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: EntityId,
    pub user_name: String,
}

impl UserSummary {
    pub fn new(user_id: EntityId, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadNotice {
    pub message_ids: Vec<EntityId>,
    pub read_by: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredNotice {
    pub message_ids: Vec<EntityId>,
    pub delivered_to: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

/// Event sent to a client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    AuthSuccess(UserSummary),
    AuthFailed(ErrorPayload),
    OnlineUsers { users: Vec<UserSummary> },
    UserOnline(UserSummary),
    UserOffline(UserRef),
    MessageReceived(MessagePayload),
    MessageHistory(HistoryPage),
    ProjectUsers { users: Vec<ProjectUser> },
    UserProjects { projects: Vec<UserProject> },
    MessageRead(ReadNotice),
    MessageDelivered(DeliveredNotice),
    Error(ErrorPayload),
}

impl OutboundEvent {
    /// Create an `error` event
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            error: message.into(),
        })
    }

    /// Create an `auth_failed` event
    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::AuthFailed(ErrorPayload {
            error: message.into(),
        })
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
