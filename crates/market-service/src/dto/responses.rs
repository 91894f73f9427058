//! Response DTOs for outbound chat events
//!
//! Serialized camelCase. Payloads that are cached also derive `Deserialize`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use market_core::{EntityId, MessageStatus, ProjectStatus, UserRole};

/// Attachment as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_key: String,
    pub public_id: String,
    pub checksum: Option<String>,
    pub url: String,
}

/// A chat message as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: EntityId,
    pub client_message_id: Option<String>,
    pub content: String,
    pub sender_id: EntityId,
    pub sender_name: String,
    pub receiver_id: EntityId,
    pub project_id: Option<EntityId>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentPayload>,
}

/// One page of history, oldest message first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub messages: Vec<MessagePayload>,
    pub total: i64,
    pub page: u32,
    pub total_pages: i64,
}

/// Someone the viewer may chat with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUser {
    pub id: EntityId,
    pub name: String,
    pub role: UserRole,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

/// How a user takes part in a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRelation {
    Client,
    Freelancer,
}

/// A project the user takes part in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProject {
    pub id: EntityId,
    pub title: String,
    pub status: ProjectStatus,
    pub client_id: EntityId,
    pub relation: ProjectRelation,
    pub created_at: DateTime<Utc>,
}

/// Messages of one sender that changed status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReceipt {
    pub sender_id: EntityId,
    pub message_ids: Vec<EntityId>,
}
