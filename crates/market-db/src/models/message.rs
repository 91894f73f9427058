//! Message database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub project_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Database model for attachments table
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentModel {
    pub id: Uuid,
    pub message_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_key: String,
    pub public_id: String,
    pub checksum: Option<String>,
    pub url: String,
}

/// `RETURNING id, sender_id` row of a status update
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StatusChangeRow {
    pub id: Uuid,
    pub sender_id: Uuid,
}

/// Unread count grouped by sender
#[derive(Debug, Clone, Copy, FromRow)]
pub struct UnreadCountRow {
    pub sender_id: Uuid,
    pub count: i64,
}
