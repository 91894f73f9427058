//! Request DTOs for inbound chat events
//!
//! Field names follow the wire protocol: camelCase, except `receiver_id` on
//! `message_send`, which clients send in snake case.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use market_core::{DomainError, EntityId};

/// URL placeholder for an attachment whose upload has not finished
pub const UPLOADING_URL: &str = "uploading";

/// Most message ids one `mark_as_read` may carry
pub const MAX_READ_BATCH: u64 = 1000;

/// Parse a required identifier
pub fn parse_id(raw: &str) -> Result<EntityId, DomainError> {
    EntityId::parse(raw).map_err(|e| DomainError::InvalidId(e.to_string()))
}

/// Parse an optional identifier; blank means absent
pub fn parse_optional_id(raw: Option<&str>) -> Result<Option<EntityId>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => parse_id(id).map(Some),
    }
}

/// `auth` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub user_id: String,
}

/// `message_send` payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_not_empty"))]
pub struct SendMessageRequest {
    #[serde(rename = "receiver_id", alias = "receiverId")]
    pub receiver_id: String,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Message must be at most 5000 characters"))]
    pub content: String,

    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 attachments per message"), nested)]
    pub attachments: Vec<AttachmentDescriptor>,

    #[serde(default, alias = "clientMessageId")]
    pub client_msg_id: Option<String>,
}

fn validate_not_empty(request: &SendMessageRequest) -> Result<(), ValidationError> {
    if request.content.trim().is_empty() && request.attachments.is_empty() {
        let mut error = ValidationError::new("empty_message");
        error.message = Some("Message must have content or attachments".into());
        return Err(error);
    }
    Ok(())
}

/// Attachment as described by the client
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: String,

    #[validate(range(min = 0, message = "File size cannot be negative"))]
    pub file_size: i64,

    pub mime_type: String,

    #[serde(default)]
    pub storage_key: String,

    pub public_id: String,

    #[serde(default)]
    pub checksum: Option<String>,

    pub url: String,
}

impl AttachmentDescriptor {
    /// Whether the upload is still in progress
    pub fn is_uploading(&self) -> bool {
        self.url == UPLOADING_URL
    }
}

/// `message_history` payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub other_user_id: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// `get_project_users` payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUsersRequest {
    #[serde(default)]
    pub project_id: Option<String>,
}

/// `mark_as_read` payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadRequest {
    #[serde(default)]
    #[validate(length(max = MAX_READ_BATCH, message = "At most 1000 message ids per call"))]
    pub message_ids: Vec<String>,
}
