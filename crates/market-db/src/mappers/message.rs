//! Message and attachment model -> entity mappers

use market_core::{
    Attachment, DomainError, EntityId, Message, MessageStatus, StatusChange, UnreadCount,
};

use super::parse_column;
use crate::models::{AttachmentModel, MessageModel, StatusChangeRow, UnreadCountRow};

impl TryFrom<MessageModel> for Message {
    type Error = DomainError;

    fn try_from(model: MessageModel) -> Result<Self, Self::Error> {
        Ok(Message {
            id: EntityId::from_uuid(model.id),
            content: model.content,
            sender_id: EntityId::from_uuid(model.sender_id),
            receiver_id: EntityId::from_uuid(model.receiver_id),
            project_id: model.project_id.map(EntityId::from_uuid),
            status: parse_column("messages.status", &model.status)?,
            created_at: model.created_at,
        })
    }
}

impl From<AttachmentModel> for Attachment {
    fn from(model: AttachmentModel) -> Self {
        Attachment {
            id: EntityId::from_uuid(model.id),
            message_id: EntityId::from_uuid(model.message_id),
            file_name: model.file_name,
            file_size: model.file_size,
            mime_type: model.mime_type,
            storage_key: model.storage_key,
            public_id: model.public_id,
            checksum: model.checksum,
            url: model.url,
        }
    }
}

impl From<StatusChangeRow> for StatusChange {
    fn from(row: StatusChangeRow) -> Self {
        StatusChange {
            message_id: EntityId::from_uuid(row.id),
            sender_id: EntityId::from_uuid(row.sender_id),
        }
    }
}

impl From<UnreadCountRow> for UnreadCount {
    fn from(row: UnreadCountRow) -> Self {
        UnreadCount {
            sender_id: EntityId::from_uuid(row.sender_id),
            count: row.count,
        }
    }
}

/// Stored status values that may still move forward to `target`
pub fn statuses_before(target: MessageStatus) -> Vec<String> {
    [MessageStatus::Sent, MessageStatus::Delivered, MessageStatus::Read]
        .into_iter()
        .filter(|status| status.can_advance_to(target))
        .map(|status| status.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_before() {
        assert!(statuses_before(MessageStatus::Sent).is_empty());
        assert_eq!(statuses_before(MessageStatus::Delivered), vec!["SENT"]);
        assert_eq!(statuses_before(MessageStatus::Read), vec!["SENT", "DELIVERED"]);
    }
}
