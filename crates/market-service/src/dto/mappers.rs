//! Entity to DTO mappers

use market_core::{Attachment, EntityId, Message, StatusChange};

use super::requests::AttachmentDescriptor;
use super::responses::{AttachmentPayload, MessagePayload, ReadReceipt};

impl From<&Attachment> for AttachmentPayload {
    fn from(attachment: &Attachment) -> Self {
        Self {
            file_name: attachment.file_name.clone(),
            file_size: attachment.file_size,
            mime_type: attachment.mime_type.clone(),
            storage_key: attachment.storage_key.clone(),
            public_id: attachment.public_id.clone(),
            checksum: attachment.checksum.clone(),
            url: attachment.url.clone(),
        }
    }
}

impl From<&AttachmentDescriptor> for AttachmentPayload {
    fn from(descriptor: &AttachmentDescriptor) -> Self {
        Self {
            file_name: descriptor.file_name.clone(),
            file_size: descriptor.file_size,
            mime_type: descriptor.mime_type.clone(),
            storage_key: descriptor.storage_key.clone(),
            public_id: descriptor.public_id.clone(),
            checksum: descriptor.checksum.clone(),
            url: descriptor.url.clone(),
        }
    }
}

impl AttachmentDescriptor {
    /// Attachment entity for a finalized upload of `message_id`
    pub fn to_entity(&self, message_id: EntityId) -> Attachment {
        Attachment {
            id: EntityId::generate(),
            message_id,
            file_name: self.file_name.clone(),
            file_size: self.file_size,
            mime_type: self.mime_type.clone(),
            storage_key: self.storage_key.clone(),
            public_id: self.public_id.clone(),
            checksum: self.checksum.clone(),
            url: self.url.clone(),
        }
    }
}

impl MessagePayload {
    pub fn from_message(
        message: Message,
        sender_name: String,
        client_message_id: Option<String>,
        attachments: Vec<AttachmentPayload>,
    ) -> Self {
        Self {
            id: message.id,
            client_message_id,
            content: message.content,
            sender_id: message.sender_id,
            sender_name,
            receiver_id: message.receiver_id,
            project_id: message.project_id,
            status: message.status,
            created_at: message.created_at,
            attachments,
        }
    }
}

/// Group status changes by original sender, keeping first-seen order
pub fn group_by_sender(changes: &[StatusChange]) -> Vec<ReadReceipt> {
    let mut receipts: Vec<ReadReceipt> = Vec::new();
    for change in changes {
        match receipts.iter_mut().find(|r| r.sender_id == change.sender_id) {
            Some(receipt) => receipt.message_ids.push(change.message_id),
            None => receipts.push(ReadReceipt {
                sender_id: change.sender_id,
                message_ids: vec![change.message_id],
            }),
        }
    }
    receipts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_sender() {
        let (a, b) = (EntityId::generate(), EntityId::generate());
        let (m1, m2, m3) = (EntityId::generate(), EntityId::generate(), EntityId::generate());
        let changes = [
            StatusChange { message_id: m1, sender_id: a },
            StatusChange { message_id: m2, sender_id: b },
            StatusChange { message_id: m3, sender_id: a },
        ];

        let receipts = group_by_sender(&changes);
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].sender_id, a);
        assert_eq!(receipts[0].message_ids, vec![m1, m3]);
        assert_eq!(receipts[1].message_ids, vec![m2]);
    }
}
