//! Data transfer objects exchanged with the gateway
//!
//! - Request DTOs, deserialized from inbound event payloads and validated
//! - Response DTOs, serialized into outbound event payloads and the cache

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    parse_id, parse_optional_id, AttachmentDescriptor, AuthRequest, HistoryRequest,
    MarkAsReadRequest, ProjectUsersRequest, SendMessageRequest, UPLOADING_URL,
};
pub use responses::{
    AttachmentPayload, HistoryPage, MessagePayload, ProjectRelation, ProjectUser, ReadReceipt,
    UserProject,
};
