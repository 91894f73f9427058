//! # market-core
//!
//! Domain layer for the marketplace chat: entities, value objects, and the
//! repository traits that make up the persistence gateway.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, Bid, BidStatus, Message, MessageStatus, Project, ProjectStatus, User, UserRole,
};
pub use error::DomainError;
pub use traits::{
    AttachmentRepository, BidRepository, HistoryQuery, MessageRepository, ProjectRepository,
    RepoResult, StatusChange, UnreadCount, UserRepository,
};
pub use value_objects::{EntityId, EntityIdParseError};
