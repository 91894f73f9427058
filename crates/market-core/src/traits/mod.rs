//! Repository traits (ports) for the persistence gateway

mod repositories;

pub use repositories::{
    AttachmentRepository, BidRepository, HistoryQuery, MessageRepository, ProjectRepository,
    RepoResult, StatusChange, UnreadCount, UserRepository,
};
