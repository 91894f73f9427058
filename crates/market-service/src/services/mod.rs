//! Business logic services

pub mod chat;
pub mod context;
pub mod error;
pub mod idempotency;
pub mod presence;
pub mod tasks;

pub use chat::{ChatService, SendMessageCommand};
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use idempotency::IdempotencyStore;
pub use presence::PresenceService;
pub use tasks::BackgroundTasks;
