//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in market-core.

mod attachment;
mod error;
mod message;
mod project;
mod user;

pub use attachment::PgAttachmentRepository;
pub use message::PgMessageRepository;
pub use project::{PgBidRepository, PgProjectRepository};
pub use user::PgUserRepository;
