//! Domain entities - core business objects

mod message;
mod project;
mod user;

pub use message::{Attachment, Message, MessageStatus};
pub use project::{Bid, BidStatus, Project, ProjectStatus};
pub use user::{User, UserRole};
