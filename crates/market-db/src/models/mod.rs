//! Database models - SQLx-compatible structs for PostgreSQL tables

mod message;
mod project;
mod user;

pub use message::{AttachmentModel, MessageModel, StatusChangeRow, UnreadCountRow};
pub use project::{BidModel, ProjectModel};
pub use user::UserModel;
