//! Repository traits (ports) - define the interface for data access
//!
//! The chat subsystem never talks to storage directly. It asks for what it
//! needs through these traits, and the infrastructure layer provides the
//! implementation (PostgreSQL or in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Attachment, Bid, Message, MessageStatus, Project, User};
use crate::error::DomainError;
use crate::value_objects::EntityId;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository (identity check)
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<User>>;

    /// Find every user in `ids` (missing IDs are skipped)
    async fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<User>>;

    /// List every user except `user_id`, ordered by name
    async fn find_all_except(&self, user_id: EntityId) -> RepoResult<Vec<User>>;

    /// Persist a presence change
    async fn set_presence(
        &self,
        id: EntityId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> RepoResult<()>;
}

// ============================================================================
// Project / Bid Repositories
// ============================================================================

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Find project by ID
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Project>>;

    /// Find every project in `ids`
    async fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<Project>>;

    /// List projects owned by a client, newest first
    async fn find_by_client(&self, client_id: EntityId) -> RepoResult<Vec<Project>>;
}

#[async_trait]
pub trait BidRepository: Send + Sync {
    /// List bids placed on a project
    async fn find_by_project(&self, project_id: EntityId) -> RepoResult<Vec<Bid>>;

    /// List bids placed by a freelancer
    async fn find_by_freelancer(&self, freelancer_id: EntityId) -> RepoResult<Vec<Bid>>;
}

// ============================================================================
// Message Repository
// ============================================================================

/// Filter and pagination for history queries
///
/// `project_id = None` matches only global-channel messages, not "any project".
/// Without `other_user_id` every message of the scope matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub user_id: EntityId,
    pub project_id: Option<EntityId>,
    /// Restrict to the conversation between `user_id` and this user (either direction)
    pub other_user_id: Option<EntityId>,
    pub offset: i64,
    pub limit: i64,
}

impl HistoryQuery {
    /// Check whether a message matches this filter (ignores pagination)
    pub fn matches(&self, message: &Message) -> bool {
        if message.project_id != self.project_id {
            return false;
        }
        match self.other_user_id {
            Some(other) => {
                (message.sender_id == self.user_id && message.receiver_id == other)
                    || (message.sender_id == other && message.receiver_id == self.user_id)
            }
            None => true,
        }
    }
}

/// One message moved to a new status, with its original sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub message_id: EntityId,
    pub sender_id: EntityId,
}

/// Unread message count from one sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadCount {
    pub sender_id: EntityId,
    pub count: i64,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Message>>;

    /// Create a new message
    async fn create(&self, message: &Message) -> RepoResult<()>;

    /// Replace message content
    async fn update_content(&self, id: EntityId, content: &str) -> RepoResult<()>;

    /// Move one message forward to `target`. Returns `false` when the message
    /// is missing or already at or past `target`.
    async fn advance_status(&self, id: EntityId, target: MessageStatus) -> RepoResult<bool>;

    /// Page of matching messages, newest first
    async fn find_history(&self, query: &HistoryQuery) -> RepoResult<Vec<Message>>;

    /// Total number of messages matching the filter (ignores pagination)
    async fn count_history(&self, query: &HistoryQuery) -> RepoResult<i64>;

    /// Count non-read messages addressed to `receiver_id`, grouped by sender
    async fn count_unread_by_sender(
        &self,
        receiver_id: EntityId,
        project_id: Option<EntityId>,
    ) -> RepoResult<Vec<UnreadCount>>;

    /// Mark the given messages received by `receiver_id` as read in one batch.
    /// Only messages not already read are touched.
    async fn mark_read(
        &self,
        ids: &[EntityId],
        receiver_id: EntityId,
    ) -> RepoResult<Vec<StatusChange>>;

    /// Mark every still-`Sent` message received by `receiver_id` as delivered
    async fn mark_delivered(&self, receiver_id: EntityId) -> RepoResult<Vec<StatusChange>>;
}

// ============================================================================
// Attachment Repository
// ============================================================================

#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// List attachments of several messages at once
    async fn find_by_messages(&self, message_ids: &[EntityId]) -> RepoResult<Vec<Attachment>>;

    /// Attachments of a message whose public id is in `public_ids`
    async fn find_by_public_ids(
        &self,
        message_id: EntityId,
        public_ids: &[String],
    ) -> RepoResult<Vec<Attachment>>;

    /// Insert all attachments atomically (all or none)
    async fn create_many(&self, attachments: &[Attachment]) -> RepoResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_query_project_scope() {
        let (a, b) = (EntityId::generate(), EntityId::generate());
        let project = EntityId::generate();
        let global = Message::new(EntityId::generate(), a, b, None, "g".into());
        let scoped = Message::new(EntityId::generate(), a, b, Some(project), "p".into());

        let query = HistoryQuery {
            user_id: a,
            project_id: None,
            other_user_id: None,
            offset: 0,
            limit: 50,
        };
        assert!(query.matches(&global));
        assert!(!query.matches(&scoped));

        // Scope-wide history is not limited to the viewer's own messages
        let (c, d) = (EntityId::generate(), EntityId::generate());
        assert!(query.matches(&Message::new(EntityId::generate(), c, d, None, "x".into())));

        let query = HistoryQuery {
            project_id: Some(project),
            ..query
        };
        assert!(!query.matches(&global));
        assert!(query.matches(&scoped));
    }

    #[test]
    fn test_history_query_pair_either_direction() {
        let (a, b, c) = (EntityId::generate(), EntityId::generate(), EntityId::generate());
        let query = HistoryQuery {
            user_id: a,
            project_id: None,
            other_user_id: Some(b),
            offset: 0,
            limit: 50,
        };

        assert!(query.matches(&Message::new(EntityId::generate(), a, b, None, "x".into())));
        assert!(query.matches(&Message::new(EntityId::generate(), b, a, None, "x".into())));
        assert!(!query.matches(&Message::new(EntityId::generate(), a, c, None, "x".into())));
        assert!(!query.matches(&Message::new(EntityId::generate(), c, b, None, "x".into())));
    }
}
