//! In-memory persistence store
//!
//! Implements every repository trait over process-local collections. Used by
//! tests and by local runs started with `DATABASE_URL=memory://`. Data is lost
//! when the process exits.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::instrument;

use market_core::{
    Attachment, AttachmentRepository, Bid, BidRepository, DomainError, EntityId, HistoryQuery,
    Message, MessageRepository, MessageStatus, Project, ProjectRepository, RepoResult,
    StatusChange, UnreadCount, User, UserRepository,
};

/// Process-local store for users, projects, bids, messages and attachments
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<EntityId, User>>,
    projects: RwLock<HashMap<EntityId, Project>>,
    bids: RwLock<Vec<Bid>>,
    /// Insertion order breaks ties between equal timestamps
    messages: RwLock<Vec<Message>>,
    attachments: RwLock<Vec<Attachment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user
    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    /// Insert or replace a project
    pub fn insert_project(&self, project: Project) {
        self.projects.write().insert(project.id, project);
    }

    /// Record a bid
    pub fn insert_bid(&self, bid: Bid) {
        self.bids.write().push(bid);
    }

    /// Number of stored messages
    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }

    /// Number of stored attachments
    pub fn attachment_count(&self) -> usize {
        self.attachments.read().len()
    }

    /// Matching messages, newest first
    fn history(&self, query: &HistoryQuery) -> Vec<Message> {
        let messages = self.messages.read();
        let mut matching: Vec<(usize, &Message)> = messages
            .iter()
            .enumerate()
            .filter(|(_, message)| query.matches(message))
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| (b.created_at, ib).cmp(&(a.created_at, ia)));
        matching.into_iter().map(|(_, message)| message.clone()).collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<User>> {
        let wanted: HashSet<&EntityId> = ids.iter().collect();
        let mut found: Vec<User> = self
            .users
            .read()
            .values()
            .filter(|user| wanted.contains(&user.id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn find_all_except(&self, user_id: EntityId) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .values()
            .filter(|user| user.id != user_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn set_presence(
        &self,
        id: EntityId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.set_presence(is_online, last_seen);
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Project>> {
        Ok(self.projects.read().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<Project>> {
        let wanted: HashSet<&EntityId> = ids.iter().collect();
        let mut projects: Vec<Project> = self
            .projects
            .read()
            .values()
            .filter(|project| wanted.contains(&project.id))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn find_by_client(&self, client_id: EntityId) -> RepoResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .projects
            .read()
            .values()
            .filter(|project| project.is_owned_by(client_id))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }
}

#[async_trait]
impl BidRepository for InMemoryStore {
    async fn find_by_project(&self, project_id: EntityId) -> RepoResult<Vec<Bid>> {
        Ok(self
            .bids
            .read()
            .iter()
            .filter(|bid| bid.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn find_by_freelancer(&self, freelancer_id: EntityId) -> RepoResult<Vec<Bid>> {
        Ok(self
            .bids
            .read()
            .iter()
            .rev()
            .filter(|bid| bid.freelancer_id == freelancer_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Message>> {
        Ok(self.messages.read().iter().find(|m| m.id == id).cloned())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn create(&self, message: &Message) -> RepoResult<()> {
        let mut messages = self.messages.write();
        if messages.iter().any(|m| m.id == message.id) {
            return Err(DomainError::DatabaseError(format!(
                "duplicate message id {}",
                message.id
            )));
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn update_content(&self, id: EntityId, content: &str) -> RepoResult<()> {
        let mut messages = self.messages.write();
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::MessageNotFound(id))?;
        message.content = content.to_string();
        Ok(())
    }

    async fn advance_status(&self, id: EntityId, target: MessageStatus) -> RepoResult<bool> {
        let mut messages = self.messages.write();
        Ok(messages
            .iter_mut()
            .find(|m| m.id == id)
            .is_some_and(|message| message.advance_to(target)))
    }

    async fn find_history(&self, query: &HistoryQuery) -> RepoResult<Vec<Message>> {
        let offset = usize::try_from(query.offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit.max(0)).unwrap_or(usize::MAX);
        Ok(self.history(query).into_iter().skip(offset).take(limit).collect())
    }

    async fn count_history(&self, query: &HistoryQuery) -> RepoResult<i64> {
        let count = self
            .messages
            .read()
            .iter()
            .filter(|message| query.matches(message))
            .count();
        Ok(count as i64)
    }

    async fn count_unread_by_sender(
        &self,
        receiver_id: EntityId,
        project_id: Option<EntityId>,
    ) -> RepoResult<Vec<UnreadCount>> {
        let mut counts: HashMap<EntityId, i64> = HashMap::new();
        for message in self.messages.read().iter().filter(|m| {
            m.receiver_id == receiver_id
                && m.project_id == project_id
                && m.status != MessageStatus::Read
        }) {
            *counts.entry(message.sender_id).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(sender_id, count)| UnreadCount { sender_id, count })
            .collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn mark_read(
        &self,
        ids: &[EntityId],
        receiver_id: EntityId,
    ) -> RepoResult<Vec<StatusChange>> {
        let wanted: HashSet<&EntityId> = ids.iter().collect();
        let mut changed = Vec::new();

        for message in self.messages.write().iter_mut() {
            if wanted.contains(&message.id)
                && message.receiver_id == receiver_id
                && message.advance_to(MessageStatus::Read)
            {
                changed.push(StatusChange {
                    message_id: message.id,
                    sender_id: message.sender_id,
                });
            }
        }

        Ok(changed)
    }

    #[instrument(skip(self))]
    async fn mark_delivered(&self, receiver_id: EntityId) -> RepoResult<Vec<StatusChange>> {
        let mut changed = Vec::new();

        for message in self.messages.write().iter_mut() {
            if message.receiver_id == receiver_id
                && message.status == MessageStatus::Sent
                && message.advance_to(MessageStatus::Delivered)
            {
                changed.push(StatusChange {
                    message_id: message.id,
                    sender_id: message.sender_id,
                });
            }
        }

        Ok(changed)
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryStore {
    async fn find_by_messages(&self, message_ids: &[EntityId]) -> RepoResult<Vec<Attachment>> {
        let wanted: HashSet<&EntityId> = message_ids.iter().collect();
        Ok(self
            .attachments
            .read()
            .iter()
            .filter(|a| wanted.contains(&a.message_id))
            .cloned()
            .collect())
    }

    async fn find_by_public_ids(
        &self,
        message_id: EntityId,
        public_ids: &[String],
    ) -> RepoResult<Vec<Attachment>> {
        Ok(self
            .attachments
            .read()
            .iter()
            .filter(|a| a.message_id == message_id && public_ids.contains(&a.public_id))
            .cloned()
            .collect())
    }

    #[instrument(skip(self, attachments), fields(count = attachments.len()))]
    async fn create_many(&self, attachments: &[Attachment]) -> RepoResult<()> {
        let mut stored = self.attachments.write();

        // Check the whole batch before inserting anything
        let mut keys: HashSet<(EntityId, &str)> = stored
            .iter()
            .map(|a| (a.message_id, a.public_id.as_str()))
            .collect();
        for attachment in attachments {
            if !keys.insert((attachment.message_id, attachment.public_id.as_str())) {
                return Err(DomainError::DatabaseError(format!(
                    "duplicate attachment {} on message {}",
                    attachment.public_id, attachment.message_id
                )));
            }
        }

        stored.extend(attachments.iter().cloned());
        Ok(())
    }
}
