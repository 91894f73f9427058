//! Chat service - the message delivery engine
//!
//! Sends messages (with client-id deduplication, attachments and the
//! delivered upgrade), serves cached history, contact lists and project lists,
//! and applies read/delivered transitions.
//!
//! Every mutation invalidates the cache entries it could make stale before it
//! returns. Cache failures never fail an operation; persistence failures do.

use std::collections::{HashMap, HashSet};

use market_cache::{keys, HistoryCache};
use market_core::{
    EntityId, HistoryQuery, Message, MessageStatus, Project, StatusChange, User,
};
use tracing::{debug, info, instrument, warn};

use crate::dto::mappers::group_by_sender;
use crate::dto::{
    AttachmentDescriptor, AttachmentPayload, HistoryPage, MessagePayload, ProjectRelation,
    ProjectUser, ReadReceipt, UserProject,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Sender name used when the lookup fails
const UNKNOWN_SENDER: &str = "Unknown";
const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 100;

/// Everything needed to send one message
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub sender_id: EntityId,
    pub receiver_id: EntityId,
    pub project_id: Option<EntityId>,
    pub content: String,
    pub attachments: Vec<AttachmentDescriptor>,
    pub client_message_id: Option<String>,
    pub is_receiver_online: bool,
    /// Skips the sender lookup when the caller already knows the name
    pub sender_display_name: Option<String>,
}

/// Chat service
pub struct ChatService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChatService<'a> {
    /// Create a new ChatService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    // ========================================================================
    // Send
    // ========================================================================

    /// Persist (or resolve) a message and build its outbound payload
    #[instrument(skip(self, command), fields(
        sender_id = %command.sender_id,
        receiver_id = %command.receiver_id,
        client_message_id = ?command.client_message_id,
    ))]
    pub async fn send_message(&self, command: SendMessageCommand) -> ServiceResult<MessagePayload> {
        let SendMessageCommand {
            sender_id,
            receiver_id,
            project_id,
            content,
            attachments,
            client_message_id,
            is_receiver_online,
            sender_display_name,
        } = command;

        let idempotency = self.ctx.idempotency();
        idempotency.sweep_if_due();

        let resolved = match client_message_id.as_deref() {
            Some(client_id) => self.resolve_existing(sender_id, client_id).await?,
            None => None,
        };

        let mut message = match resolved {
            Some(mut existing) => {
                if existing.content != content {
                    self.submit_content_update(&existing, content.clone());
                    existing.content = content;
                }
                debug!(message_id = %existing.id, "Resolved retried send");
                existing
            }
            None => {
                let message =
                    Message::new(EntityId::generate(), sender_id, receiver_id, project_id, content);
                self.ctx.message_repo().create(&message).await?;
                if let Some(client_id) = client_message_id.as_deref() {
                    idempotency.record(sender_id, client_id, message.id);
                }
                info!(message_id = %message.id, "Message created");
                message
            }
        };

        self.reconcile_attachments(message.id, &attachments).await?;
        let attachments: Vec<AttachmentPayload> =
            attachments.iter().map(AttachmentPayload::from).collect();

        let sender_name = match sender_display_name {
            Some(name) => name,
            None => self.display_name(sender_id).await,
        };

        if is_receiver_online && message.status == MessageStatus::Sent {
            self.submit_delivered_upgrade(&message);
            message.status = MessageStatus::Delivered;
        }

        self.invalidate_conversation(sender_id, receiver_id, message.project_id)
            .await;

        Ok(MessagePayload::from_message(
            message,
            sender_name,
            client_message_id,
            attachments,
        ))
    }

    /// Message the sender's idempotency entry points at; stale entries are dropped
    async fn resolve_existing(
        &self,
        sender_id: EntityId,
        client_id: &str,
    ) -> ServiceResult<Option<Message>> {
        let idempotency = self.ctx.idempotency();
        let Some(message_id) = idempotency.lookup(sender_id, client_id) else {
            return Ok(None);
        };

        match self.ctx.message_repo().find_by_id(message_id).await? {
            Some(message) if message.sender_id == sender_id => Ok(Some(message)),
            Some(_) | None => {
                warn!(%message_id, client_id, "Idempotency entry no longer resolves");
                idempotency.forget(sender_id, client_id);
                Ok(None)
            }
        }
    }

    /// Insert finalized attachments that are not stored yet, in one batch
    async fn reconcile_attachments(
        &self,
        message_id: EntityId,
        descriptors: &[AttachmentDescriptor],
    ) -> ServiceResult<()> {
        let finalized: Vec<&AttachmentDescriptor> =
            descriptors.iter().filter(|d| !d.is_uploading()).collect();
        if finalized.is_empty() {
            return Ok(());
        }

        let public_ids: Vec<String> = finalized.iter().map(|d| d.public_id.clone()).collect();
        let stored: HashSet<String> = self
            .ctx
            .attachment_repo()
            .find_by_public_ids(message_id, &public_ids)
            .await?
            .into_iter()
            .map(|a| a.public_id)
            .collect();

        let mut seen = HashSet::new();
        let missing: Vec<_> = finalized
            .into_iter()
            .filter(|d| !stored.contains(&d.public_id) && seen.insert(d.public_id.as_str()))
            .map(|d| d.to_entity(message_id))
            .collect();

        if !missing.is_empty() {
            self.ctx.attachment_repo().create_many(&missing).await?;
            debug!(%message_id, count = missing.len(), "Attachments stored");
        }
        Ok(())
    }

    async fn display_name(&self, user_id: EntityId) -> String {
        match self.ctx.user_repo().find_by_id(user_id).await {
            Ok(Some(user)) => user.name,
            Ok(None) => UNKNOWN_SENDER.to_string(),
            Err(e) => {
                warn!(%user_id, error = %e, "Sender lookup failed");
                UNKNOWN_SENDER.to_string()
            }
        }
    }

    fn submit_content_update(&self, message: &Message, content: String) {
        let repo = self.ctx.shared_message_repo();
        let cache = self.ctx.cache().clone();
        let (id, sender, receiver, project) = (
            message.id,
            message.sender_id,
            message.receiver_id,
            message.project_id,
        );

        self.ctx.tasks().spawn("message_content_update", async move {
            repo.update_content(id, &content).await?;
            // A read served while the edit was in flight cached the old text
            invalidate_history(&cache, &[sender, receiver], project).await;
            Ok::<(), market_core::DomainError>(())
        });
    }

    fn submit_delivered_upgrade(&self, message: &Message) {
        let repo = self.ctx.shared_message_repo();
        let cache = self.ctx.cache().clone();
        let (id, sender, receiver, project) = (
            message.id,
            message.sender_id,
            message.receiver_id,
            message.project_id,
        );

        self.ctx.tasks().spawn("message_delivered_upgrade", async move {
            repo.advance_status(id, MessageStatus::Delivered).await?;
            // Drop any snapshot cached while the row was still SENT
            invalidate_history(&cache, &[sender, receiver], project).await;
            Ok::<(), market_core::DomainError>(())
        });
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// One page of a conversation, oldest first
    #[instrument(skip(self))]
    pub async fn get_message_history(
        &self,
        user_id: EntityId,
        project_id: Option<EntityId>,
        other_user_id: Option<EntityId>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> ServiceResult<HistoryPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let key = keys::history(user_id, project_id, other_user_id, page, limit);

        if let Some(messages) = self.ctx.cache().get::<Vec<MessagePayload>>(&key).await {
            // Cached pages are not re-paginated
            return Ok(HistoryPage {
                total: messages.len() as i64,
                messages,
                page,
                total_pages: 1,
            });
        }

        let query = HistoryQuery {
            user_id,
            project_id,
            other_user_id,
            offset: i64::from(page - 1) * i64::from(limit),
            limit: i64::from(limit),
        };
        let repo = self.ctx.message_repo();
        let mut rows = repo.find_history(&query).await?;
        let total = repo.count_history(&query).await?;
        rows.reverse();

        let messages = self.to_payloads(rows).await?;
        self.ctx
            .cache()
            .set(&key, &messages, self.ctx.config().history_cache_ttl_secs)
            .await;

        Ok(HistoryPage {
            messages,
            total,
            page,
            total_pages: (total + i64::from(limit) - 1) / i64::from(limit),
        })
    }

    /// Attach sender names and stored attachments to history rows
    async fn to_payloads(&self, messages: Vec<Message>) -> ServiceResult<Vec<MessagePayload>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let message_ids: Vec<EntityId> = messages.iter().map(|m| m.id).collect();
        let mut attachments: HashMap<EntityId, Vec<AttachmentPayload>> = HashMap::new();
        for attachment in self
            .ctx
            .attachment_repo()
            .find_by_messages(&message_ids)
            .await?
        {
            attachments
                .entry(attachment.message_id)
                .or_default()
                .push(AttachmentPayload::from(&attachment));
        }

        let sender_ids: Vec<EntityId> = messages
            .iter()
            .map(|m| m.sender_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names: HashMap<EntityId, String> = self
            .ctx
            .user_repo()
            .find_by_ids(&sender_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(messages
            .into_iter()
            .map(|message| {
                let name = names
                    .get(&message.sender_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
                let files = attachments.remove(&message.id).unwrap_or_default();
                MessagePayload::from_message(message, name, None, files)
            })
            .collect())
    }

    /// People the viewer may chat with in a project (or the global channel)
    #[instrument(skip(self))]
    pub async fn get_project_users(
        &self,
        project_id: Option<EntityId>,
        current_user_id: EntityId,
    ) -> ServiceResult<Vec<ProjectUser>> {
        let key = keys::contacts(current_user_id, project_id);
        if let Some(users) = self.ctx.cache().get::<Vec<ProjectUser>>(&key).await {
            return Ok(users);
        }

        let counterparts = match project_id {
            Some(project_id) => self.project_counterparts(project_id, current_user_id).await?,
            None => self.ctx.user_repo().find_all_except(current_user_id).await?,
        };

        let unread: HashMap<EntityId, i64> = self
            .ctx
            .message_repo()
            .count_unread_by_sender(current_user_id, project_id)
            .await?
            .into_iter()
            .map(|u| (u.sender_id, u.count))
            .collect();

        let users: Vec<ProjectUser> = counterparts
            .into_iter()
            .map(|user| ProjectUser {
                unread_count: unread.get(&user.id).copied().unwrap_or(0),
                id: user.id,
                name: user.name,
                role: user.role,
                is_online: user.is_online,
                last_seen: user.last_seen,
            })
            .collect();

        self.ctx
            .cache()
            .set(&key, &users, self.ctx.config().contacts_cache_ttl_secs)
            .await;
        Ok(users)
    }

    /// Bidders for the hiring owner, otherwise the project's client
    async fn project_counterparts(
        &self,
        project_id: EntityId,
        current_user_id: EntityId,
    ) -> ServiceResult<Vec<User>> {
        let project = self
            .ctx
            .project_repo()
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project", project_id.to_string()))?;
        let viewer = self
            .ctx
            .user_repo()
            .find_by_id(current_user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", current_user_id.to_string()))?;

        let ids: Vec<EntityId> = if project.is_owned_by(current_user_id) && viewer.role.can_hire() {
            let mut seen = HashSet::new();
            self.ctx
                .bid_repo()
                .find_by_project(project_id)
                .await?
                .into_iter()
                .map(|bid| bid.freelancer_id)
                .filter(|id| *id != current_user_id && seen.insert(*id))
                .collect()
        } else if project.client_id == current_user_id {
            Vec::new()
        } else {
            vec![project.client_id]
        };

        Ok(self.ctx.user_repo().find_by_ids(&ids).await?)
    }

    /// Projects the user owns or has bid on
    #[instrument(skip(self))]
    pub async fn get_user_projects(&self, user_id: EntityId) -> ServiceResult<Vec<UserProject>> {
        let key = keys::projects(user_id);
        if let Some(projects) = self.ctx.cache().get::<Vec<UserProject>>(&key).await {
            return Ok(projects);
        }

        let owned = self.ctx.project_repo().find_by_client(user_id).await?;
        let owned_ids: HashSet<EntityId> = owned.iter().map(|p| p.id).collect();

        let mut seen = HashSet::new();
        let bid_project_ids: Vec<EntityId> = self
            .ctx
            .bid_repo()
            .find_by_freelancer(user_id)
            .await?
            .into_iter()
            .map(|bid| bid.project_id)
            .filter(|id| !owned_ids.contains(id) && seen.insert(*id))
            .collect();
        let bid_on = self.ctx.project_repo().find_by_ids(&bid_project_ids).await?;

        let projects: Vec<UserProject> = owned
            .into_iter()
            .map(|p| user_project(p, ProjectRelation::Client))
            .chain(
                bid_on
                    .into_iter()
                    .map(|p| user_project(p, ProjectRelation::Freelancer)),
            )
            .collect();

        self.ctx
            .cache()
            .set(&key, &projects, self.ctx.config().projects_cache_ttl_secs)
            .await;
        Ok(projects)
    }

    // ========================================================================
    // Status transitions
    // ========================================================================

    /// Mark messages received by `user_id` as read, grouped by sender.
    /// Malformed ids are ignored.
    #[instrument(skip(self, message_ids), fields(count = message_ids.len()))]
    pub async fn mark_messages_as_read(
        &self,
        message_ids: &[String],
        user_id: EntityId,
    ) -> ServiceResult<Vec<ReadReceipt>> {
        let ids = EntityId::parse_valid(message_ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let changes = self.ctx.message_repo().mark_read(&ids, user_id).await?;
        self.after_status_change(user_id, &changes).await;
        Ok(group_by_sender(&changes))
    }

    /// Mark every pending message for `user_id` as delivered, grouped by sender
    #[instrument(skip(self))]
    pub async fn mark_messages_as_delivered(
        &self,
        user_id: EntityId,
    ) -> ServiceResult<Vec<ReadReceipt>> {
        let changes = self.ctx.message_repo().mark_delivered(user_id).await?;
        self.after_status_change(user_id, &changes).await;
        Ok(group_by_sender(&changes))
    }

    /// Status changes touch every scope the receiver and senders share, so
    /// their whole history and contact namespaces go, along with every
    /// scope-wide page.
    async fn after_status_change(&self, receiver_id: EntityId, changes: &[StatusChange]) {
        if changes.is_empty() {
            return;
        }
        debug!(%receiver_id, count = changes.len(), "Message status advanced");

        let cache = self.ctx.cache();
        let mut users: Vec<EntityId> = vec![receiver_id];
        for change in changes {
            if !users.contains(&change.sender_id) {
                users.push(change.sender_id);
            }
        }
        for user in users {
            cache
                .invalidate_by_prefix(&keys::history_user_prefix(user))
                .await;
        }
        cache
            .invalidate_by_prefix(&keys::scope_history_all_prefix())
            .await;
        cache
            .invalidate_by_prefix(&keys::contacts_user_prefix(receiver_id))
            .await;
    }

    /// History of both participants and the receiver's unread counts
    async fn invalidate_conversation(
        &self,
        sender_id: EntityId,
        receiver_id: EntityId,
        project_id: Option<EntityId>,
    ) {
        let cache = self.ctx.cache();
        invalidate_history(cache, &[sender_id, receiver_id], project_id).await;
        cache
            .invalidate_by_prefix(&keys::contacts(receiver_id, project_id))
            .await;
    }
}

async fn invalidate_history(cache: &HistoryCache, users: &[EntityId], project_id: Option<EntityId>) {
    for user in users {
        cache
            .invalidate_by_prefix(&keys::history_prefix(*user, project_id))
            .await;
    }
    cache
        .invalidate_by_prefix(&keys::scope_history_prefix(project_id))
        .await;
}

fn user_project(project: Project, relation: ProjectRelation) -> UserProject {
    UserProject {
        id: project.id,
        title: project.title,
        status: project.status,
        client_id: project.client_id,
        relation,
        created_at: project.created_at,
    }
}
