//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use market_core::{
    DomainError, EntityId, HistoryQuery, Message, MessageRepository, MessageStatus, RepoResult,
    StatusChange, UnreadCount,
};

use crate::mappers::statuses_before;
use crate::models::{MessageModel, StatusChangeRow, UnreadCountRow};

use super::error::{collect_rows, map_db_error, uuids};

/// Shared filter for history queries. `$1` user, `$2` project (NULL = global
/// channel), `$3` optional counterpart; without one the whole scope matches.
const HISTORY_FILTER: &str = r"
    project_id IS NOT DISTINCT FROM $2
    AND (
        $3::uuid IS NULL
        OR (sender_id = $1 AND receiver_id = $3)
        OR (sender_id = $3 AND receiver_id = $1)
    )
";

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT id, content, sender_id, receiver_id, project_id, status, created_at
            FROM messages
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Message::try_from).transpose()
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn create(&self, message: &Message) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO messages (id, content, sender_id, receiver_id, project_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(message.id.into_inner())
        .bind(&message.content)
        .bind(message.sender_id.into_inner())
        .bind(message.receiver_id.into_inner())
        .bind(message.project_id.map(EntityId::into_inner))
        .bind(message.status.as_str())
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, content))]
    async fn update_content(&self, id: EntityId, content: &str) -> RepoResult<()> {
        let result = sqlx::query("UPDATE messages SET content = $2 WHERE id = $1")
            .bind(id.into_inner())
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MessageNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn advance_status(&self, id: EntityId, target: MessageStatus) -> RepoResult<bool> {
        let from = statuses_before(target);
        if from.is_empty() {
            return Ok(false);
        }

        let result = sqlx::query(
            r"
            UPDATE messages
            SET status = $2
            WHERE id = $1 AND status = ANY($3)
            ",
        )
        .bind(id.into_inner())
        .bind(target.as_str())
        .bind(&from)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_history(&self, query: &HistoryQuery) -> RepoResult<Vec<Message>> {
        let sql = format!(
            r"
            SELECT id, content, sender_id, receiver_id, project_id, status, created_at
            FROM messages
            WHERE {HISTORY_FILTER}
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "
        );

        let rows = sqlx::query_as::<_, MessageModel>(&sql)
            .bind(query.user_id.into_inner())
            .bind(query.project_id.map(EntityId::into_inner))
            .bind(query.other_user_id.map(EntityId::into_inner))
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        collect_rows(rows)
    }

    #[instrument(skip(self))]
    async fn count_history(&self, query: &HistoryQuery) -> RepoResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM messages WHERE {HISTORY_FILTER}");

        sqlx::query_scalar::<_, i64>(&sql)
            .bind(query.user_id.into_inner())
            .bind(query.project_id.map(EntityId::into_inner))
            .bind(query.other_user_id.map(EntityId::into_inner))
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn count_unread_by_sender(
        &self,
        receiver_id: EntityId,
        project_id: Option<EntityId>,
    ) -> RepoResult<Vec<UnreadCount>> {
        let rows = sqlx::query_as::<_, UnreadCountRow>(
            r"
            SELECT sender_id, COUNT(*) AS count
            FROM messages
            WHERE receiver_id = $1
              AND project_id IS NOT DISTINCT FROM $2
              AND status <> 'READ'
            GROUP BY sender_id
            ",
        )
        .bind(receiver_id.into_inner())
        .bind(project_id.map(EntityId::into_inner))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(UnreadCount::from).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn mark_read(
        &self,
        ids: &[EntityId],
        receiver_id: EntityId,
    ) -> RepoResult<Vec<StatusChange>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, StatusChangeRow>(
            r"
            UPDATE messages
            SET status = 'READ'
            WHERE id = ANY($1) AND receiver_id = $2 AND status <> 'READ'
            RETURNING id, sender_id
            ",
        )
        .bind(uuids(ids))
        .bind(receiver_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(StatusChange::from).collect())
    }

    #[instrument(skip(self))]
    async fn mark_delivered(&self, receiver_id: EntityId) -> RepoResult<Vec<StatusChange>> {
        let rows = sqlx::query_as::<_, StatusChangeRow>(
            r"
            UPDATE messages
            SET status = 'DELIVERED'
            WHERE receiver_id = $1 AND status = 'SENT'
            RETURNING id, sender_id
            ",
        )
        .bind(receiver_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(StatusChange::from).collect())
    }
}
