//! PostgreSQL implementation of AttachmentRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use market_core::{Attachment, AttachmentRepository, EntityId, RepoResult};

use crate::models::AttachmentModel;

use super::error::{map_db_error, uuids};

/// PostgreSQL implementation of AttachmentRepository
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: PgPool,
}

impl PgAttachmentRepository {
    /// Create a new PgAttachmentRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    #[instrument(skip(self, message_ids), fields(count = message_ids.len()))]
    async fn find_by_messages(&self, message_ids: &[EntityId]) -> RepoResult<Vec<Attachment>> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AttachmentModel>(
            r"
            SELECT id, message_id, file_name, file_size, mime_type, storage_key, public_id, checksum, url
            FROM attachments
            WHERE message_id = ANY($1)
            ",
        )
        .bind(uuids(message_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Attachment::from).collect())
    }

    #[instrument(skip(self, public_ids), fields(count = public_ids.len()))]
    async fn find_by_public_ids(
        &self,
        message_id: EntityId,
        public_ids: &[String],
    ) -> RepoResult<Vec<Attachment>> {
        if public_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AttachmentModel>(
            r"
            SELECT id, message_id, file_name, file_size, mime_type, storage_key, public_id, checksum, url
            FROM attachments
            WHERE message_id = $1 AND public_id = ANY($2)
            ",
        )
        .bind(message_id.into_inner())
        .bind(public_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Attachment::from).collect())
    }

    #[instrument(skip(self, attachments), fields(count = attachments.len()))]
    async fn create_many(&self, attachments: &[Attachment]) -> RepoResult<()> {
        if attachments.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for attachment in attachments {
            sqlx::query(
                r"
                INSERT INTO attachments
                    (id, message_id, file_name, file_size, mime_type, storage_key, public_id, checksum, url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(attachment.id.into_inner())
            .bind(attachment.message_id.into_inner())
            .bind(&attachment.file_name)
            .bind(attachment.file_size)
            .bind(&attachment.mime_type)
            .bind(&attachment.storage_key)
            .bind(&attachment.public_id)
            .bind(&attachment.checksum)
            .bind(&attachment.url)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }
}
