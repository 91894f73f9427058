//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use market_core::{DomainError, EntityId, RepoResult, User, UserRepository};

use crate::models::UserModel;

use super::error::{collect_rows, map_db_error, uuids};

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, name, role, is_online, last_seen
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(User::try_from).transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, name, role, is_online, last_seen
            FROM users
            WHERE id = ANY($1)
            ORDER BY name
            ",
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        collect_rows(rows)
    }

    #[instrument(skip(self))]
    async fn find_all_except(&self, user_id: EntityId) -> RepoResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, name, role, is_online, last_seen
            FROM users
            WHERE id <> $1
            ORDER BY name
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        collect_rows(rows)
    }

    #[instrument(skip(self))]
    async fn set_presence(
        &self,
        id: EntityId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET is_online = $2, last_seen = $3
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .bind(is_online)
        .bind(last_seen)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(id));
        }

        Ok(())
    }
}
