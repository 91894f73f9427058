//! PostgreSQL implementations of ProjectRepository and BidRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use market_core::{Bid, BidRepository, EntityId, Project, ProjectRepository, RepoResult};

use crate::models::{BidModel, ProjectModel};

use super::error::{collect_rows, map_db_error, uuids};

/// PostgreSQL implementation of ProjectRepository
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    /// Create a new PgProjectRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Project>> {
        let result = sqlx::query_as::<_, ProjectModel>(
            r"
            SELECT id, title, status, client_id, created_at
            FROM projects
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Project::try_from).transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProjectModel>(
            r"
            SELECT id, title, status, client_id, created_at
            FROM projects
            WHERE id = ANY($1)
            ORDER BY created_at DESC
            ",
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        collect_rows(rows)
    }

    #[instrument(skip(self))]
    async fn find_by_client(&self, client_id: EntityId) -> RepoResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectModel>(
            r"
            SELECT id, title, status, client_id, created_at
            FROM projects
            WHERE client_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(client_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        collect_rows(rows)
    }
}

/// PostgreSQL implementation of BidRepository
#[derive(Clone)]
pub struct PgBidRepository {
    pool: PgPool,
}

impl PgBidRepository {
    /// Create a new PgBidRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BidRepository for PgBidRepository {
    #[instrument(skip(self))]
    async fn find_by_project(&self, project_id: EntityId) -> RepoResult<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidModel>(
            r"
            SELECT id, project_id, freelancer_id, status, created_at
            FROM bids
            WHERE project_id = $1
            ORDER BY created_at
            ",
        )
        .bind(project_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        collect_rows(rows)
    }

    #[instrument(skip(self))]
    async fn find_by_freelancer(&self, freelancer_id: EntityId) -> RepoResult<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidModel>(
            r"
            SELECT id, project_id, freelancer_id, status, created_at
            FROM bids
            WHERE freelancer_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(freelancer_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        collect_rows(rows)
    }
}
