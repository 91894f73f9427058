//! Project and bid database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for projects table
#[derive(Debug, Clone, FromRow)]
pub struct ProjectModel {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub client_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Database model for bids table
#[derive(Debug, Clone, FromRow)]
pub struct BidModel {
    pub id: Uuid,
    pub project_id: Uuid,
    pub freelancer_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
