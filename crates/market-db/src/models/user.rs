//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}
