//! Presence service
//!
//! Identity check on connect and the persisted online flag / last-seen time.

use chrono::Utc;
use market_core::{EntityId, User};
use tracing::{info, instrument};

use crate::dto::parse_id;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Presence service
pub struct PresenceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PresenceService<'a> {
    /// Create a new PresenceService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Resolve the user a connection claims to be
    #[instrument(skip(self))]
    pub async fn authenticate(&self, raw_user_id: &str) -> ServiceResult<User> {
        let user_id = parse_id(raw_user_id)?;
        self.ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id.to_string()))
    }

    /// Persist that the user is online now
    #[instrument(skip(self))]
    pub async fn set_online(&self, user_id: EntityId) -> ServiceResult<()> {
        self.ctx
            .user_repo()
            .set_presence(user_id, true, Utc::now())
            .await?;
        info!(%user_id, "User online");
        Ok(())
    }

    /// Persist that the user went offline now
    #[instrument(skip(self))]
    pub async fn set_offline(&self, user_id: EntityId) -> ServiceResult<()> {
        self.ctx
            .user_repo()
            .set_presence(user_id, false, Utc::now())
            .await?;
        info!(%user_id, "User offline");
        Ok(())
    }
}
