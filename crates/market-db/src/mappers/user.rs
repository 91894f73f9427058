//! User model -> entity mapper

use market_core::{DomainError, EntityId, User};

use super::parse_column;
use crate::models::UserModel;

impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        Ok(User {
            id: EntityId::from_uuid(model.id),
            name: model.name,
            role: parse_column("users.role", &model.role)?,
            is_online: model.is_online,
            last_seen: model.last_seen,
        })
    }
}
