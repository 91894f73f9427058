//! Project and bid model -> entity mappers

use market_core::{Bid, DomainError, EntityId, Project};

use super::parse_column;
use crate::models::{BidModel, ProjectModel};

impl TryFrom<ProjectModel> for Project {
    type Error = DomainError;

    fn try_from(model: ProjectModel) -> Result<Self, Self::Error> {
        Ok(Project {
            id: EntityId::from_uuid(model.id),
            title: model.title,
            status: parse_column("projects.status", &model.status)?,
            client_id: EntityId::from_uuid(model.client_id),
            created_at: model.created_at,
        })
    }
}

impl TryFrom<BidModel> for Bid {
    type Error = DomainError;

    fn try_from(model: BidModel) -> Result<Self, Self::Error> {
        Ok(Bid {
            id: EntityId::from_uuid(model.id),
            project_id: EntityId::from_uuid(model.project_id),
            freelancer_id: EntityId::from_uuid(model.freelancer_id),
            status: parse_column("bids.status", &model.status)?,
            created_at: model.created_at,
        })
    }
}
