//! Project and Bid entities - read-only projections used to work out who may chat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::EntityId;

/// Lifecycle of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid project status: {s}")),
        }
    }
}

/// Project posted by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: EntityId,
    pub title: String,
    pub status: ProjectStatus,
    pub client_id: EntityId,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: EntityId, title: impl Into<String>, client_id: EntityId) -> Self {
        Self {
            id,
            title: title.into(),
            status: ProjectStatus::Open,
            client_id,
            created_at: Utc::now(),
        }
    }

    /// Check if the given user owns this project
    #[inline]
    pub fn is_owned_by(&self, user_id: EntityId) -> bool {
        self.client_id == user_id
    }
}

/// State of a bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl BidStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::str::FromStr for BidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(format!("Invalid bid status: {s}")),
        }
    }
}

/// Bid placed by a freelancer on a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bid {
    pub id: EntityId,
    pub project_id: EntityId,
    pub freelancer_id: EntityId,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    pub fn new(id: EntityId, project_id: EntityId, freelancer_id: EntityId) -> Self {
        Self {
            id,
            project_id,
            freelancer_id,
            status: BidStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
