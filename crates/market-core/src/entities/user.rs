//! User entity - the identity record the chat subsystem resolves on connect

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::EntityId;

/// Marketplace role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Posts projects and hires
    Client,
    /// Bids on projects
    #[default]
    Freelancer,
    /// Both posts projects and bids
    Both,
}

impl UserRole {
    /// Get the string representation stored in the database
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Freelancer => "FREELANCER",
            Self::Both => "BOTH",
        }
    }

    /// Whether this role may own projects (and so talk to bidders)
    #[inline]
    #[must_use]
    pub const fn can_hire(self) -> bool {
        matches!(self, Self::Client | Self::Both)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CLIENT" => Ok(Self::Client),
            "FREELANCER" => Ok(Self::Freelancer),
            "BOTH" => Ok(Self::Both),
            _ => Err(format!("Invalid role: {s}")),
        }
    }
}

/// User entity as seen by the chat subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub role: UserRole,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new offline User
    pub fn new(id: EntityId, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            is_online: false,
            last_seen: None,
        }
    }

    /// Record a presence change
    pub fn set_presence(&mut self, online: bool, at: DateTime<Utc>) {
        self.is_online = online;
        self.last_seen = Some(at);
    }
}
