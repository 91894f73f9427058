//! Message entity - a direct chat message, optionally scoped to a project

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::EntityId;

/// Delivery status of a message
///
/// Transitions are monotonic: `Sent -> Delivered -> Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    /// Position in the status order
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Sent => 0,
            Self::Delivered => 1,
            Self::Read => 2,
        }
    }

    /// Whether moving from `self` to `target` goes forward
    #[inline]
    #[must_use]
    pub const fn can_advance_to(self, target: Self) -> bool {
        target.rank() > self.rank()
    }

    /// Get the string representation stored in the database
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Delivered => "DELIVERED",
            Self::Read => "READ",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SENT" => Ok(Self::Sent),
            "DELIVERED" => Ok(Self::Delivered),
            "READ" => Ok(Self::Read),
            _ => Err(format!("Invalid message status: {s}")),
        }
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: EntityId,
    pub content: String,
    pub sender_id: EntityId,
    pub receiver_id: EntityId,
    /// `None` is the global channel
    pub project_id: Option<EntityId>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message in `Sent` state
    pub fn new(
        id: EntityId,
        sender_id: EntityId,
        receiver_id: EntityId,
        project_id: Option<EntityId>,
        content: String,
    ) -> Self {
        Self {
            id,
            content,
            sender_id,
            receiver_id,
            project_id,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
        }
    }

    /// Check if the message belongs to the global channel
    #[inline]
    pub fn is_global(&self) -> bool {
        self.project_id.is_none()
    }

    /// Move the status forward. Returns `false` (and leaves the status alone)
    /// when `target` is not ahead of the current status.
    pub fn advance_to(&mut self, target: MessageStatus) -> bool {
        if self.status.can_advance_to(target) {
            self.status = target;
            true
        } else {
            false
        }
    }
}

/// Attachment entity (insert-only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: EntityId,
    pub message_id: EntityId,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_key: String,
    pub public_id: String,
    pub checksum: Option<String>,
    pub url: String,
}
