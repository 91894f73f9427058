//! Entity ID - UUID-backed identifier shared by every record
//!
//! Serialized as the hyphenated UUID string. Anything that does not parse as a
//! UUID is not a well-formed identifier.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Identifier for users, projects, bids, messages and attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a fresh random (v4) ID
    #[inline]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    #[inline]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the inner UUID
    #[inline]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, EntityIdParseError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| EntityIdParseError::InvalidFormat(s.to_string()))
    }

    /// Parse every well-formed ID in `raw`, silently dropping the rest.
    ///
    /// Duplicates are removed while keeping first-seen order.
    pub fn parse_valid<S: AsRef<str>>(raw: &[S]) -> Vec<Self> {
        let mut seen = HashSet::with_capacity(raw.len());
        raw.iter()
            .filter_map(|s| Self::parse(s.as_ref()).ok())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Error when parsing an `EntityId` from string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityIdParseError {
    #[error("invalid identifier: {0}")]
    InvalidFormat(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl std::str::FromStr for EntityId {
    type Err = EntityIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let id = EntityId::generate();
        let parsed = EntityId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(EntityId::parse("not-a-uuid").is_err());
        assert!(EntityId::parse("").is_err());
        assert!(EntityId::parse("12345").is_err());
    }

    #[test]
    fn test_parse_valid_filters_and_dedups() {
        let a = EntityId::generate();
        let b = EntityId::generate();
        let raw = vec![
            "not-a-uuid".to_string(),
            a.to_string(),
            b.to_string(),
            a.to_string(),
        ];
        assert_eq!(EntityId::parse_valid(&raw), vec![a, b]);
    }

    #[test]
    fn test_parse_valid_large_batch() {
        let distinct: Vec<EntityId> = (0..20_000).map(|_| EntityId::generate()).collect();
        let mut raw: Vec<String> = distinct.iter().map(ToString::to_string).collect();
        raw.extend(distinct.iter().rev().map(ToString::to_string));

        assert_eq!(EntityId::parse_valid(&raw), distinct);
    }

    #[test]
    fn test_serde_as_string() {
        let id = EntityId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
