//! Error handling utilities for repositories

use market_core::{DomainError, EntityId};
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Unwrap a slice of IDs for `= ANY($n)` binds
pub fn uuids(ids: &[EntityId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_inner()).collect()
}

/// Convert a batch of rows, failing on the first bad one
pub fn collect_rows<M, E>(rows: Vec<M>) -> Result<Vec<E>, DomainError>
where
    E: TryFrom<M, Error = DomainError>,
{
    rows.into_iter().map(E::try_from).collect()
}
