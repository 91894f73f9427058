//! Model to entity mappers
//!
//! Rows become domain objects through `TryFrom`. Enum columns are stored as
//! text, so a row carrying an unknown value surfaces as a database error
//! instead of being guessed at.

mod message;
mod project;
mod user;

use market_core::DomainError;
use std::str::FromStr;

pub use message::statuses_before;

/// Parse a text column into its enum, reporting the column on failure
fn parse_column<T: FromStr<Err = String>>(column: &str, value: &str) -> Result<T, DomainError> {
    value
        .parse()
        .map_err(|e| DomainError::DatabaseError(format!("{column}: {e}")))
}
