//! Cache key namespaces
//!
//! Keys lead with the viewing user so everything cached for one user (in one
//! scope, or across all of them) sits under a single prefix. Scope-wide
//! history looks the same to every viewer and is shared under
//! `chat:history:scope:`.

use market_core::EntityId;

const HISTORY: &str = "chat:history";
const SCOPE_HISTORY: &str = "chat:history:scope";
const CONTACTS: &str = "chat:contacts";
const PROJECTS: &str = "chat:projects";

/// `projectId` or `global`
fn scope(project_id: Option<EntityId>) -> String {
    project_id.map_or_else(|| "global".to_string(), |id| id.to_string())
}

/// One page of history as seen by `user_id`
pub fn history(
    user_id: EntityId,
    project_id: Option<EntityId>,
    other_user_id: Option<EntityId>,
    page: u32,
    limit: u32,
) -> String {
    match other_user_id {
        Some(other) => format!(
            "{HISTORY}:{user_id}:{}:{other}:{page}:{limit}",
            scope(project_id)
        ),
        None => format!("{SCOPE_HISTORY}:{}:{page}:{limit}", scope(project_id)),
    }
}

/// Every scope-wide history page of one scope
pub fn scope_history_prefix(project_id: Option<EntityId>) -> String {
    format!("{SCOPE_HISTORY}:{}:", scope(project_id))
}

/// Every scope-wide history page
pub fn scope_history_all_prefix() -> String {
    format!("{SCOPE_HISTORY}:")
}

/// Every history page of `user_id` in one scope
pub fn history_prefix(user_id: EntityId, project_id: Option<EntityId>) -> String {
    format!("{HISTORY}:{user_id}:{}:", scope(project_id))
}

/// Every history page of `user_id` in any scope
pub fn history_user_prefix(user_id: EntityId) -> String {
    format!("{HISTORY}:{user_id}:")
}

/// Contact list of `user_id` in one scope
pub fn contacts(user_id: EntityId, project_id: Option<EntityId>) -> String {
    format!("{CONTACTS}:{user_id}:{}", scope(project_id))
}

/// Every contact list of `user_id`
pub fn contacts_user_prefix(user_id: EntityId) -> String {
    format!("{CONTACTS}:{user_id}:")
}

/// Project list of `user_id`
pub fn projects(user_id: EntityId) -> String {
    format!("{PROJECTS}:{user_id}")
}
