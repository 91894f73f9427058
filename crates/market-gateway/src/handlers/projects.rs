//! `get_project_users` and `get_user_projects` handlers

use std::sync::Arc;

use market_service::dto::{parse_optional_id, ProjectUsersRequest};
use market_service::ChatService;

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::OutboundEvent;
use crate::server::GatewayState;

pub struct ProjectsHandler;

impl ProjectsHandler {
    /// Contact list for a project; online flags come from the live registry,
    /// not the (possibly cached) stored value
    pub async fn project_users(
        state: &GatewayState,
        connection: &Arc<Connection>,
        request: ProjectUsersRequest,
    ) -> HandlerResult<()> {
        let project_id = parse_optional_id(request.project_id.as_deref())?;

        let mut users = ChatService::new(state.service_context())
            .get_project_users(project_id, connection.user_id())
            .await?;
        let registry = state.registry();
        for user in &mut users {
            user.is_online = registry.is_online(user.id);
        }

        connection.send(OutboundEvent::ProjectUsers { users });
        Ok(())
    }

    pub async fn user_projects(
        state: &GatewayState,
        connection: &Arc<Connection>,
    ) -> HandlerResult<()> {
        let projects = ChatService::new(state.service_context())
            .get_user_projects(connection.user_id())
            .await?;

        connection.send(OutboundEvent::UserProjects { projects });
        Ok(())
    }
}
