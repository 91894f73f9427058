//! Event handlers
//!
//! Decodes inbound frames and routes them by session state.

mod auth;
mod error;
mod history;
mod message;
mod projects;
mod read;

pub use auth::AuthHandler;
pub use error::{HandlerError, HandlerResult};
pub use history::HistoryHandler;
pub use message::MessageHandler;
pub use projects::ProjectsHandler;
pub use read::ReadHandler;

use crate::connection::Session;
use crate::protocol::InboundEvent;
use crate::server::GatewayState;

/// Dispatch incoming client frames to handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle one text frame. Failures are answered on the socket; only a
    /// failed `auth` closes it.
    pub async fn dispatch(state: &GatewayState, session: &mut Session, text: &str) {
        let result = match InboundEvent::from_json(text) {
            Ok(event) => Self::route(state, session, event).await,
            Err(e) => Err(e.into()),
        };

        let Err(err) = result else {
            return;
        };

        if err.is_internal() {
            tracing::error!(connection_id = %session.id(), error = %err, "Handler failed");
        } else {
            tracing::debug!(connection_id = %session.id(), error = %err, "Request rejected");
        }

        session.reply(err.to_event());
        if let Some(code) = err.close_code() {
            session.handle().close(code);
        }
    }

    async fn route(
        state: &GatewayState,
        session: &mut Session,
        event: InboundEvent,
    ) -> HandlerResult<()> {
        if let InboundEvent::Auth(request) = event {
            return AuthHandler::handle(state, session, request).await;
        }

        let Some(connection) = session.connection().cloned() else {
            if event.is_mutation() {
                return Err(HandlerError::NotAuthenticated);
            }
            tracing::trace!(
                connection_id = %session.id(),
                event = event.name(),
                "Ignoring event before auth"
            );
            return Ok(());
        };

        tracing::trace!(
            user_id = %connection.user_id(),
            event = event.name(),
            "Received event"
        );

        match event {
            InboundEvent::MessageSend(request) => {
                MessageHandler::handle(state, &connection, request).await
            }
            InboundEvent::MessageHistory(request) => {
                HistoryHandler::handle(state, &connection, request).await
            }
            InboundEvent::GetProjectUsers(request) => {
                ProjectsHandler::project_users(state, &connection, request).await
            }
            InboundEvent::GetUserProjects => ProjectsHandler::user_projects(state, &connection).await,
            InboundEvent::MarkAsRead(request) => {
                ReadHandler::handle(state, &connection, request).await
            }
            InboundEvent::Unknown(kind) => Err(HandlerError::UnknownEvent(kind)),
            // Handled above
            InboundEvent::Auth(_) => Err(HandlerError::AlreadyAuthenticated),
        }
    }
}
