//! `auth` handler

use std::sync::Arc;

use market_service::dto::AuthRequest;
use market_service::{ChatService, PresenceService};

use super::{HandlerError, HandlerResult};
use crate::connection::{Connection, Session};
use crate::protocol::{DeliveredNotice, OutboundEvent, UserSummary};
use crate::server::GatewayState;

/// Handles `auth` events
pub struct AuthHandler;

impl AuthHandler {
    /// Bind the socket to a user, announce it, and flush pending deliveries
    pub async fn handle(
        state: &GatewayState,
        session: &mut Session,
        request: AuthRequest,
    ) -> HandlerResult<()> {
        if session.is_authenticated() {
            return Err(HandlerError::AlreadyAuthenticated);
        }

        let ctx = state.service_context();
        let presence = PresenceService::new(ctx);
        let user = presence.authenticate(&request.user_id).await.map_err(|e| {
            if e.is_internal() {
                tracing::error!(connection_id = %session.id(), error = %e, "User lookup failed");
                HandlerError::AuthenticationFailed("Authentication failed".to_string())
            } else {
                tracing::debug!(connection_id = %session.id(), error = %e, "Authentication rejected");
                HandlerError::AuthenticationFailed(e.public_message())
            }
        })?;

        let connection = Connection::new(session.handle().clone(), user.id, user.name.clone());
        let registry = state.registry();
        registry.add_connection(Arc::clone(&connection));
        session.authenticate(Arc::clone(&connection));

        if let Err(e) = presence.set_online(user.id).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to persist online status");
        }

        let me = UserSummary::new(user.id, user.name.clone());
        connection.send(OutboundEvent::AuthSuccess(me.clone()));
        registry.broadcast(&OutboundEvent::UserOnline(me), Some(user.id));

        let users = registry
            .online_users()
            .into_iter()
            .filter(|(id, _)| *id != user.id)
            .map(|(id, name)| UserSummary::new(id, name))
            .collect();
        connection.send(OutboundEvent::OnlineUsers { users });

        match ChatService::new(ctx).mark_messages_as_delivered(user.id).await {
            Ok(receipts) => {
                for receipt in receipts {
                    registry.send_to_user(
                        receipt.sender_id,
                        OutboundEvent::MessageDelivered(DeliveredNotice {
                            message_ids: receipt.message_ids,
                            delivered_to: user.id,
                        }),
                    );
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to deliver pending messages");
            }
        }

        tracing::info!(
            user_id = %user.id,
            connection_id = %connection.id(),
            "User authenticated"
        );
        Ok(())
    }
}
