//! `message_send` handler

use std::sync::Arc;

use market_service::dto::{parse_id, parse_optional_id, SendMessageRequest};
use market_service::{ChatService, SendMessageCommand, ServiceError};
use validator::Validate;

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::OutboundEvent;
use crate::server::GatewayState;

/// Handles `message_send` events
pub struct MessageHandler;

impl MessageHandler {
    /// Store the message, echo it to the sender and push it to the receiver
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        request: SendMessageRequest,
    ) -> HandlerResult<()> {
        request.validate().map_err(ServiceError::from)?;

        let sender_id = connection.user_id();
        let receiver_id = parse_id(&request.receiver_id)?;
        let project_id = parse_optional_id(request.project_id.as_deref())?;
        let client_message_id = request
            .client_msg_id
            .filter(|id| !id.trim().is_empty());

        let registry = state.registry();
        let command = SendMessageCommand {
            sender_id,
            receiver_id,
            project_id,
            content: request.content,
            attachments: request.attachments,
            client_message_id,
            is_receiver_online: registry.is_online(receiver_id),
            sender_display_name: Some(connection.display_name().to_string()),
        };

        let payload = ChatService::new(state.service_context())
            .send_message(command)
            .await?;
        let event = OutboundEvent::MessageReceived(payload);

        if receiver_id != sender_id {
            registry.send_to_user(receiver_id, event.clone());
        }
        connection.send(event);
        Ok(())
    }
}
