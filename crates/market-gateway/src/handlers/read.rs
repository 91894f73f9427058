//! `mark_as_read` handler

use std::sync::Arc;

use market_service::dto::MarkAsReadRequest;
use market_service::{ChatService, ServiceError};
use validator::Validate;

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::{OutboundEvent, ReadNotice};
use crate::server::GatewayState;

pub struct ReadHandler;

impl ReadHandler {
    /// Mark messages read and tell each original sender which of theirs were
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        request: MarkAsReadRequest,
    ) -> HandlerResult<()> {
        request.validate().map_err(ServiceError::from)?;

        let reader = connection.user_id();
        let receipts = ChatService::new(state.service_context())
            .mark_messages_as_read(&request.message_ids, reader)
            .await?;

        let registry = state.registry();
        for receipt in receipts {
            registry.send_to_user(
                receipt.sender_id,
                OutboundEvent::MessageRead(ReadNotice {
                    message_ids: receipt.message_ids,
                    read_by: reader,
                }),
            );
        }
        Ok(())
    }
}
