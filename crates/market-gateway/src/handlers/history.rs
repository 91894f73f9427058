//! `message_history` handler

use std::sync::Arc;

use market_service::dto::{parse_optional_id, HistoryRequest};
use market_service::ChatService;

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::OutboundEvent;
use crate::server::GatewayState;

pub struct HistoryHandler;

impl HistoryHandler {
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        request: HistoryRequest,
    ) -> HandlerResult<()> {
        let project_id = parse_optional_id(request.project_id.as_deref())?;
        let other_user_id = parse_optional_id(request.other_user_id.as_deref())?;

        let page = ChatService::new(state.service_context())
            .get_message_history(
                connection.user_id(),
                project_id,
                other_user_id,
                request.page,
                request.limit,
            )
            .await?;

        connection.send(OutboundEvent::MessageHistory(page));
        Ok(())
    }
}
