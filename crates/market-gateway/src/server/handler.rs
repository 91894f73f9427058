//! WebSocket handler
//!
//! One read loop per socket (events of a connection are handled in order) and
//! one writer task draining the outbound queue.

use std::borrow::Cow;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use market_service::PresenceService;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::connection::{ConnectionId, Outbound, Session, SocketHandle};
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, OutboundEvent, UserRef};
use crate::server::GatewayState;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let connection_id = Uuid::new_v4();
    let chat = &state.config().chat;

    let (tx, rx) = mpsc::channel(chat.outbound_buffer.max(1));
    let (handle, writer_closed) = SocketHandle::new(connection_id, tx);
    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_loop(sink, rx, writer_closed, connection_id));

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let mut session = Session::new(handle.clone());
    let mut closed = handle.closed();
    let auth_deadline = tokio::time::sleep(chat.auth_timeout());
    tokio::pin!(auth_deadline);

    loop {
        tokio::select! {
            _ = closed.changed() => break,
            () = &mut auth_deadline, if !session.is_authenticated() => {
                tracing::info!(connection_id = %connection_id, "No auth before timeout");
                handle.close(CloseCode::AuthTimeout);
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    MessageDispatcher::dispatch(&state, &mut session, &text).await;
                }
                Some(Ok(Message::Pong(_))) => {
                    if let Some(conn) = session.connection() {
                        state.registry().handle_pong(conn.user_id(), conn.id());
                    }
                }
                Some(Ok(Message::Ping(_))) => {
                    // Pong is handled automatically by axum
                    tracing::trace!(connection_id = %connection_id, "Ping received");
                }
                Some(Ok(Message::Binary(_))) => {
                    session.reply(OutboundEvent::error("Binary frames are not supported"));
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(connection_id = %connection_id, "Client closed connection");
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }

    cleanup_connection(&state, &session).await;

    handle.close(CloseCode::Normal);
    drop(session);
    drop(handle);
    if let Err(e) = writer.await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Writer task failed");
    }
}

/// Drain the outbound queue into the socket until a close is signalled
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
    mut closed: watch::Receiver<Option<CloseCode>>,
    connection_id: ConnectionId,
) {
    loop {
        tokio::select! {
            biased;
            changed = closed.changed() => {
                // Frames queued before the close still go out
                while let Ok(frame) = outbound.try_recv() {
                    if write_frame(&mut sink, frame, connection_id).await.is_err() {
                        break;
                    }
                }
                let code = if changed.is_ok() { *closed.borrow() } else { None };
                if let Some(code) = code {
                    let frame = CloseFrame {
                        code: code.as_u16(),
                        reason: Cow::Borrowed(code.description()),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                }
                break;
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if write_frame(&mut sink, frame, connection_id).await.is_err() {
                    tracing::debug!(connection_id = %connection_id, "Socket write failed");
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}

async fn write_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: Outbound,
    connection_id: ConnectionId,
) -> Result<(), axum::Error> {
    let message = match frame {
        Outbound::Ping => Message::Ping(Vec::new()),
        Outbound::Event(event) => match event.to_json() {
            Ok(json) => Message::Text(json),
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "Failed to encode event");
                return Ok(());
            }
        },
    };
    sink.send(message).await
}

/// Unregister and announce the user, unless a newer connection took over
async fn cleanup_connection(state: &GatewayState, session: &Session) {
    let Some(conn) = session.connection() else {
        tracing::debug!(connection_id = %session.id(), "Closed before auth");
        return;
    };
    let user_id = conn.user_id();
    let registry = state.registry();

    registry.remove_connection_if(user_id, conn.id());
    if conn.close_reason() == Some(CloseCode::SessionReplaced) || registry.is_online(user_id) {
        tracing::debug!(
            user_id = %user_id,
            connection_id = %conn.id(),
            "Superseded connection closed"
        );
        return;
    }

    if let Err(e) = PresenceService::new(state.service_context())
        .set_offline(user_id)
        .await
    {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to persist offline status");
    }
    registry.broadcast(&OutboundEvent::UserOffline(UserRef { user_id }), Some(user_id));

    tracing::info!(user_id = %user_id, connection_id = %conn.id(), "User disconnected");
}
