//! Per-socket protocol state
//!
//! A session starts unauthenticated with only a [`SocketHandle`] and becomes
//! authenticated once an `auth` event binds it to a registered [`Connection`].

use std::sync::Arc;

use super::{Connection, ConnectionId, SocketHandle};
use crate::protocol::OutboundEvent;

pub struct Session {
    handle: SocketHandle,
    connection: Option<Arc<Connection>>,
}

impl Session {
    pub fn new(handle: SocketHandle) -> Self {
        Self {
            handle,
            connection: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn handle(&self) -> &SocketHandle {
        &self.handle
    }

    pub fn is_authenticated(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection(&self) -> Option<&Arc<Connection>> {
        self.connection.as_ref()
    }

    pub fn authenticate(&mut self, connection: Arc<Connection>) {
        self.connection = Some(connection);
    }

    /// Answer on this socket
    pub fn reply(&self, event: OutboundEvent) -> bool {
        self.handle.send(event)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("user_id", &self.connection.as_ref().map(|c| c.user_id()))
            .finish()
    }
}
