//! Connection registry
//!
//! At most one live connection per user, keyed by user ID in a `DashMap`.
//! Registering again supersedes (and closes) the previous connection.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use market_core::EntityId;

use super::{Connection, ConnectionId};
use crate::protocol::{CloseCode, OutboundEvent};

/// Live connections by user
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<EntityId, Arc<Connection>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register `connection` for its user and mark it alive. A previous
    /// connection of the same user is closed with `SessionReplaced` and
    /// returned.
    pub fn add_connection(&self, connection: Arc<Connection>) -> Option<Arc<Connection>> {
        connection.mark_alive();
        let user_id = connection.user_id();
        let previous = self.connections.insert(user_id, Arc::clone(&connection))?;

        if previous.id() == connection.id() {
            return None;
        }
        previous.close(CloseCode::SessionReplaced);
        tracing::info!(
            user_id = %user_id,
            replaced = %previous.id(),
            connection_id = %connection.id(),
            "Connection superseded"
        );
        Some(previous)
    }

    /// Unregister whatever connection the user has
    pub fn remove_connection(&self, user_id: EntityId) -> Option<Arc<Connection>> {
        self.connections.remove(&user_id).map(|(_, conn)| conn)
    }

    /// Unregister the user only while `connection_id` is the registered
    /// connection
    pub fn remove_connection_if(&self, user_id: EntityId, connection_id: ConnectionId) -> bool {
        self.connections
            .remove_if(&user_id, |_, conn| conn.id() == connection_id)
            .is_some()
    }

    /// Get the registered connection of a user
    pub fn get(&self, user_id: EntityId) -> Option<Arc<Connection>> {
        self.connections.get(&user_id).map(|c| Arc::clone(c.value()))
    }

    pub fn is_online(&self, user_id: EntityId) -> bool {
        self.connections.contains_key(&user_id)
    }

    pub fn list_online_user_ids(&self) -> HashSet<EntityId> {
        self.connections.iter().map(|r| *r.key()).collect()
    }

    /// `(user_id, display_name)` of everyone connected
    pub fn online_users(&self) -> Vec<(EntityId, String)> {
        self.connections
            .iter()
            .map(|r| (*r.key(), r.display_name().to_string()))
            .collect()
    }

    /// Record a pong from `connection_id`. A superseded socket that still
    /// answers pings does not count for the user's current connection.
    pub fn handle_pong(&self, user_id: EntityId, connection_id: ConnectionId) -> bool {
        match self.connections.get(&user_id) {
            Some(conn) if conn.id() == connection_id => {
                conn.mark_alive();
                true
            }
            _ => false,
        }
    }

    /// Queue `event` for the user. Returns `true` when an open connection
    /// existed and the send was attempted.
    pub fn send_to_user(&self, user_id: EntityId, event: OutboundEvent) -> bool {
        let Some(conn) = self.get(user_id) else {
            return false;
        };
        if !conn.is_open() {
            return false;
        }
        if !conn.send(event) {
            tracing::debug!(user_id = %user_id, "Event not queued");
        }
        true
    }

    /// Queue `event` for every connection except `exclude`'s. Best effort.
    pub fn broadcast(&self, event: &OutboundEvent, exclude: Option<EntityId>) -> usize {
        let mut sent = 0;
        for conn in self.snapshot() {
            if Some(conn.user_id()) == exclude {
                continue;
            }
            if conn.send(event.clone()) {
                sent += 1;
            }
        }
        tracing::trace!(sent = sent, "Event broadcast");
        sent
    }

    /// Copy of the registered connections, so callers never hold a shard lock
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.iter().map(|r| Arc::clone(r.value())).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Outbound, SocketHandle};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn connect(user_id: EntityId) -> (Arc<Connection>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(8);
        let (handle, _closed) = SocketHandle::new(Uuid::new_v4(), tx);
        (Connection::new(handle, user_id, "User"), rx)
    }

    #[test]
    fn test_add_and_remove() {
        let registry = ConnectionRegistry::new();
        let user = EntityId::generate();
        let (conn, _rx) = connect(user);

        assert!(registry.add_connection(conn).is_none());
        assert!(registry.is_online(user));
        assert_eq!(registry.list_online_user_ids(), HashSet::from([user]));

        assert!(registry.remove_connection(user).is_some());
        assert!(!registry.is_online(user));
        assert!(registry.remove_connection(user).is_none());
    }

    #[test]
    fn test_superseded_connection_is_closed() {
        let registry = ConnectionRegistry::new();
        let user = EntityId::generate();
        let (first, _rx1) = connect(user);
        let (second, _rx2) = connect(user);

        registry.add_connection(Arc::clone(&first));
        let replaced = registry.add_connection(Arc::clone(&second)).unwrap();

        assert_eq!(replaced.id(), first.id());
        assert_eq!(first.close_reason(), Some(CloseCode::SessionReplaced));
        assert!(second.close_reason().is_none());
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_late_close_keeps_replacement() {
        let registry = ConnectionRegistry::new();
        let user = EntityId::generate();
        let (first, _rx1) = connect(user);
        let (second, _rx2) = connect(user);
        registry.add_connection(Arc::clone(&first));
        registry.add_connection(Arc::clone(&second));

        assert!(!registry.remove_connection_if(user, first.id()));
        assert!(registry.is_online(user));
        assert!(registry.remove_connection_if(user, second.id()));
        assert!(!registry.is_online(user));
    }

    #[test]
    fn test_send_to_user() {
        let registry = ConnectionRegistry::new();
        let user = EntityId::generate();
        let (conn, mut rx) = connect(user);

        assert!(!registry.send_to_user(user, OutboundEvent::error("nobody")));
        registry.add_connection(conn);
        assert!(registry.send_to_user(user, OutboundEvent::error("hi")));
        assert!(matches!(rx.try_recv(), Ok(Outbound::Event(OutboundEvent::Error(_)))));

        drop(rx);
        assert!(!registry.send_to_user(user, OutboundEvent::error("gone")));
    }

    #[test]
    fn test_broadcast_excludes_sender() {
        let registry = ConnectionRegistry::new();
        let alice = EntityId::generate();
        let bob = EntityId::generate();
        let (a, mut rx_a) = connect(alice);
        let (b, mut rx_b) = connect(bob);
        registry.add_connection(a);
        registry.add_connection(b);

        let sent = registry.broadcast(&OutboundEvent::error("x"), Some(alice));
        assert_eq!(sent, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_handle_pong() {
        let registry = ConnectionRegistry::new();
        let user = EntityId::generate();
        let (conn, _rx) = connect(user);
        registry.add_connection(Arc::clone(&conn));

        conn.take_alive();
        assert!(registry.handle_pong(user, conn.id()));
        assert!(conn.is_alive());
        assert!(!registry.handle_pong(EntityId::generate(), conn.id()));
    }

    #[test]
    fn test_pong_from_superseded_socket_is_ignored() {
        let registry = ConnectionRegistry::new();
        let user = EntityId::generate();
        let (old, _rx_old) = connect(user);
        let (new, _rx_new) = connect(user);
        registry.add_connection(Arc::clone(&old));
        registry.add_connection(Arc::clone(&new));

        new.take_alive();
        assert!(!registry.handle_pong(user, old.id()));
        assert!(!new.is_alive());

        assert!(registry.handle_pong(user, new.id()));
        assert!(new.is_alive());
    }

    #[test]
    fn test_online_users() {
        let registry = ConnectionRegistry::new();
        let user = EntityId::generate();
        let (conn, _rx) = connect(user);
        registry.add_connection(conn);
        assert_eq!(registry.online_users(), vec![(user, "User".to_string())]);
    }
}
