//! Individual WebSocket connection
//!
//! [`SocketHandle`] is the sending half of one socket, usable before
//! authentication. [`Connection`] binds a handle to the user it authenticated
//! as and carries the heartbeat flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use market_core::EntityId;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::protocol::{CloseCode, OutboundEvent};

/// Unique per-socket identifier
pub type ConnectionId = Uuid;

/// Frames queued for the socket writer
#[derive(Debug, Clone)]
pub enum Outbound {
    Event(OutboundEvent),
    Ping,
}

/// Sending half of a socket
///
/// Events go through a bounded queue; closing is a separate signal so it
/// cannot be lost behind a full queue.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Outbound>,
    close: Arc<watch::Sender<Option<CloseCode>>>,
}

impl SocketHandle {
    /// Create a handle; the returned receiver fires once the socket should close
    pub fn new(
        id: ConnectionId,
        outbound: mpsc::Sender<Outbound>,
    ) -> (Self, watch::Receiver<Option<CloseCode>>) {
        let (close, closed) = watch::channel(None);
        let handle = Self {
            id,
            outbound,
            close: Arc::new(close),
        };
        (handle, closed)
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event without waiting. Returns `false` if the socket is gone
    /// or its queue is full.
    pub fn send(&self, event: OutboundEvent) -> bool {
        self.push(Outbound::Event(event))
    }

    /// Queue a transport-level ping
    pub fn ping(&self) -> bool {
        self.push(Outbound::Ping)
    }

    fn push(&self, frame: Outbound) -> bool {
        match self.outbound.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(connection_id = %self.id, "Outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Ask the writer to close the socket with `code`. Only the first call
    /// wins; returns whether this call set the reason.
    pub fn close(&self, code: CloseCode) -> bool {
        self.close.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(code);
                true
            } else {
                false
            }
        })
    }

    /// Why the socket was closed by the server, if it was
    pub fn close_reason(&self) -> Option<CloseCode> {
        *self.close.borrow()
    }

    /// A fresh receiver for the close signal
    pub fn closed(&self) -> watch::Receiver<Option<CloseCode>> {
        self.close.subscribe()
    }

    /// Check if the writer has stopped
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// An authenticated connection
pub struct Connection {
    handle: SocketHandle,
    user_id: EntityId,
    display_name: String,
    /// Cleared on every heartbeat tick, set again by a pong
    alive: AtomicBool,
    connected_at: Instant,
}

impl Connection {
    /// Create a new connection, marked alive
    pub fn new(handle: SocketHandle, user_id: EntityId, display_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            handle,
            user_id,
            display_name: display_name.into(),
            alive: AtomicBool::new(true),
            connected_at: Instant::now(),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn user_id(&self) -> EntityId {
        self.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Record a pong
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set
    pub fn take_alive(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    pub fn send(&self, event: OutboundEvent) -> bool {
        self.handle.send(event)
    }

    pub fn ping(&self) -> bool {
        self.handle.ping()
    }

    pub fn close(&self, code: CloseCode) -> bool {
        self.handle.close(code)
    }

    pub fn close_reason(&self) -> Option<CloseCode> {
        self.handle.close_reason()
    }

    /// Check if the socket can still receive frames
    pub fn is_open(&self) -> bool {
        self.handle.close_reason().is_none() && !self.handle.is_closed()
    }

    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id())
            .field("user_id", &self.user_id)
            .field("alive", &self.is_alive())
            .field("age", &self.age())
            .finish()
    }
}
