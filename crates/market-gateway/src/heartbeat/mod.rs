//! Heartbeat monitor
//!
//! Every interval each registered connection either gets pinged (and its
//! alive flag cleared) or, if the previous ping went unanswered, is evicted
//! and closed. A connection therefore survives exactly one missed pong.

use std::sync::Arc;
use std::time::Duration;

use market_core::EntityId;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::connection::ConnectionRegistry;
use crate::protocol::CloseCode;

/// Outcome of one tick
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub pinged: usize,
    pub evicted: Vec<EntityId>,
}

pub struct HeartbeatMonitor {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
}

impl HeartbeatMonitor {
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Run one liveness pass
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        for conn in self.registry.snapshot() {
            if conn.take_alive() {
                conn.ping();
                report.pinged += 1;
                continue;
            }

            let user_id = conn.user_id();
            // The socket's own cleanup handles presence once it sees the close
            self.registry.remove_connection_if(user_id, conn.id());
            conn.close(CloseCode::HeartbeatTimeout);
            tracing::warn!(
                user_id = %user_id,
                connection_id = %conn.id(),
                "Connection evicted (no pong)"
            );
            report.evicted.push(user_id);
        }

        report
    }

    /// Run on the runtime until the handle is shut down
    pub fn spawn(self) -> HeartbeatHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let report = self.tick();
                        tracing::trace!(
                            pinged = report.pinged,
                            evicted = report.evicted.len(),
                            "Heartbeat tick"
                        );
                    }
                }
            }
            tracing::debug!("Heartbeat monitor stopped");
        });

        HeartbeatHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Stops a spawned [`HeartbeatMonitor`]
pub struct HeartbeatHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    /// Stop the monitor and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Heartbeat monitor task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, Outbound, SocketHandle};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn monitor_with_user() -> (HeartbeatMonitor, Arc<Connection>, mpsc::Receiver<Outbound>) {
        let registry = ConnectionRegistry::new_shared();
        let (tx, rx) = mpsc::channel(8);
        let (handle, _closed) = SocketHandle::new(Uuid::new_v4(), tx);
        let conn = Connection::new(handle, EntityId::generate(), "Ann");
        registry.add_connection(Arc::clone(&conn));
        (
            HeartbeatMonitor::new(registry, Duration::from_secs(30)),
            conn,
            rx,
        )
    }

    #[test]
    fn test_evicted_after_two_unanswered_ticks() {
        let (monitor, conn, mut rx) = monitor_with_user();

        let first = monitor.tick();
        assert_eq!(first.pinged, 1);
        assert!(first.evicted.is_empty());
        assert!(matches!(rx.try_recv(), Ok(Outbound::Ping)));

        let second = monitor.tick();
        assert_eq!(second.evicted, vec![conn.user_id()]);
        assert!(!monitor.registry.is_online(conn.user_id()));
        assert_eq!(conn.close_reason(), Some(CloseCode::HeartbeatTimeout));
    }

    #[test]
    fn test_pong_keeps_connection() {
        let (monitor, conn, _rx) = monitor_with_user();

        for _ in 0..5 {
            let report = monitor.tick();
            assert!(report.evicted.is_empty());
            monitor.registry.handle_pong(conn.user_id(), conn.id());
        }
        assert!(monitor.registry.is_online(conn.user_id()));
        assert!(conn.close_reason().is_none());
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let (monitor, _conn, _rx) = monitor_with_user();
        let handle = monitor.spawn();
        handle.shutdown().await;
    }
}
