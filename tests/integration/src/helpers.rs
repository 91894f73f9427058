//! Test helpers for integration tests
//!
//! Provides a gateway server on an ephemeral port and a small WebSocket
//! client that speaks the `{type, payload}` protocol.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use market_common::{AppConfig, IN_MEMORY_DATABASE_URL};
use market_core::EntityId;
use market_db::InMemoryStore;
use market_gateway::{in_memory_state, serve, GatewayState};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a test waits for an expected frame
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a local in-memory gateway, with overrides
pub fn test_config_with(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let config = AppConfig::from_lookup(|key| {
        if let Some((_, value)) = overrides.iter().find(|(k, _)| *k == key) {
            return Some((*value).to_string());
        }
        match key {
            "GATEWAY_HOST" => Some("127.0.0.1".to_string()),
            "GATEWAY_PORT" => Some("0".to_string()),
            "DATABASE_URL" => Some(IN_MEMORY_DATABASE_URL.to_string()),
            _ => None,
        }
    })?;
    Ok(config)
}

/// Configuration for a local in-memory gateway
pub fn test_config() -> Result<AppConfig> {
    test_config_with(&[])
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<InMemoryStore>,
    pub state: GatewayState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()?).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        let state = in_memory_state(config, Arc::clone(&store))?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = serve(listener, server_state, shutdown).await {
                eprintln!("test server failed: {e}");
            }
        });

        Ok(Self {
            addr,
            store,
            state,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(reqwest::get(&url).await?)
    }

    /// Open an unauthenticated socket
    pub async fn connect(&self) -> Result<WsClient> {
        let (stream, _) = connect_async(self.ws_url()).await?;
        Ok(WsClient { stream })
    }

    /// Open a socket and authenticate as `user_id`
    pub async fn connect_as(&self, user_id: EntityId) -> Result<WsClient> {
        let mut client = self.connect().await?;
        client.auth(user_id).await?;
        Ok(client)
    }

    /// Stop the server and wait for background work to drain
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Protocol-level WebSocket client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send a raw text frame
    pub async fn send_raw(&mut self, text: impl Into<String>) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Send a `{type, payload}` event
    pub async fn send_event(&mut self, kind: &str, payload: Value) -> Result<()> {
        self.send_raw(json!({ "type": kind, "payload": payload }).to_string())
            .await
    }

    /// Next event as `(type, payload)`
    pub async fn recv_event(&mut self) -> Result<(String, Value)> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| anyhow!("timed out waiting for an event"))?;

            match frame {
                Some(Ok(Message::Text(text))) => {
                    let mut value: Value = serde_json::from_str(&text)?;
                    let kind = value["type"]
                        .as_str()
                        .ok_or_else(|| anyhow!("event without type: {text}"))?
                        .to_string();
                    return Ok((kind, value["payload"].take()));
                }
                Some(Ok(Message::Close(frame))) => bail!("socket closed: {frame:?}"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => bail!("socket ended"),
            }
        }
    }

    /// Skip events until one of type `kind` arrives; returns its payload
    pub async fn expect_event(&mut self, kind: &str) -> Result<Value> {
        loop {
            let (received, payload) = self.recv_event().await?;
            if received == kind {
                return Ok(payload);
            }
        }
    }

    /// `true` if no `kind` event arrives within `wait`
    pub async fn stays_silent(&mut self, kind: &str, wait: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let next = tokio::time::timeout_at(deadline, self.stream.next()).await;
            match next {
                Err(_) => return true,
                Ok(Some(Ok(Message::Text(text)))) => {
                    let value: Value = serde_json::from_str(&text).unwrap_or_default();
                    if value["type"] == kind {
                        return false;
                    }
                }
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(_)) | None) => return true,
            }
        }
    }

    /// Read until the server closes the socket; returns the close code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| anyhow!("timed out waiting for close"))?;
            match frame {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Authenticate and return the `auth_success` payload
    pub async fn auth(&mut self, user_id: EntityId) -> Result<Value> {
        self.send_event("auth", json!({ "userId": user_id.to_string() }))
            .await?;
        let (kind, payload) = self.recv_event().await?;
        if kind != "auth_success" {
            bail!("expected auth_success, got {kind}: {payload}");
        }
        Ok(payload)
    }

    /// Close the socket from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
