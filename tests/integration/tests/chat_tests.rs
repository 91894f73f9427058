//! Gateway end-to-end tests
//!
//! Each test spawns its own gateway over an in-memory store, so nothing
//! external is required.
//!
//! Run with: cargo test -p integration-tests --test chat_tests

use std::time::Duration;

use integration_tests::{test_config_with, Marketplace, TestServer};
use market_core::{EntityId, UserRepository};
use serde_json::{json, Value};

/// Send a message and wait for the sender's echo
async fn send(
    client: &mut integration_tests::WsClient,
    receiver: EntityId,
    project: Option<EntityId>,
    content: &str,
    client_msg_id: Option<&str>,
) -> Value {
    client
        .send_event(
            "message_send",
            json!({
                "receiver_id": receiver.to_string(),
                "projectId": project.map(|p| p.to_string()),
                "content": content,
                "clientMsgId": client_msg_id,
            }),
        )
        .await
        .unwrap();
    client.expect_event("message_received").await.unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_auth_success_and_presence() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);

    let mut client = server.connect().await.unwrap();
    let me = client.auth(m.client.id).await.unwrap();
    assert_eq!(me["userId"], m.client.id.to_string());
    assert_eq!(me["userName"], m.client.name.as_str());
    let online = client.expect_event("online_users").await.unwrap();
    assert_eq!(online["users"], json!([]));

    let mut freelancer = server.connect_as(m.freelancer.id).await.unwrap();
    let online = freelancer.expect_event("online_users").await.unwrap();
    assert_eq!(online["users"][0]["userId"], m.client.id.to_string());

    let announced = client.expect_event("user_online").await.unwrap();
    assert_eq!(announced["userId"], m.freelancer.id.to_string());

    let stored = server.store.find_by_id(m.client.id).await.unwrap().unwrap();
    assert!(stored.is_online);
}

#[tokio::test]
async fn test_unknown_user_is_rejected_and_closed() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();

    client
        .send_event("auth", json!({ "userId": EntityId::generate().to_string() }))
        .await
        .unwrap();
    let (kind, payload) = client.recv_event().await.unwrap();
    assert_eq!(kind, "auth_failed");
    assert!(payload["error"].as_str().unwrap().contains("not found"));
    assert_eq!(client.expect_close().await.unwrap(), Some(4004));
}

#[tokio::test]
async fn test_malformed_user_id_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();

    client
        .send_event("auth", json!({ "userId": "not-a-uuid" }))
        .await
        .unwrap();
    let (kind, _) = client.recv_event().await.unwrap();
    assert_eq!(kind, "auth_failed");
    assert_eq!(client.expect_close().await.unwrap(), Some(4004));
}

#[tokio::test]
async fn test_mutations_before_auth() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect().await.unwrap();

    send_pre_auth(&mut client, "message_send", json!({
        "receiver_id": m.freelancer.id.to_string(),
        "content": "hi",
    }))
    .await;
    send_pre_auth(&mut client, "mark_as_read", json!({ "messageIds": [] })).await;

    // Reads before auth are dropped silently; the socket stays usable
    client.send_event("get_user_projects", json!({})).await.unwrap();
    client.auth(m.client.id).await.unwrap();
    assert_eq!(server.store.message_count(), 0);
}

async fn send_pre_auth(client: &mut integration_tests::WsClient, kind: &str, payload: Value) {
    client.send_event(kind, payload).await.unwrap();
    let (received, payload) = client.recv_event().await.unwrap();
    assert_eq!(received, "error");
    assert_eq!(payload["error"], "Not authenticated");
}

#[tokio::test]
async fn test_second_auth_is_an_error() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();

    client
        .send_event("auth", json!({ "userId": m.client.id.to_string() }))
        .await
        .unwrap();
    let payload = client.expect_event("error").await.unwrap();
    assert_eq!(payload["error"], "Already authenticated");
}

#[tokio::test]
async fn test_auth_timeout_closes_socket() {
    let config = test_config_with(&[("CHAT_AUTH_TIMEOUT_SECS", "1")]).unwrap();
    let server = TestServer::start_with_config(config).await.unwrap();
    let mut client = server.connect().await.unwrap();

    assert_eq!(client.expect_close().await.unwrap(), Some(4003));
}

// ============================================================================
// Messaging
// ============================================================================

#[tokio::test]
async fn test_send_and_receive() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();
    let mut freelancer = server.connect_as(m.freelancer.id).await.unwrap();

    let echo = send(&mut client, m.freelancer.id, Some(m.project.id), "Hello", Some("c-1")).await;
    assert_eq!(echo["content"], "Hello");
    assert_eq!(echo["clientMessageId"], "c-1");
    assert_eq!(echo["senderName"], m.client.name.as_str());
    assert_eq!(echo["status"], "DELIVERED");

    let received = freelancer.expect_event("message_received").await.unwrap();
    assert_eq!(received["id"], echo["id"]);
    assert_eq!(received["senderId"], m.client.id.to_string());
    assert_eq!(received["projectId"], m.project.id.to_string());
}

#[tokio::test]
async fn test_retried_send_is_deduplicated() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();

    let first = send(&mut client, m.freelancer.id, None, "draft", Some("retry-1")).await;
    let second = send(&mut client, m.freelancer.id, None, "final", Some("retry-1")).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["content"], "final");
    assert_eq!(server.store.message_count(), 1);
}

#[tokio::test]
async fn test_invalid_message_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();

    client
        .send_event(
            "message_send",
            json!({ "receiver_id": m.freelancer.id.to_string(), "content": "   " }),
        )
        .await
        .unwrap();
    let payload = client.expect_event("error").await.unwrap();
    assert!(payload["error"].as_str().unwrap().starts_with("Validation error"));
    assert_eq!(server.store.message_count(), 0);
}

#[tokio::test]
async fn test_pending_messages_delivered_on_auth() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();

    let echo = send(&mut client, m.freelancer.id, Some(m.project.id), "While away", None).await;
    assert_eq!(echo["status"], "SENT");

    let _freelancer = server.connect_as(m.freelancer.id).await.unwrap();
    let notice = client.expect_event("message_delivered").await.unwrap();
    assert_eq!(notice["messageIds"], json!([echo["id"]]));
    assert_eq!(notice["deliveredTo"], m.freelancer.id.to_string());
}

#[tokio::test]
async fn test_read_receipt_reaches_sender() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();
    let mut freelancer = server.connect_as(m.freelancer.id).await.unwrap();

    let echo = send(&mut client, m.freelancer.id, Some(m.project.id), "Read me", None).await;
    freelancer.expect_event("message_received").await.unwrap();

    freelancer
        .send_event(
            "mark_as_read",
            json!({ "messageIds": [echo["id"], "garbage"] }),
        )
        .await
        .unwrap();

    let receipt = client.expect_event("message_read").await.unwrap();
    assert_eq!(receipt["messageIds"], json!([echo["id"]]));
    assert_eq!(receipt["readBy"], m.freelancer.id.to_string());
}

#[tokio::test]
async fn test_oversized_read_batch_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut freelancer = server.connect_as(m.freelancer.id).await.unwrap();

    let ids: Vec<String> = (0..1001).map(|_| EntityId::generate().to_string()).collect();
    freelancer
        .send_event("mark_as_read", json!({ "messageIds": ids }))
        .await
        .unwrap();

    let payload = freelancer.expect_event("error").await.unwrap();
    assert!(payload["error"].as_str().unwrap().starts_with("Validation error"));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_history_contacts_and_projects() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();
    let mut freelancer = server.connect_as(m.freelancer.id).await.unwrap();

    for content in ["one", "two", "three"] {
        send(&mut client, m.freelancer.id, Some(m.project.id), content, None).await;
    }

    freelancer
        .send_event(
            "message_history",
            json!({
                "projectId": m.project.id.to_string(),
                "otherUserId": m.client.id.to_string(),
            }),
        )
        .await
        .unwrap();
    let history = freelancer.expect_event("message_history").await.unwrap();
    let contents: Vec<&str> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
    assert_eq!(history["total"], 3);
    assert_eq!(history["page"], 1);
    assert_eq!(history["totalPages"], 1);

    freelancer
        .send_event("get_project_users", json!({ "projectId": m.project.id.to_string() }))
        .await
        .unwrap();
    let contacts = freelancer.expect_event("project_users").await.unwrap();
    assert_eq!(contacts["users"][0]["id"], m.client.id.to_string());
    assert_eq!(contacts["users"][0]["isOnline"], true);
    assert_eq!(contacts["users"][0]["unreadCount"], 3);

    freelancer.send_event("get_user_projects", json!({})).await.unwrap();
    let projects = freelancer.expect_event("user_projects").await.unwrap();
    assert_eq!(projects["projects"][0]["id"], m.project.id.to_string());
    assert_eq!(projects["projects"][0]["relation"], "freelancer");
}

#[tokio::test]
async fn test_bad_frames_keep_connection_open() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();

    client.send_raw("not json").await.unwrap();
    let payload = client.expect_event("error").await.unwrap();
    assert_eq!(payload["error"], "Invalid message format");

    client.send_event("typing", json!({})).await.unwrap();
    let payload = client.expect_event("error").await.unwrap();
    assert_eq!(payload["error"], "Unknown event type: typing");

    client.send_event("get_user_projects", json!({})).await.unwrap();
    let projects = client.expect_event("user_projects").await.unwrap();
    assert_eq!(projects["projects"][0]["relation"], "client");
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn test_superseded_connection_closed_without_offline() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();
    let mut first = server.connect_as(m.freelancer.id).await.unwrap();
    client.expect_event("user_online").await.unwrap();

    let mut second = server.connect_as(m.freelancer.id).await.unwrap();
    assert_eq!(first.expect_close().await.unwrap(), Some(4006));

    assert!(
        client
            .stays_silent("user_offline", Duration::from_millis(300))
            .await
    );
    assert!(server.state.registry().is_online(m.freelancer.id));

    send(&mut client, m.freelancer.id, None, "still there?", None).await;
    let received = second.expect_event("message_received").await.unwrap();
    assert_eq!(received["content"], "still there?");
}

#[tokio::test]
async fn test_disconnect_broadcasts_offline() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();
    let freelancer = server.connect_as(m.freelancer.id).await.unwrap();
    client.expect_event("user_online").await.unwrap();

    freelancer.close().await.unwrap();
    let gone = client.expect_event("user_offline").await.unwrap();
    assert_eq!(gone["userId"], m.freelancer.id.to_string());

    let stored = server.store.find_by_id(m.freelancer.id).await.unwrap().unwrap();
    assert!(!stored.is_online);
    assert!(stored.last_seen.is_some());
    assert!(!server.state.registry().is_online(m.freelancer.id));
}

#[tokio::test]
async fn test_shutdown_drains_background_work() {
    let server = TestServer::start().await.unwrap();
    let m = Marketplace::seed(&server.store);
    let mut client = server.connect_as(m.client.id).await.unwrap();
    let freelancer = server.connect_as(m.freelancer.id).await.unwrap();

    send(&mut client, m.freelancer.id, None, "bye", None).await;
    client.close().await.unwrap();
    freelancer.close().await.unwrap();

    let store = server.store.clone();
    server.stop().await;
    assert_eq!(store.message_count(), 1);
}
