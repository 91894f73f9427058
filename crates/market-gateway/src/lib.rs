//! # market-gateway
//!
//! WebSocket gateway for the marketplace chat: authenticates sockets, routes
//! chat events to the service layer, and tracks who is online.

pub mod connection;
pub mod handlers;
pub mod heartbeat;
pub mod protocol;
pub mod server;

pub use server::{create_app, create_gateway_state, in_memory_state, run, serve, GatewayState};
