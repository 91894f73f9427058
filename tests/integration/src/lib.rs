//! Integration test utilities for the marketplace chat
//!
//! Spawns the gateway on an ephemeral port over an in-memory store and drives
//! it with a WebSocket client.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
