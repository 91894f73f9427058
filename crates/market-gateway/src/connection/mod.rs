//! Connection management
//!
//! Socket handles, authenticated connections, and the per-user registry.

mod connection;
mod registry;
mod session;

pub use connection::{Connection, ConnectionId, Outbound, SocketHandle};
pub use registry::ConnectionRegistry;
pub use session::Session;
