//! WebSocket close codes
//!
//! Application close codes the gateway sends when it ends a connection.

/// Gateway WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Regular shutdown of the socket
    Normal = 1000,
    /// No `auth` event arrived in time
    AuthTimeout = 4003,
    /// `auth` named an unknown or malformed user
    AuthenticationFailed = 4004,
    /// The same user connected again elsewhere
    SessionReplaced = 4006,
    /// Pings went unanswered
    HeartbeatTimeout = 4009,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1000 => Some(Self::Normal),
            4003 => Some(Self::AuthTimeout),
            4004 => Some(Self::AuthenticationFailed),
            4006 => Some(Self::SessionReplaced),
            4009 => Some(Self::HeartbeatTimeout),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Reason text carried in the close frame
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Connection closed",
            Self::AuthTimeout => "Authentication timeout",
            Self::AuthenticationFailed => "Authentication failed",
            Self::SessionReplaced => "Session replaced by a newer connection",
            Self::HeartbeatTimeout => "Heartbeat timeout",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
