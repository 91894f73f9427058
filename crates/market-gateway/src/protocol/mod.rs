//! Gateway protocol
//!
//! JSON envelopes exchanged over the socket and the close codes used to end it.

mod close_codes;
mod inbound;
mod outbound;

pub use close_codes::CloseCode;
pub use inbound::{InboundEvent, ProtocolError};
pub use outbound::{
    DeliveredNotice, ErrorPayload, OutboundEvent, ReadNotice, UserRef, UserSummary,
};
