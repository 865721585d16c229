use super::payloads::GatewayPayload;
use crate::domain::events::DispatchEvent;

/// Commands the app sends to the running session.
#[derive(Debug, Clone)]
pub enum GatewayCommand {
    /// Serialize and transmit a frame without waiting for any acknowledgement.
    Send(GatewayPayload),
    /// Close the connection and end the session.
    Close,
}

/// Lifecycle notifications and decoded dispatches from the session.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum GatewayEventKind {
    HelloReceived { heartbeat_interval_ms: u64 },
    Identified,
    Dispatch(DispatchEvent),
    SessionInvalidated { reason: String },
}

/// How a session that did not fail came to an end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The app asked for the session to close.
    Local,
    /// The server closed the connection in an orderly way.
    Remote { code: u16, reason: String },
}
