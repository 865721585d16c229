mod client;
mod codec;
mod connection;
mod constants;
mod error;
mod events;
mod heartbeat;
mod payloads;
mod session;
mod state;

pub use client::{GatewayClient, GatewayClientConfig, GatewayHandle};
pub use codec::{EventParser, GatewayCodec};
pub use connection::{GatewayConnection, WebSocketConnection};
pub use constants::{GATEWAY_URL, GatewayOpcode};
pub use error::{GatewayCloseCode, GatewayError, GatewayResult};
pub use events::{GatewayCommand, GatewayEventKind, SessionEnd};
pub use payloads::GatewayPayload;
pub use session::{GatewaySession, SessionInfo};
pub use state::{ConnectionState, GatewayState};
