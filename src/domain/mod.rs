//! Domain layer with core entities, gateway events and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Decoded gateway events.
pub mod events;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;

pub use entities::{ClientUser, Message, User};
pub use errors::{ModelError, RestError};
pub use events::DispatchEvent;
pub use ports::ChatPort;
