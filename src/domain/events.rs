//! Decoded gateway dispatch events.

use super::entities::{Channel, Guild, Message, RoleId, User, UserId};

/// A private channel as announced in READY, before its recipients are
/// resolved against the known users.
#[derive(Debug, Clone)]
pub struct PrivateChannelEntry {
    pub channel: Channel,
    pub recipient_ids: Vec<UserId>,
}

#[derive(Debug, Clone)]
pub struct ReadyEvent {
    pub user: User,
    /// Users announced alongside READY, including inline private channel recipients.
    pub users: Vec<User>,
    pub private_channels: Vec<PrivateChannelEntry>,
    pub guilds: Vec<Guild>,
}

#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub message: Message,
    /// Role ids of the author's guild membership, resolved against the guild
    /// role list when the event is applied.
    pub member_role_ids: Vec<RoleId>,
}

#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum DispatchEvent {
    Ready(ReadyEvent),
    MessageCreate(MessageEvent),
    Unknown { event_type: String },
}

impl DispatchEvent {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ready(_) => "READY",
            Self::MessageCreate(_) => "MESSAGE_CREATE",
            Self::Unknown { event_type } => event_type,
        }
    }
}
