//! Domain entity definitions.

mod channel;
mod client_user;
mod guild;
mod member;
mod message;
mod permissions;
mod role;
mod user;

pub use channel::{Channel, ChannelId, ChannelKind, OverwriteType, PermissionOverwrite};
pub use client_user::ClientUser;
pub use guild::{Guild, GuildId};
pub use member::Member;
pub use message::{Attachment, Message, MessageId, MessageKind, Participant};
pub use permissions::Permissions;
pub use role::{Role, RoleId};
pub use user::{User, UserId};
