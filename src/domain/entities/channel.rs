//! Discord channel entity.

use serde::{Deserialize, Serialize};

use super::{GuildId, Permissions, User};

/// Unique identifier for a Discord channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(#[serde(with = "crate::domain::serde_utils::string_to_u64")] pub u64);

impl ChannelId {
    /// Returns the underlying u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Discord channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
#[repr(u8)]
pub enum ChannelKind {
    /// Text channel.
    #[default]
    Text = 0,
    /// Direct message channel.
    Dm = 1,
    /// Voice channel.
    Voice = 2,
    /// Group direct message channel.
    GroupDm = 3,
    /// Category channel.
    Category = 4,
    /// Announcement channel.
    Announcement = 5,
    /// Announcement thread channel.
    AnnouncementThread = 10,
    /// Public thread channel.
    PublicThread = 11,
    /// Private thread channel.
    PrivateThread = 12,
    /// Stage voice channel.
    StageVoice = 13,
    /// Directory channel.
    Directory = 14,
    /// Forum channel.
    Forum = 15,
    /// Media channel.
    Media = 16,
}

impl ChannelKind {
    /// Returns true if this is a category channel.
    #[must_use]
    pub const fn is_category(self) -> bool {
        matches!(self, Self::Category)
    }

    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }

    /// Returns the display prefix for this channel type.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Voice | Self::StageVoice => "~",
            Self::Dm | Self::GroupDm => "@",
            Self::Category => "+",
            _ => "#",
        }
    }
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Dm,
            2 => Self::Voice,
            3 => Self::GroupDm,
            4 => Self::Category,
            5 => Self::Announcement,
            10 => Self::AnnouncementThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::StageVoice,
            14 => Self::Directory,
            15 => Self::Forum,
            16 => Self::Media,
            _ => Self::Text,
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        kind as Self
    }
}

/// Whether an overwrite targets a role or a single member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum OverwriteType {
    Role,
    Member,
}

impl From<u8> for OverwriteType {
    fn from(value: u8) -> Self {
        if value == 1 { Self::Member } else { Self::Role }
    }
}

impl From<OverwriteType> for u8 {
    fn from(kind: OverwriteType) -> Self {
        match kind {
            OverwriteType::Role => 0,
            OverwriteType::Member => 1,
        }
    }
}

/// Channel-level permission adjustment for one role or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    #[serde(with = "crate::domain::serde_utils::string_to_u64")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: OverwriteType,
    #[serde(default)]
    pub allow: Permissions,
    #[serde(default)]
    pub deny: Permissions,
}

/// Discord channel information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    id: ChannelId,
    guild_id: Option<GuildId>,
    name: Option<String>,
    kind: ChannelKind,
    parent_id: Option<ChannelId>,
    position: i32,
    overwrites: Vec<PermissionOverwrite>,
    recipients: Vec<User>,
}

impl Channel {
    /// Creates a new unnamed channel with the given ID and type.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>, kind: ChannelKind) -> Self {
        Self {
            id: id.into(),
            guild_id: None,
            name: None,
            kind,
            parent_id: None,
            position: 0,
            overwrites: Vec::new(),
            recipients: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_guild(mut self, guild_id: impl Into<GuildId>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<ChannelId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub const fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_overwrites(mut self, overwrites: Vec<PermissionOverwrite>) -> Self {
        self.overwrites = overwrites;
        self
    }

    #[must_use]
    pub fn with_recipients(mut self, recipients: Vec<User>) -> Self {
        self.recipients = recipients;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    #[must_use]
    pub const fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    #[must_use]
    pub const fn parent_id(&self) -> Option<ChannelId> {
        self.parent_id
    }

    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    #[must_use]
    pub fn overwrites(&self) -> &[PermissionOverwrite] {
        &self.overwrites
    }

    #[must_use]
    pub fn recipients(&self) -> &[User] {
        &self.recipients
    }

    /// Human readable label: the channel name, or the recipients for an
    /// unnamed private channel.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if self.recipients.is_empty() {
            return format!("{}{}", self.kind.prefix(), self.id);
        }
        self.recipients
            .iter()
            .map(User::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Display name of the first recipient, used by the private channel list.
    #[must_use]
    pub fn first_recipient_name(&self) -> Option<&str> {
        self.recipients.first().map(User::display_name)
    }
}
