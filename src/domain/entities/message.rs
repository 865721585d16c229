//! Discord message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, GuildId, Member, RoleId, User, UserId};

/// Unique identifier for a Discord message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(#[serde(with = "crate::domain::serde_utils::string_to_u64")] pub u64);

impl MessageId {
    /// Returns the underlying u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Discord message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "u8", into = "u8")]
#[repr(u8)]
pub enum MessageKind {
    #[default]
    Default = 0,
    RecipientAdd = 1,
    RecipientRemove = 2,
    Call = 3,
    ChannelNameChange = 4,
    ChannelIconChange = 5,
    ChannelPinnedMessage = 6,
    UserJoin = 7,
    GuildBoost = 8,
    GuildBoostTier1 = 9,
    GuildBoostTier2 = 10,
    GuildBoostTier3 = 11,
    ChannelFollowAdd = 12,
    ThreadCreated = 18,
    Reply = 19,
    ChatInputCommand = 20,
    ThreadStarterMessage = 21,
    GuildInviteReminder = 22,
    ContextMenuCommand = 23,
    AutoModerationAction = 24,
}

impl From<u8> for MessageKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::RecipientAdd,
            2 => Self::RecipientRemove,
            3 => Self::Call,
            4 => Self::ChannelNameChange,
            5 => Self::ChannelIconChange,
            6 => Self::ChannelPinnedMessage,
            7 => Self::UserJoin,
            8 => Self::GuildBoost,
            9 => Self::GuildBoostTier1,
            10 => Self::GuildBoostTier2,
            11 => Self::GuildBoostTier3,
            12 => Self::ChannelFollowAdd,
            18 => Self::ThreadCreated,
            19 => Self::Reply,
            20 => Self::ChatInputCommand,
            21 => Self::ThreadStarterMessage,
            22 => Self::GuildInviteReminder,
            23 => Self::ContextMenuCommand,
            24 => Self::AutoModerationAction,
            _ => Self::Default,
        }
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> Self {
        kind as Self
    }
}

impl MessageKind {
    /// Returns true if this is a regular user message.
    #[must_use]
    pub const fn is_regular(self) -> bool {
        matches!(
            self,
            Self::Default | Self::Reply | Self::ChatInputCommand | Self::ContextMenuCommand
        )
    }

    /// Returns true if this is a system message.
    #[must_use]
    pub const fn is_system(self) -> bool {
        !self.is_regular()
    }
}

/// Discord message attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    id: String,
    filename: String,
    size: u64,
    url: String,
}

impl Attachment {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        size: u64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            size,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Size rendered with a binary unit, e.g. `1.5 KiB`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn human_size(&self) -> String {
        const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

        if self.size < 1024 {
            return format!("{} B", self.size);
        }

        let mut value = self.size as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// A message author or mentioned user, with the guild overlay when the
/// message was sent in a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participant {
    User(User),
    Member(Member),
}

impl Participant {
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::User(user) => user,
            Self::Member(member) => member.user(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> UserId {
        self.user().id()
    }

    /// Nickname, then global name, then username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::User(user) => user.display_name(),
            Self::Member(member) => member.display_name(),
        }
    }
}

/// A chat message. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
    author: Participant,
    content: String,
    kind: MessageKind,
    timestamp: DateTime<Utc>,
    edited_timestamp: Option<DateTime<Utc>>,
    mention_everyone: bool,
    mentions: Vec<Participant>,
    mention_roles: Vec<RoleId>,
    attachments: Vec<Attachment>,
}

impl Message {
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        author: Participant,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            guild_id: None,
            author,
            content: content.into(),
            kind: MessageKind::Default,
            timestamp,
            edited_timestamp: None,
            mention_everyone: false,
            mentions: Vec::new(),
            mention_roles: Vec::new(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_guild(mut self, guild_id: Option<GuildId>) -> Self {
        self.guild_id = guild_id;
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: Participant) -> Self {
        self.author = author;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn with_edited_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.edited_timestamp = timestamp;
        self
    }

    #[must_use]
    pub const fn with_mention_everyone(mut self, mention_everyone: bool) -> Self {
        self.mention_everyone = mention_everyone;
        self
    }

    #[must_use]
    pub fn with_mentions(mut self, mentions: Vec<Participant>) -> Self {
        self.mentions = mentions;
        self
    }

    #[must_use]
    pub fn with_mention_roles(mut self, roles: Vec<RoleId>) -> Self {
        self.mention_roles = roles;
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    #[must_use]
    pub const fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }

    #[must_use]
    pub const fn author(&self) -> &Participant {
        &self.author
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn edited_timestamp(&self) -> Option<DateTime<Utc>> {
        self.edited_timestamp
    }

    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }

    #[must_use]
    pub const fn mention_everyone(&self) -> bool {
        self.mention_everyone
    }

    #[must_use]
    pub fn mentions(&self) -> &[Participant] {
        &self.mentions
    }

    #[must_use]
    pub fn mention_roles(&self) -> &[RoleId] {
        &self.mention_roles
    }

    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Looks up a mentioned participant by id.
    #[must_use]
    pub fn mentioned(&self, id: UserId) -> Option<&Participant> {
        self.mentions.iter().find(|mention| mention.id() == id)
    }
}
