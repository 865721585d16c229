//! Wire shapes shared by the gateway and the REST API, and their conversion
//! into domain entities.
//!
//! Fields are optional at the serde level; the `into_*` conversions decide
//! which ones are required and report the first missing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    Attachment, Channel, ChannelKind, Guild, Member, Message, MessageKind, Participant,
    PermissionOverwrite, Permissions, Role, RoleId, User, UserId,
};
use crate::domain::errors::ModelError;
use crate::domain::events::{MessageEvent, PrivateChannelEntry};

/// Milliseconds between the Unix epoch and the first snowflake.
const SNOWFLAKE_EPOCH_MS: u64 = 1_420_070_400_000;

/// Creation time encoded in a snowflake.
#[must_use]
pub fn snowflake_timestamp(id: u64) -> Option<DateTime<Utc>> {
    let millis = (id >> 22).checked_add(SNOWFLAKE_EPOCH_MS)?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

#[derive(Debug, Default, Deserialize)]
pub struct UserDto {
    #[serde(default, with = "crate::domain::serde_utils::string_to_u64::option")]
    pub id: Option<u64>,
    pub username: Option<String>,
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl UserDto {
    /// # Errors
    ///
    /// Returns `ModelError::MissingField` when the id or username is absent.
    pub fn into_user(self) -> Result<User, ModelError> {
        let id = self.id.ok_or(ModelError::missing("user", "id"))?;
        let username = self
            .username
            .ok_or(ModelError::missing("user", "username"))?;

        Ok(User::new(id, username)
            .with_global_name(self.global_name)
            .with_bot(self.bot))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberDto {
    pub nick: Option<String>,
    #[serde(default, with = "crate::domain::serde_utils::vec_string_to_u64")]
    pub roles: Vec<u64>,
    pub permissions: Option<Permissions>,
}

impl MemberDto {
    /// Builds the overlay for `user`. Roles are returned as ids to be resolved
    /// against the guild role list.
    #[must_use]
    pub fn into_member(self, user: User) -> (Member, Vec<RoleId>) {
        let role_ids = self.roles.into_iter().map(RoleId).collect();
        let member = Member::new(user)
            .with_nick(self.nick)
            .with_permissions(self.permissions);
        (member, role_ids)
    }
}

/// A mentioned user, optionally carrying its guild overlay.
#[derive(Debug, Deserialize)]
pub struct MentionDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub member: Option<MemberDto>,
}

impl MentionDto {
    /// # Errors
    ///
    /// Returns `ModelError::MissingField` when the user is incomplete.
    pub fn into_participant(self) -> Result<Participant, ModelError> {
        let user = self.user.into_user()?;
        Ok(match self.member {
            Some(member) => Participant::Member(member.into_member(user).0),
            None => Participant::User(user),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelDto {
    #[serde(default, with = "crate::domain::serde_utils::string_to_u64::option")]
    pub id: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: ChannelKind,
    pub name: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default, with = "crate::domain::serde_utils::string_to_u64::option")]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
    #[serde(default, with = "crate::domain::serde_utils::vec_string_to_u64")]
    pub recipient_ids: Vec<u64>,
    #[serde(default)]
    pub recipients: Vec<UserDto>,
}

impl ChannelDto {
    fn base(id: Option<u64>, kind: ChannelKind, name: Option<String>) -> Result<Channel, ModelError> {
        let channel = Channel::new(id.ok_or(ModelError::missing("channel", "id"))?, kind);
        Ok(match name {
            Some(name) => channel.with_name(name),
            None => channel,
        })
    }

    /// Builds a channel belonging to `guild_id`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingField` when the id is absent.
    pub fn into_guild_channel(self, guild_id: u64) -> Result<Channel, ModelError> {
        let channel = Self::base(self.id, self.kind, self.name)?
            .with_guild(guild_id)
            .with_position(self.position)
            .with_overwrites(self.permission_overwrites);

        Ok(match self.parent_id {
            Some(parent) => channel.with_parent(parent),
            None => channel,
        })
    }

    /// Builds a private channel entry. Inline recipients are returned as well
    /// so they can join the known users.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingField` when the id or an inline recipient is incomplete.
    pub fn into_private_channel(self) -> Result<(PrivateChannelEntry, Vec<User>), ModelError> {
        let channel = Self::base(self.id, self.kind, self.name)?.with_position(self.position);

        let inline = self
            .recipients
            .into_iter()
            .map(UserDto::into_user)
            .collect::<Result<Vec<_>, _>>()?;

        let mut recipient_ids: Vec<UserId> = self.recipient_ids.into_iter().map(UserId).collect();
        for user in &inline {
            if !recipient_ids.contains(&user.id()) {
                recipient_ids.push(user.id());
            }
        }

        Ok((
            PrivateChannelEntry {
                channel,
                recipient_ids,
            },
            inline,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GuildPropertiesDto {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GuildDto {
    #[serde(default, with = "crate::domain::serde_utils::string_to_u64::option")]
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Option<GuildPropertiesDto>,
    #[serde(default)]
    pub channels: Vec<ChannelDto>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl GuildDto {
    /// Builds the guild with its channel list in display order. The name is
    /// read from `properties` first, then from the top level.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingField` when the id, the name or a channel id is absent.
    pub fn into_guild(self) -> Result<Guild, ModelError> {
        let id = self.id.ok_or(ModelError::missing("guild", "id"))?;
        let properties = self.properties.unwrap_or_default();
        let name = properties
            .name
            .or(self.name)
            .ok_or(ModelError::missing("guild", "name"))?;
        let description = properties.description.or(self.description);

        let channels = self
            .channels
            .into_iter()
            .map(|channel| channel.into_guild_channel(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Guild::new(id, name, channels)
            .with_description(description)
            .with_roles(self.roles))
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachmentDto {
    #[serde(with = "crate::domain::serde_utils::string_to_u64")]
    pub id: u64,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub url: String,
}

impl From<AttachmentDto> for Attachment {
    fn from(dto: AttachmentDto) -> Self {
        Self::new(dto.id.to_string(), dto.filename, dto.size, dto.url)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageDto {
    #[serde(default, with = "crate::domain::serde_utils::string_to_u64::option")]
    pub id: Option<u64>,
    #[serde(default, with = "crate::domain::serde_utils::string_to_u64::option")]
    pub channel_id: Option<u64>,
    #[serde(default, with = "crate::domain::serde_utils::string_to_u64::option")]
    pub guild_id: Option<u64>,
    pub author: Option<UserDto>,
    pub member: Option<MemberDto>,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    pub timestamp: Option<DateTime<Utc>>,
    pub edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mention_everyone: bool,
    #[serde(default)]
    pub mentions: Vec<MentionDto>,
    #[serde(default, with = "crate::domain::serde_utils::vec_string_to_u64")]
    pub mention_roles: Vec<u64>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDto>,
}

impl MessageDto {
    /// Builds the message and the author's guild role ids.
    ///
    /// A missing creation timestamp falls back to the one encoded in the id.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingField` when the message id, channel id or
    /// author id is absent.
    pub fn into_event(self) -> Result<MessageEvent, ModelError> {
        let id = self.id.ok_or(ModelError::missing("message", "id"))?;
        let channel_id = self
            .channel_id
            .ok_or(ModelError::missing("message", "channel_id"))?;
        let author = self
            .author
            .ok_or(ModelError::missing("message", "author"))?
            .into_user()?;

        let timestamp = self
            .timestamp
            .or_else(|| snowflake_timestamp(id))
            .ok_or(ModelError::invalid("message", "timestamp", "out of range"))?;

        let (author, member_role_ids) = match self.member {
            Some(member) if self.guild_id.is_some() => {
                let (member, roles) = member.into_member(author);
                (Participant::Member(member), roles)
            }
            _ => (Participant::User(author), Vec::new()),
        };

        let mentions = self
            .mentions
            .into_iter()
            .map(MentionDto::into_participant)
            .collect::<Result<Vec<_>, _>>()?;

        let message = Message::new(id, channel_id, author, self.content, timestamp)
            .with_guild(self.guild_id.map(Into::into))
            .with_kind(self.kind)
            .with_edited_timestamp(self.edited_timestamp)
            .with_mention_everyone(self.mention_everyone)
            .with_mentions(mentions)
            .with_mention_roles(self.mention_roles.into_iter().map(RoleId).collect())
            .with_attachments(self.attachments.into_iter().map(Into::into).collect());

        Ok(MessageEvent {
            message,
            member_role_ids,
        })
    }
}

/// Body of a create-message request.
#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub content: &'a str,
}

/// Discord API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub retry_after: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChannelId, GuildId};
    use serde_json::json;

    #[test]
    fn test_message_from_gateway_json() {
        let dto: MessageDto = serde_json::from_value(json!({
            "id": "1100000000000000000",
            "channel_id": "200",
            "guild_id": "300",
            "author": { "id": "7", "username": "alice", "global_name": "Alice" },
            "member": { "nick": "Al", "roles": ["11", "12"] },
            "content": "hi <@8>",
            "type": 0,
            "timestamp": "2024-05-01T12:30:45.000000+00:00",
            "edited_timestamp": null,
            "mention_everyone": false,
            "mentions": [
                { "id": "8", "username": "bob", "member": { "nick": "Bobby" } }
            ],
            "mention_roles": ["11"],
            "attachments": [
                { "id": "9", "filename": "cat.png", "size": 2048, "url": "https://cdn/cat.png" }
            ]
        }))
        .unwrap();

        let event = dto.into_event().unwrap();
        let message = event.message;

        assert_eq!(message.channel_id(), ChannelId(200));
        assert_eq!(message.guild_id(), Some(GuildId(300)));
        assert_eq!(message.author().display_name(), "Al");
        assert_eq!(event.member_role_ids, vec![RoleId(11), RoleId(12)]);
        assert_eq!(message.mentioned(UserId(8)).map(Participant::display_name), Some("Bobby"));
        assert_eq!(message.mention_roles(), &[RoleId(11)]);
        assert_eq!(message.attachments()[0].filename(), "cat.png");
        assert_eq!(message.timestamp().to_rfc3339(), "2024-05-01T12:30:45+00:00");
    }

    #[test]
    fn test_message_missing_required_fields() {
        let no_channel: MessageDto = serde_json::from_value(json!({
            "id": "1",
            "author": { "id": "7", "username": "alice" }
        }))
        .unwrap();
        assert_eq!(
            no_channel.into_event().unwrap_err(),
            ModelError::missing("message", "channel_id")
        );

        let no_author: MessageDto =
            serde_json::from_value(json!({ "id": "1", "channel_id": "2" })).unwrap();
        assert_eq!(
            no_author.into_event().unwrap_err(),
            ModelError::missing("message", "author")
        );
    }

    #[test]
    fn test_member_ignored_outside_guilds() {
        let dto: MessageDto = serde_json::from_value(json!({
            "id": "1",
            "channel_id": "2",
            "author": { "id": "7", "username": "alice" },
            "member": { "nick": "ignored" }
        }))
        .unwrap();

        let event = dto.into_event().unwrap();
        assert!(matches!(event.message.author(), Participant::User(_)));
    }

    #[test]
    fn test_timestamp_falls_back_to_snowflake() {
        // 175928847299117063 was created at 2016-04-30T11:18:25.796Z
        let created = snowflake_timestamp(175_928_847_299_117_063).unwrap();
        assert_eq!(created.timestamp_millis(), 1_462_015_105_796);
    }

    #[test]
    fn test_guild_name_from_properties() {
        let dto: GuildDto = serde_json::from_value(json!({
            "id": "1",
            "properties": { "name": "From Properties" },
            "name": "Top Level",
            "channels": [
                { "id": "10", "type": 4, "name": "cat", "position": 0 },
                { "id": "11", "type": 0, "name": "general", "position": 0, "parent_id": "10" }
            ],
            "roles": [ { "id": "1", "name": "@everyone", "permissions": "1024" } ]
        }))
        .unwrap();

        let guild = dto.into_guild().unwrap();
        assert_eq!(guild.name(), "From Properties");
        assert_eq!(guild.selectable_channels().count(), 1);
        assert_eq!(guild.roles().len(), 1);

        let plain: GuildDto =
            serde_json::from_value(json!({ "id": "2", "name": "Top Level" })).unwrap();
        assert_eq!(plain.into_guild().unwrap().name(), "Top Level");
    }

    #[test]
    fn test_private_channel_with_inline_recipients() {
        let dto: ChannelDto = serde_json::from_value(json!({
            "id": "5",
            "type": 1,
            "recipient_ids": ["7"],
            "recipients": [ { "id": "8", "username": "bob" } ]
        }))
        .unwrap();

        let (entry, inline) = dto.into_private_channel().unwrap();
        assert_eq!(entry.recipient_ids, vec![UserId(7), UserId(8)]);
        assert_eq!(inline.len(), 1);
        assert_eq!(entry.channel.kind(), ChannelKind::Dm);
    }
}
