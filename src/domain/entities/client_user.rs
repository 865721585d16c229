//! The local account and everything this session knows about.

use std::collections::HashMap;

use super::{Channel, ChannelId, Guild, GuildId, User, UserId};
use crate::domain::errors::{IndexKind, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelLocation {
    Guild(usize),
    Private(usize),
}

/// Session scoped indices rooted at the local user.
///
/// Guilds and private channels keep the order they arrived in, which is the
/// order the positional navigation commands index into.
#[derive(Debug, Clone)]
pub struct ClientUser {
    me: User,
    users: HashMap<UserId, User>,
    guilds: Vec<Guild>,
    private_channels: Vec<Channel>,
    channel_index: HashMap<ChannelId, ChannelLocation>,
    focus: Option<ChannelId>,
}

impl ClientUser {
    #[must_use]
    pub fn new(me: User) -> Self {
        let mut users = HashMap::new();
        users.insert(me.id(), me.clone());
        Self {
            me,
            users,
            guilds: Vec::new(),
            private_channels: Vec::new(),
            channel_index: HashMap::new(),
            focus: None,
        }
    }

    #[must_use]
    pub const fn me(&self) -> &User {
        &self.me
    }

    /// Returns the known user with this id, inserting `user` if it is new.
    /// Existing entries are never replaced.
    pub fn remember_user(&mut self, user: User) -> &User {
        self.users.entry(user.id()).or_insert(user)
    }

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn add_guild(&mut self, guild: Guild) {
        if self.guild(guild.id()).is_some() {
            return;
        }
        let index = self.guilds.len();
        for channel in guild.channels() {
            self.channel_index
                .insert(channel.id(), ChannelLocation::Guild(index));
        }
        self.guilds.push(guild);
    }

    pub fn add_private_channel(&mut self, channel: Channel) {
        if self.channel_index.contains_key(&channel.id()) {
            return;
        }
        self.channel_index.insert(
            channel.id(),
            ChannelLocation::Private(self.private_channels.len()),
        );
        self.private_channels.push(channel);
    }

    #[must_use]
    pub fn guilds(&self) -> &[Guild] {
        &self.guilds
    }

    #[must_use]
    pub fn guild(&self, id: GuildId) -> Option<&Guild> {
        self.guilds.iter().find(|guild| guild.id() == id)
    }

    pub fn guild_mut(&mut self, id: GuildId) -> Option<&mut Guild> {
        self.guilds.iter_mut().find(|guild| guild.id() == id)
    }

    /// # Errors
    ///
    /// Returns `ModelError::IndexOutOfRange` when `index` is not a known guild position.
    pub fn guild_at(&self, index: usize) -> Result<&Guild, ModelError> {
        self.guilds
            .get(index)
            .ok_or(ModelError::index(IndexKind::Guild))
    }

    #[must_use]
    pub fn private_channels(&self) -> &[Channel] {
        &self.private_channels
    }

    #[must_use]
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        match self.channel_index.get(&id)? {
            ChannelLocation::Guild(index) => self.guilds.get(*index)?.channel(id),
            ChannelLocation::Private(index) => self.private_channels.get(*index),
        }
    }

    #[must_use]
    pub const fn focus(&self) -> Option<ChannelId> {
        self.focus
    }

    #[must_use]
    pub fn focus_channel(&self) -> Option<&Channel> {
        self.focus.and_then(|id| self.channel(id))
    }

    #[must_use]
    pub fn is_focused(&self, channel_id: ChannelId) -> bool {
        self.focus == Some(channel_id)
    }

    /// Focuses the `channel`-th selectable channel of the `guild`-th guild.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::IndexOutOfRange` for an unknown guild position or a
    /// channel position past the selectable channels. Focus is left untouched.
    pub fn focus_guild_channel(
        &mut self,
        guild: usize,
        channel: usize,
    ) -> Result<&Channel, ModelError> {
        let id = self
            .guild_at(guild)?
            .selectable_channels()
            .nth(channel)
            .map(Channel::id)
            .ok_or(ModelError::index(IndexKind::Channel))?;

        self.focus = Some(id);
        self.channel(id).ok_or(ModelError::index(IndexKind::Channel))
    }

    /// Focuses the `index`-th private channel.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::IndexOutOfRange` when `index` is not a known private channel.
    pub fn focus_private_channel(&mut self, index: usize) -> Result<&Channel, ModelError> {
        let channel = self
            .private_channels
            .get(index)
            .ok_or(ModelError::index(IndexKind::PrivateChannel))?;
        self.focus = Some(channel.id());
        Ok(channel)
    }
}
