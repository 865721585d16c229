//! Discord guild entity.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Channel, ChannelId, Member, Role, RoleId, UserId};

/// Unique identifier for a Discord guild (server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(#[serde(with = "crate::domain::serde_utils::string_to_u64")] pub u64);

impl GuildId {
    /// Returns the underlying u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GuildId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Discord guild (server) information.
///
/// The channel list is stored in display order: categories interleaved with
/// their children, both levels sorted by `position` with input order breaking
/// ties. Channels whose parent is not a known category sit at the top level.
#[derive(Debug, Clone)]
pub struct Guild {
    id: GuildId,
    name: String,
    description: Option<String>,
    roles: Vec<Role>,
    channels: Vec<Channel>,
    members: HashMap<UserId, Member>,
}

impl Guild {
    #[must_use]
    pub fn new(id: impl Into<GuildId>, name: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            roles: Vec::new(),
            channels: flatten_channels(channels),
            members: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub const fn id(&self) -> GuildId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    #[must_use]
    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == id)
    }

    /// Roles from this guild whose ids appear in `ids`, in guild order.
    #[must_use]
    pub fn roles_matching(&self, ids: &[RoleId]) -> Vec<Role> {
        let wanted: HashSet<RoleId> = ids.iter().copied().collect();
        self.roles
            .iter()
            .filter(|role| wanted.contains(&role.id))
            .cloned()
            .collect()
    }

    /// Every channel including categories, in display order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[must_use]
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.id() == id)
    }

    /// Channels a user may focus, in display order. Categories are skipped.
    pub fn selectable_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels
            .iter()
            .filter(|channel| !channel.kind().is_category())
    }

    #[must_use]
    pub fn member(&self, user_id: UserId) -> Option<&Member> {
        self.members.get(&user_id)
    }

    /// Records the member overlay, keeping the first one seen for a user.
    pub fn remember_member(&mut self, member: Member) {
        self.members.entry(member.user().id()).or_insert(member);
    }
}

fn flatten_channels(channels: Vec<Channel>) -> Vec<Channel> {
    let categories: HashSet<ChannelId> = channels
        .iter()
        .filter(|channel| channel.kind().is_category())
        .map(Channel::id)
        .collect();

    let is_child = |channel: &Channel| {
        !channel.kind().is_category()
            && channel
                .parent_id()
                .is_some_and(|parent| categories.contains(&parent))
    };

    let (mut children, mut top_level): (Vec<Channel>, Vec<Channel>) =
        channels.into_iter().partition(|channel| is_child(channel));

    top_level.sort_by_key(Channel::position);
    children.sort_by_key(Channel::position);

    let mut ordered = Vec::with_capacity(top_level.len() + children.len());
    for entry in top_level {
        let anchor = entry.kind().is_category().then(|| entry.id());
        ordered.push(entry);

        if let Some(category) = anchor {
            ordered.extend(
                children
                    .iter()
                    .filter(|child| child.parent_id() == Some(category))
                    .cloned(),
            );
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChannelKind, User};

    fn category(id: u64, position: i32) -> Channel {
        Channel::new(id, ChannelKind::Category)
            .with_name(format!("cat{id}"))
            .with_position(position)
    }

    fn text(id: u64, position: i32, parent: Option<u64>) -> Channel {
        let channel = Channel::new(id, ChannelKind::Text)
            .with_name(format!("chan{id}"))
            .with_position(position);
        match parent {
            Some(parent) => channel.with_parent(parent),
            None => channel,
        }
    }

    fn ids(guild: &Guild) -> Vec<u64> {
        guild.channels().iter().map(|c| c.id().as_u64()).collect()
    }

    #[test]
    fn test_categories_interleave_with_children() {
        // C1=1, C2=2, A=10, B=11, D=12
        let guild = Guild::new(
            1_u64,
            "guild",
            vec![
                text(10, 0, Some(2)),
                text(11, 1, Some(1)),
                category(2, 1),
                text(12, 5, None),
                category(1, 0),
            ],
        );

        assert_eq!(ids(&guild), vec![1, 11, 2, 10, 12]);
    }

    #[test]
    fn test_position_ties_keep_input_order() {
        let guild = Guild::new(
            1_u64,
            "guild",
            vec![text(30, 0, None), text(20, 0, None), text(10, 0, None)],
        );

        assert_eq!(ids(&guild), vec![30, 20, 10]);
    }

    #[test]
    fn test_unknown_parent_is_top_level() {
        let guild = Guild::new(
            1_u64,
            "guild",
            vec![category(1, 0), text(5, 1, Some(999)), text(6, 0, Some(1))],
        );

        assert_eq!(ids(&guild), vec![1, 6, 5]);
    }

    #[test]
    fn test_selectable_channels_skip_categories() {
        let guild = Guild::new(
            1_u64,
            "guild",
            vec![category(1, 0), text(2, 0, Some(1)), category(3, 1)],
        );

        let selectable: Vec<u64> = guild
            .selectable_channels()
            .map(|c| c.id().as_u64())
            .collect();
        assert_eq!(selectable, vec![2]);
    }

    #[test]
    fn test_roles_matching_keeps_guild_order() {
        let guild = Guild::new(1_u64, "guild", Vec::new()).with_roles(vec![
            Role::new(10_u64, "admin"),
            Role::new(20_u64, "mod"),
            Role::new(30_u64, "member"),
        ]);

        let roles = guild.roles_matching(&[RoleId(30), RoleId(10), RoleId(99)]);
        let names: Vec<&str> = roles.iter().map(Role::name).collect();
        assert_eq!(names, vec!["admin", "member"]);
    }

    #[test]
    fn test_remember_member_keeps_first() {
        let mut guild = Guild::new(1_u64, "guild", Vec::new());
        let user = User::new(5_u64, "user");
        guild.remember_member(Member::new(user.clone()).with_nick(Some("first".into())));
        guild.remember_member(Member::new(user).with_nick(Some("second".into())));

        assert_eq!(
            guild.member(UserId(5)).and_then(Member::nick),
            Some("first")
        );
    }
}
