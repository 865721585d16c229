use super::{Permissions, Role, User};

/// A user's per-guild overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    user: User,
    nick: Option<String>,
    roles: Vec<Role>,
    permissions: Option<Permissions>,
}

impl Member {
    #[must_use]
    pub const fn new(user: User) -> Self {
        Self {
            user,
            nick: None,
            roles: Vec::new(),
            permissions: None,
        }
    }

    #[must_use]
    pub fn with_nick(mut self, nick: Option<String>) -> Self {
        self.nick = nick;
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub const fn with_permissions(mut self, permissions: Option<Permissions>) -> Self {
        self.permissions = permissions;
        self
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    #[must_use]
    pub const fn permissions(&self) -> Option<Permissions> {
        self.permissions
    }

    /// Nickname, falling back to the global name and then the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nick
            .as_deref()
            .unwrap_or_else(|| self.user.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_precedence() {
        let user = User::new(1_u64, "handle").with_global_name(Some("Global".into()));

        let with_nick = Member::new(user.clone()).with_nick(Some("Nick".into()));
        assert_eq!(with_nick.display_name(), "Nick");

        let without_nick = Member::new(user);
        assert_eq!(without_nick.display_name(), "Global");

        let bare = Member::new(User::new(2_u64, "handle"));
        assert_eq!(bare.display_name(), "handle");
    }
}
