//! Turns messages and client notices into styled, unwrapped scrollback text.

use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

use super::style::{
    BOLD, CLIENT_COL, CODE_BLOCK, DARKEN, ITALICS, PING, PING_ME, PING_MUTED, RESET,
    STRIKETHROUGH, UNDERLINE, keep_style, paint, sanitize,
};
use crate::domain::entities::{ClientUser, Message, Role, RoleId, UserId};

static USER_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@!?(\d+)>").unwrap());
static ROLE_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@&(\d+)>").unwrap());

static EMPHASIS: LazyLock<[(Regex, &'static str); 5]> = LazyLock::new(|| {
    [
        (Regex::new(r"\*\*(.+?)\*\*").unwrap(), BOLD),
        (Regex::new(r"\*(.+?)\*").unwrap(), ITALICS),
        (Regex::new(r"__(.+?)__").unwrap(), UNDERLINE),
        (Regex::new(r"~~(.+?)~~").unwrap(), STRIKETHROUGH),
        (Regex::new(r"`(.+?)`").unwrap(), CODE_BLOCK),
    ]
});

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Formats messages for one local user.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    timestamp_format: String,
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTAMP_FORMAT)
    }
}

impl MessageFormatter {
    /// An invalid strftime pattern falls back to `%H:%M:%S`.
    #[must_use]
    pub fn new(timestamp_format: impl Into<String>) -> Self {
        let mut timestamp_format = timestamp_format.into();
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            tracing::warn!(format = %timestamp_format, "Invalid timestamp format, using default");
            timestamp_format = DEFAULT_TIMESTAMP_FORMAT.to_string();
        }
        Self { timestamp_format }
    }

    /// Columns taken by the `[timestamp] ` prefix, used to indent wrapped
    /// lines under the author.
    #[must_use]
    pub fn prefix_width(&self) -> usize {
        format!("[{}] ", Local::now().format(&self.timestamp_format)).width()
    }

    /// Formats `message` using the local user and, for guild messages, the
    /// guild's role list.
    #[must_use]
    pub fn format(&self, message: &Message, client: &ClientUser) -> String {
        let roles = message
            .guild_id()
            .and_then(|id| client.guild(id))
            .map_or(&[][..], |guild| guild.roles());
        self.format_with(message, client.me().id(), roles)
    }

    /// Produces `[HH:MM:SS] name> content` with mentions resolved and
    /// emphasis applied, in that order.
    #[must_use]
    pub fn format_with(&self, message: &Message, me: UserId, roles: &[Role]) -> String {
        let mut content = resolve_user_mentions(&sanitize(message.content()), message, me);
        content = resolve_role_mentions(&content, roles);
        content = resolve_everyone(&content, message.mention_everyone());
        content = content.replace("@here", &paint(PING_ME, "@here"));
        content = apply_emphasis(&content);

        let mut extras = Vec::new();
        for attachment in message.attachments() {
            extras.push(paint(
                DARKEN,
                &format!(
                    "[attachment: {} ({})]",
                    sanitize(attachment.filename()),
                    attachment.human_size()
                ),
            ));
        }
        if message.is_edited() {
            extras.push(paint(DARKEN, "(edited)"));
        }
        for extra in extras {
            if !content.is_empty() {
                content.push(' ');
            }
            content.push_str(&extra);
        }

        if message.kind().is_system() {
            content = format!("{DARKEN}{}{RESET}", keep_style(&content, DARKEN));
        }

        let timestamp = message
            .timestamp()
            .with_timezone(&Local)
            .format(&self.timestamp_format);

        format!(
            "{DARKEN}[{timestamp}]{RESET} {}{DARKEN}>{RESET} {content}",
            sanitize(message.author().display_name())
        )
    }
}

/// Styles a client notice: a `[CLIENT]` tag followed by the text.
#[must_use]
pub fn format_log(text: &str) -> String {
    let body = keep_style(text, CLIENT_COL[2]);
    format!("{}[CLIENT]{} {body}{RESET}", CLIENT_COL[0], CLIENT_COL[2])
}

fn resolve_user_mentions(content: &str, message: &Message, me: UserId) -> String {
    USER_MENTION_RE
        .replace_all(content, |caps: &Captures| {
            let participant = caps[1]
                .parse::<u64>()
                .ok()
                .and_then(|id| message.mentioned(UserId(id)));

            match participant {
                Some(participant) => {
                    let style = if participant.id() == me { PING_ME } else { PING };
                    paint(style, &format!("@{}", sanitize(participant.display_name())))
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn resolve_role_mentions(content: &str, roles: &[Role]) -> String {
    ROLE_MENTION_RE
        .replace_all(content, |caps: &Captures| {
            let role = caps[1]
                .parse::<u64>()
                .ok()
                .and_then(|id| roles.iter().find(|role| role.id() == RoleId(id)));

            role.map_or_else(
                || caps[0].to_string(),
                |role| paint(PING, &format!("@{}", sanitize(role.name()))),
            )
        })
        .into_owned()
}

fn resolve_everyone(content: &str, mention_everyone: bool) -> String {
    let style = if mention_everyone { PING_ME } else { PING_MUTED };
    content.replace("@everyone", &paint(style, "@everyone"))
}

fn apply_emphasis(content: &str) -> String {
    EMPHASIS
        .iter()
        .fold(content.to_string(), |text, (pattern, style)| {
            pattern
                .replace_all(&text, |caps: &Captures| paint(style, &caps[1]))
                .into_owned()
        })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use test_case::test_case;

    use super::*;
    use crate::domain::entities::{
        Attachment, ChannelId, Member, MessageId, MessageKind, Participant, User,
    };

    const ME: UserId = UserId(42);

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap()
    }

    fn stamp() -> String {
        at().with_timezone(&Local).format("%H:%M:%S").to_string()
    }

    fn message(content: &str) -> Message {
        Message::new(
            MessageId(1),
            ChannelId(2),
            Participant::User(User::new(7, "alice")),
            content,
            at(),
        )
    }

    fn format(message: &Message) -> String {
        MessageFormatter::default().format_with(message, ME, &[])
    }

    #[test]
    fn test_plain_message_only_gets_prefix_styling() {
        let text = format(&message("just words here"));
        assert_eq!(
            text,
            format!("{DARKEN}[{}]{RESET} alice{DARKEN}>{RESET} just words here", stamp())
        );
    }

    #[test]
    fn test_member_nick_is_used_for_author() {
        let member = Member::new(User::new(7, "alice").with_global_name(Some("Alice".into())))
            .with_nick(Some("ally".into()));
        let msg = message("hi").with_author(Participant::Member(member));
        assert!(format(&msg).contains(" ally\x1b[90m>"));
    }

    #[test]
    fn test_self_mention_uses_self_style() {
        let msg = message("hey <@42>").with_mentions(vec![Participant::User(User::new(42, "me"))]);
        assert!(format(&msg).ends_with(&format!("hey {PING_ME}@me{RESET}")));
    }

    #[test]
    fn test_other_mention_uses_other_style() {
        let msg = message("hey <@!99>").with_mentions(vec![Participant::User(
            User::new(99, "bob").with_global_name(Some("Bobby".into())),
        )]);
        assert!(format(&msg).ends_with(&format!("hey {PING}@Bobby{RESET}")));
    }

    #[test]
    fn test_unknown_mention_is_left_verbatim() {
        assert!(format(&message("hey <@5>")).ends_with("hey <@5>"));
    }

    #[test]
    fn test_role_mention_resolves_against_roles() {
        let roles = vec![Role::new(11, "mods")];
        let msg = message("ping <@&11> and <@&12>").with_mention_roles(vec![RoleId(11)]);
        let text = MessageFormatter::default().format_with(&msg, ME, &roles);
        assert!(text.ends_with(&format!("ping {PING}@mods{RESET} and <@&12>")));
    }

    #[test_case(true, PING_ME ; "pinged")]
    #[test_case(false, PING_MUTED ; "not_pinged")]
    fn test_everyone_highlight(mention_everyone: bool, style: &str) {
        let msg = message("@everyone look").with_mention_everyone(mention_everyone);
        assert!(format(&msg).ends_with(&format!("{style}@everyone{RESET} look")));
    }

    #[test]
    fn test_here_is_always_strong() {
        assert!(format(&message("@here now")).ends_with(&format!("{PING_ME}@here{RESET} now")));
    }

    #[test_case("**bold**", BOLD, "bold" ; "bold")]
    #[test_case("*it*", ITALICS, "it" ; "italics")]
    #[test_case("__under__", UNDERLINE, "under" ; "underline")]
    #[test_case("~~gone~~", STRIKETHROUGH, "gone" ; "strikethrough")]
    #[test_case("`code`", CODE_BLOCK, "code" ; "code")]
    fn test_emphasis(input: &str, style: &str, inner: &str) {
        assert!(format(&message(input)).ends_with(&paint(style, inner)));
    }

    #[test]
    fn test_bold_is_not_read_as_italics() {
        let text = format(&message("**a** and *b*"));
        assert!(text.ends_with(&format!("{BOLD}a{RESET} and {ITALICS}b{RESET}")));
    }

    #[test]
    fn test_emphasis_is_non_greedy() {
        let text = format(&message("**a** x **b**"));
        assert!(text.ends_with(&format!("{BOLD}a{RESET} x {BOLD}b{RESET}")));
    }

    #[test]
    fn test_attachments_and_edit_marker() {
        let msg = message("look")
            .with_attachments(vec![Attachment::new("1", "cat.png", 1536, "https://cdn/cat.png")])
            .with_edited_timestamp(Some(at()));
        let text = format(&msg);
        assert!(text.ends_with(&format!(
            "look {DARKEN}[attachment: cat.png (1.5 KiB)]{RESET} {DARKEN}(edited){RESET}"
        )));
    }

    #[test]
    fn test_attachment_only_message_has_no_leading_space() {
        let msg = message("")
            .with_attachments(vec![Attachment::new("1", "a.txt", 10, "https://cdn/a.txt")]);
        assert!(format(&msg).ends_with(&format!(
            "{RESET} {DARKEN}[attachment: a.txt (10 B)]{RESET}"
        )));
    }

    #[test]
    fn test_system_message_is_dimmed() {
        let msg = message("joined **now**").with_kind(MessageKind::UserJoin);
        let text = format(&msg);
        assert!(text.ends_with(&format!(
            "{DARKEN}joined {BOLD}now{RESET}{DARKEN}{RESET}"
        )));
    }

    #[test]
    fn test_format_uses_guild_roles_and_local_id() {
        use crate::domain::entities::{Channel, ChannelKind, Guild, GuildId};

        let mut client = ClientUser::new(User::new(42, "me"));
        client.add_guild(
            Guild::new(5, "g", vec![Channel::new(2, ChannelKind::Text).with_guild(5)])
                .with_roles(vec![Role::new(11, "mods")]),
        );
        let msg = message("<@&11> <@42>")
            .with_guild(Some(GuildId(5)))
            .with_mentions(vec![Participant::User(User::new(42, "me"))]);

        let text = MessageFormatter::default().format(&msg, &client);
        assert!(text.ends_with(&format!("{PING}@mods{RESET} {PING_ME}@me{RESET}")));
    }

    #[test]
    fn test_invalid_timestamp_format_falls_back() {
        let formatter = MessageFormatter::new("%Q");
        let text = formatter.format_with(&message("x"), ME, &[]);
        assert!(text.starts_with(&format!("{DARKEN}[{}]", stamp())));
    }

    #[test]
    fn test_remote_control_sequences_are_neutralized() {
        let msg = message("hi\x1b[2J\x1b[H\x1b]0;owned\x07")
            .with_author(Participant::User(User::new(7, "al\x1b[31mice")));
        let text = format(&msg);

        let (_, content) = text.split_once(&format!("{DARKEN}>{RESET} ")).unwrap();
        assert!(!content.contains(['\x1b', '\x07']));
        assert!(content.starts_with("hi\u{fffd}[2J"));
        assert!(text.contains(" al\u{fffd}[31mice"));
    }

    #[test_case(DEFAULT_TIMESTAMP_FORMAT, 11 ; "default")]
    #[test_case("%Y-%m-%d %H:%M:%S", 22 ; "date_and_time")]
    #[test_case("%H:%M", 8 ; "short")]
    fn test_prefix_width_follows_timestamp_format(format: &str, width: usize) {
        assert_eq!(MessageFormatter::new(format).prefix_width(), width);
    }

    #[test]
    fn test_log_line_keeps_client_color_after_inner_reset() {
        let text = format_log(&format!("use {} please", paint(BOLD, "//help")));
        assert_eq!(
            text,
            format!(
                "{}[CLIENT]{} use {BOLD}//help{RESET}{} please{RESET}",
                CLIENT_COL[0], CLIENT_COL[2], CLIENT_COL[2]
            )
        );
    }
}
