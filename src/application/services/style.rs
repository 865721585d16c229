//! SGR sequences shared by the formatter and the terminal renderer.

use std::borrow::Cow;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const ITALICS: &str = "\x1b[3m";
pub const UNDERLINE: &str = "\x1b[4m";
pub const STRIKETHROUGH: &str = "\x1b[9m";

pub const DARKEN: &str = "\x1b[90m";
pub const CODE_BLOCK: &str = "\x1b[48;5;234m";

pub const PING: &str = "\x1b[36m";
pub const PING_ME: &str = "\x1b[96m";
/// `@everyone` in a message that did not actually ping.
pub const PING_MUTED: &str = "\x1b[2;36m";

pub const CURSOR: &str = "\x1b[42m";
pub const INPUT_FIELD: &str = "\x1b[48;5;236m";

/// Purple gradient used for client notices, darkest first.
pub const CLIENT_COL: [&str; 4] = [
    "\x1b[38;5;93m",
    "\x1b[38;5;135m",
    "\x1b[38;5;177m",
    "\x1b[38;5;219m",
];

/// Replaces control characters other than tab and newline with U+FFFD, so
/// remote text cannot emit its own escape sequences.
#[must_use]
pub fn sanitize(text: &str) -> Cow<'_, str> {
    let is_unsafe = |c: char| c.is_control() && c != '\t' && c != '\n';
    if text.contains(is_unsafe) {
        Cow::Owned(
            text.chars()
                .map(|c| if is_unsafe(c) { char::REPLACEMENT_CHARACTER } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    }
}

/// Wraps `text` in `style`, closing with a full reset.
#[must_use]
pub fn paint(style: &str, text: &str) -> String {
    format!("{style}{text}{RESET}")
}

/// Re-applies `style` after every reset inside `text`, so nested styling
/// does not end the outer style early.
#[must_use]
pub fn keep_style(text: &str, style: &str) -> String {
    text.replace(RESET, &format!("{RESET}{style}"))
}
