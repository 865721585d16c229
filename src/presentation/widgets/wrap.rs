//! ANSI aware character wrapping.

use std::iter::Peekable;
use std::str::Chars;

use unicode_width::UnicodeWidthChar;

use crate::application::services::style::{DARKEN, RESET};

/// Visible width of `[HH:MM:SS] `, the default continuation indent.
pub const CONTINUATION_INDENT: usize = 11;
const TAB_WIDTH: usize = 4;
const CONTINUATION_MARKER: char = '│';

/// Columns `text` occupies on screen. Escape sequences count as zero.
#[must_use]
pub fn display_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                take_escape(&mut chars);
            }
            '\t' => width += TAB_WIDTH,
            c => width += c.width().unwrap_or(0),
        }
    }
    width
}

/// Splits `text` into physical lines of at most `width` visible columns.
///
/// Escape sequences are never split. Continuation lines start with a dimmed
/// marker padded to `indent` columns and re-open whatever SGR styles were
/// active at the break. Every line ends with a reset. The indent is dropped
/// when it would take half the width or more.
#[must_use]
pub fn character_wrap(text: &str, width: usize, indent: usize) -> Vec<String> {
    let width = width.max(1);
    let indent = if width > indent * 2 { indent } else { 0 };

    let mut wrapper = Wrapper {
        width,
        indent,
        lines: Vec::new(),
        current: String::new(),
        used: 0,
        prefix: 0,
        active: Vec::new(),
    };

    let mut chars = text.trim_end_matches(['\n', '\r']).chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                let sequence = take_escape(&mut chars);
                wrapper.track(&sequence);
                wrapper.current.push_str(&sequence);
            }
            '\n' => wrapper.break_line(),
            '\r' => {}
            '\t' => {
                for _ in 0..TAB_WIDTH {
                    wrapper.push_visible(' ', 1);
                }
            }
            c => wrapper.push_visible(c, c.width().unwrap_or(0)),
        }
    }

    wrapper.finish()
}

/// Consumes the rest of an escape sequence whose `ESC` was already read.
fn take_escape(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut sequence = String::from('\x1b');
    match chars.next() {
        Some('[') => {
            sequence.push('[');
            for c in chars.by_ref() {
                sequence.push(c);
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
        Some(c) => sequence.push(c),
        None => {}
    }
    sequence
}

struct Wrapper {
    width: usize,
    indent: usize,
    lines: Vec<String>,
    current: String,
    used: usize,
    prefix: usize,
    active: Vec<String>,
}

impl Wrapper {
    fn track(&mut self, sequence: &str) {
        let Some(params) = sequence
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };

        if params.is_empty() || params == "0" {
            self.active.clear();
        } else {
            self.active.push(sequence.to_string());
        }
    }

    fn push_visible(&mut self, c: char, columns: usize) {
        if columns > 0 && self.used + columns > self.width && self.used > self.prefix {
            self.break_line();
        }
        self.current.push(c);
        self.used += columns;
    }

    fn break_line(&mut self) {
        let mut line = std::mem::take(&mut self.current);
        line.push_str(RESET);
        self.lines.push(line);

        if self.indent > 0 {
            self.current.push_str(DARKEN);
            self.current.push(CONTINUATION_MARKER);
            self.current.push_str(RESET);
            self.current.push_str(&" ".repeat(self.indent - 1));
        }
        for sequence in &self.active {
            self.current.push_str(sequence);
        }
        self.used = self.indent;
        self.prefix = self.indent;
    }

    fn finish(mut self) -> Vec<String> {
        self.current.push_str(RESET);
        self.lines.push(self.current);
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;
    use crate::application::services::style::{BOLD, PING};

    fn strip(line: &str) -> String {
        Regex::new(r"\x1b\[[0-9;]*m")
            .unwrap()
            .replace_all(line, "")
            .into_owned()
    }

    #[test]
    fn test_short_text_is_one_line() {
        assert_eq!(
            character_wrap("hello", 80, CONTINUATION_INDENT),
            vec![format!("hello{RESET}")]
        );
    }

    #[test]
    fn test_escape_sequences_have_no_width() {
        let text = format!("{BOLD}abc{RESET}");
        assert_eq!(display_width(&text), 3);
        assert_eq!(character_wrap(&text, 3, CONTINUATION_INDENT).len(), 1);
    }

    #[test]
    fn test_wrap_never_splits_escape_sequences() {
        let word = format!("{PING}@someone{RESET} ");
        let text = word.repeat(40);

        for width in [1, 7, 13, 25, 40, 80] {
            for line in character_wrap(&text, width, CONTINUATION_INDENT) {
                assert!(!strip(&line).contains('\x1b'), "split escape in {line:?}");
                assert!(display_width(&line) <= width.max(CONTINUATION_INDENT + 1));
            }
        }
    }

    #[test]
    fn test_continuation_lines_are_indented_and_restyled() {
        let text = format!("{BOLD}{}{RESET}", "x".repeat(50));
        let lines = character_wrap(&text, 30, CONTINUATION_INDENT);

        assert_eq!(lines.len(), 3);
        assert_eq!(display_width(&lines[0]), 30);
        assert!(lines[1].starts_with(&format!("{DARKEN}│{RESET}{}{BOLD}", " ".repeat(10))));
        assert_eq!(display_width(&lines[1]), 30);
        assert!(lines.iter().all(|line| line.ends_with(RESET)));
        assert_eq!(
            lines.iter().map(|l| strip(l).replace(['│', ' '], "")).collect::<String>(),
            "x".repeat(50)
        );
    }

    #[test]
    fn test_reset_ends_carried_style() {
        let text = format!("{BOLD}ab{RESET}{}", "c".repeat(40));
        let lines = character_wrap(&text, 30, CONTINUATION_INDENT);
        assert!(!lines[1].contains(BOLD));
    }

    #[test]
    fn test_newlines_and_tabs() {
        let lines = character_wrap("a\tb\nc\n", 80, CONTINUATION_INDENT);
        assert_eq!(lines.len(), 2);
        assert_eq!(strip(&lines[0]), "a    b");
        assert!(strip(&lines[1]).ends_with('c'));
    }

    #[test]
    fn test_wide_characters_count_double() {
        let lines = character_wrap("日本語です", 4, CONTINUATION_INDENT);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| display_width(line) <= 4));
    }

    #[test]
    fn test_indent_follows_prefix_width() {
        let text = "w".repeat(120);
        let lines = character_wrap(&text, 60, 22);

        assert!(lines[1].starts_with(&format!("{DARKEN}│{RESET}{}w", " ".repeat(21))));
        assert!(lines.iter().all(|line| display_width(line) <= 60));

        let narrow = character_wrap(&text, 40, 22);
        assert!(!narrow[1].contains('│'));
    }

    #[test]
    fn test_zero_width_is_treated_as_one_column() {
        assert_eq!(character_wrap("ab", 0, CONTINUATION_INDENT).len(), 2);
    }
}
