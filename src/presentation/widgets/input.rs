//! Single-row input editor.

use unicode_width::UnicodeWidthChar;

use super::wrap::display_width;
use crate::application::services::style::{CURSOR, INPUT_FIELD, RESET};

/// Fixed-width line editor with insert-and-shift semantics.
///
/// The buffer always fills exactly `width` display columns, padded with
/// spaces. Inserting pushes the rightmost characters out.
#[derive(Debug, Clone)]
pub struct InputEditor {
    buffer: Vec<char>,
    width: usize,
    cursor: usize,
}

fn columns(c: char) -> usize {
    c.width().unwrap_or(0)
}

impl InputEditor {
    #[must_use]
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            buffer: vec![' '; width],
            width,
            cursor: 0,
        }
    }

    /// Width in display columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Cursor position as a character index.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display column the cursor cell starts at.
    #[must_use]
    pub fn cursor_column(&self) -> usize {
        self.buffer[..self.cursor].iter().copied().map(columns).sum()
    }

    /// Current content with trailing padding removed.
    #[must_use]
    pub fn text(&self) -> String {
        let text: String = self.buffer.iter().collect();
        text.trim_end_matches(' ').to_string()
    }

    /// Drops characters off the right edge, then pads back to full width.
    fn fit(&mut self) {
        let mut used: usize = self.buffer.iter().copied().map(columns).sum();
        while used > self.width {
            if let Some(c) = self.buffer.pop() {
                used -= columns(c);
            }
        }
        self.buffer.resize(self.buffer.len() + (self.width - used), ' ');
        self.cursor = self.cursor.min(self.buffer.len() - 1);
    }

    /// Inserts a printable character. Control and zero-width characters, and
    /// characters wider than the editor, are ignored.
    pub fn insert(&mut self, c: char) {
        let c = if c == '\t' { ' ' } else { c };
        let cell = columns(c);
        if cell == 0 || cell > self.width {
            return;
        }
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
        self.fit();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.buffer.remove(self.cursor);
        self.fit();
    }

    pub fn delete(&mut self) {
        self.buffer.remove(self.cursor);
        self.fit();
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.len() - 1);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Moves to just past the last non-space character.
    pub fn move_end(&mut self) {
        let end = self
            .buffer
            .iter()
            .rposition(|c| *c != ' ')
            .map_or(0, |i| i + 1);
        self.cursor = end.min(self.buffer.len() - 1);
    }

    /// Takes the line out of the editor and clears it.
    pub fn commit(&mut self) -> String {
        let line = self.text();
        self.buffer = vec![' '; self.width];
        self.cursor = 0;
        line
    }

    /// Changes the width, keeping as much content as fits.
    pub fn resize(&mut self, width: usize) {
        self.width = width.max(1);
        self.fit();
    }

    /// The row as drawn on screen, cursor cell highlighted.
    #[must_use]
    pub fn render(&self) -> String {
        let before: String = self.buffer[..self.cursor].iter().collect();
        let after: String = self.buffer[self.cursor + 1..].iter().collect();
        format!(
            "{INPUT_FIELD}{before}{CURSOR}{}{RESET}{INPUT_FIELD}{after}{RESET}",
            self.buffer[self.cursor]
        )
    }

    /// Display width of the rendered row. Always equals `width`.
    #[must_use]
    pub fn rendered_width(&self) -> usize {
        display_width(&self.render())
    }
}
