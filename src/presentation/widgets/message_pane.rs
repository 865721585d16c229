//! Bounded scrollback of rendered entries.

use std::collections::VecDeque;

use super::wrap::{CONTINUATION_INDENT, character_wrap};

/// What the screen must do after a `push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneUpdate {
    /// Nothing visible changed.
    None,
    /// Scroll the viewport up by `scroll` rows, then draw `lines` starting at
    /// `start_row`.
    Append {
        start_row: usize,
        scroll: usize,
        lines: Vec<String>,
    },
    /// The visible window changed in a way that needs a full redraw.
    Repaint,
}

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    line_count: usize,
}

/// Keeps the last `capacity` entries and the physical lines they wrap into.
///
/// The view follows the newest line until the user scrolls up; while scrolled
/// up, new entries never move the view.
#[derive(Debug, Clone)]
pub struct Scrollback {
    entries: VecDeque<Entry>,
    lines: VecDeque<String>,
    line_offset: usize,
    capacity: usize,
    width: usize,
    height: usize,
    indent: usize,
}

impl Scrollback {
    #[must_use]
    pub fn new(capacity: usize, width: usize, height: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            lines: VecDeque::new(),
            line_offset: 0,
            capacity: capacity.max(1),
            width: width.max(1),
            height: height.max(1),
            indent: CONTINUATION_INDENT,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn line_offset(&self) -> usize {
        self.line_offset
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    /// True when the view shows the newest line.
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.line_offset >= self.max_offset()
    }

    /// Lines currently inside the viewport, top to bottom.
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        let end = (self.line_offset + self.height).min(self.lines.len());
        self.lines
            .range(self.line_offset..end)
            .map(String::as_str)
    }

    /// Adds one entry and reports how the screen should change.
    pub fn push(&mut self, text: impl Into<String>) -> PaneUpdate {
        let text = text.into();
        let following = self.is_following();
        let old_offset = self.line_offset;
        let filled = self.lines.len() - old_offset;

        let wrapped = character_wrap(&text, self.width, self.indent);
        let added = wrapped.len();
        self.lines.extend(wrapped.iter().cloned());
        self.entries.push_back(Entry {
            text,
            line_count: added,
        });
        let evicted = self.evict();

        if following {
            self.line_offset = self.max_offset();

            let scroll = (filled + added).saturating_sub(self.height);
            let lost_from_view = evicted.saturating_sub(old_offset);
            if added >= self.height || lost_from_view > scroll {
                return PaneUpdate::Repaint;
            }
            PaneUpdate::Append {
                start_row: filled - scroll,
                scroll,
                lines: wrapped,
            }
        } else if evicted > old_offset {
            self.line_offset = 0;
            PaneUpdate::Repaint
        } else {
            self.line_offset = old_offset - evicted;
            PaneUpdate::None
        }
    }

    /// Drops the oldest entries beyond capacity. Returns how many lines went.
    fn evict(&mut self) -> usize {
        let mut removed = 0;
        while self.entries.len() > self.capacity {
            if let Some(entry) = self.entries.pop_front() {
                self.lines.drain(..entry.line_count);
                removed += entry.line_count;
            }
        }
        removed
    }

    /// Moves the view by `delta` lines, negative going back in time.
    /// Returns whether the view moved.
    pub fn scroll(&mut self, delta: isize) -> bool {
        let current = self.line_offset;
        let target = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta.unsigned_abs())
        };
        self.line_offset = target.min(self.max_offset());
        self.line_offset != current
    }

    #[must_use]
    pub const fn indent(&self) -> usize {
        self.indent
    }

    /// Sets how far continuation lines are indented and re-wraps if it changed.
    pub fn set_indent(&mut self, indent: usize) {
        if indent != self.indent {
            let following = self.is_following();
            self.indent = indent;
            self.rewrap();
            self.settle(following);
        }
    }

    /// Re-wraps every entry for a new viewport size.
    pub fn resize(&mut self, width: usize, height: usize) {
        let following = self.is_following();
        let width = width.max(1);
        self.height = height.max(1);

        if width != self.width {
            self.width = width;
            self.rewrap();
        }
        self.settle(following);
    }

    fn rewrap(&mut self) {
        self.lines.clear();
        for entry in &mut self.entries {
            let wrapped = character_wrap(&entry.text, self.width, self.indent);
            entry.line_count = wrapped.len();
            self.lines.extend(wrapped);
        }
    }

    fn settle(&mut self, following: bool) {
        self.line_offset = if following {
            self.max_offset()
        } else {
            self.line_offset.min(self.max_offset())
        };
    }
}
