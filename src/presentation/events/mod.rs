//! Key mapping.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    /// Commit the input line.
    Submit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    /// Leave the client.
    Interrupt,
}

/// Maps a terminal key event to an action. Releases and unbound keys map to
/// `None`.
#[must_use]
pub fn map_key(key: KeyEvent) -> Option<KeyAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c' | 'd') => Some(KeyAction::Interrupt),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char(c) => KeyAction::Insert(c),
        KeyCode::Tab => KeyAction::Insert('\t'),
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Delete => KeyAction::Delete,
        KeyCode::Left => KeyAction::Left,
        KeyCode::Right => KeyAction::Right,
        KeyCode::Home => KeyAction::Home,
        KeyCode::End => KeyAction::End,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Up => KeyAction::ScrollUp,
        KeyCode::Down => KeyAction::ScrollDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        _ => return None,
    };
    Some(action)
}
