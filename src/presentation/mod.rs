//! Presentation layer: terminal rendering, key mapping and the app loop.

/// Key mapping.
pub mod events;
/// Screen, app loop and backend worker.
pub mod ui;
/// Scrollback, wrapping and input editing.
pub mod widgets;

pub use ui::{App, Backend, BackendAction, BackendCommand, Screen};
