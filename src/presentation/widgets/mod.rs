mod input;
mod message_pane;
mod wrap;

pub use input::InputEditor;
pub use message_pane::{PaneUpdate, Scrollback};
pub use wrap::{CONTINUATION_INDENT, character_wrap, display_width};
