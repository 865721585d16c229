pub mod command_interpreter;
pub mod event_applier;
pub mod message_formatter;
pub mod style;

pub use command_interpreter::{Effect, interpret};
pub use event_applier::apply_event;
pub use message_formatter::{MessageFormatter, format_log};
